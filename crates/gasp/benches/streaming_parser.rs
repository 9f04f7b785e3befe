//! Benchmark – `gasp::Parser`
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gasp::{Parser, TypeDescriptor};

/// Produce a deterministic document whose textual representation is at least
/// `target_len` bytes: a record with one large list of string items.
fn make_payload(target_len: usize) -> String {
    let mut s = String::with_capacity(target_len + 64);
    s.push_str("<Report><title>benchmark</title><entries>");
    let mut i = 0usize;
    while s.len() < target_len {
        s.push_str("<item>entry number ");
        s.push_str(&i.to_string());
        s.push_str("</item>");
        i += 1;
    }
    s.push_str("</entries></Report>");
    s
}

fn report_type() -> TypeDescriptor {
    TypeDescriptor::class_of(
        "Report",
        vec![
            ("title".to_string(), TypeDescriptor::string()),
            (
                "entries".to_string(),
                TypeDescriptor::list(TypeDescriptor::string()),
            ),
        ],
    )
    .unwrap()
}

/// Feed the parser `parts` chunks that together form the full payload and
/// return the final entry count, so Criterion can black-box the work.
fn run_parser(payload: &str, parts: usize) -> usize {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts);

    let mut parser = Parser::new(report_type());
    let mut start = 0;
    while start < payload.len() {
        let mut end = usize::min(start + chunk_size, payload.len());
        while end < payload.len() && !payload.is_char_boundary(end) {
            end += 1;
        }
        let _ = parser.feed(&payload[start..end]).unwrap();
        start = end;
    }
    parser
        .get_partial()
        .and_then(|v| v.lookup_field("entries").map(|e| e.as_items().map_or(0, <[_]>::len)))
        .unwrap_or(0)
}

fn bench_streaming(c: &mut Criterion) {
    let payload = make_payload(64 * 1024);

    let mut group = c.benchmark_group("streaming_parser");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(criterion::Throughput::Bytes(payload.len() as u64));

    for parts in [1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::new("chunks", parts), &parts, |b, &parts| {
            b.iter(|| black_box(run_parser(&payload, parts)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_streaming);
criterion_main!(benches);
