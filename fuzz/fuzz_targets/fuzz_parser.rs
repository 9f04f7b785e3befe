#![no_main]
use gasp::{Parser, ParserOptions, TypeDescriptor};
use libfuzzer_sys::fuzz_target;

const HEADER: usize = 5; // 1 flag byte + 4-byte split seed

fn root_type(flags: u8) -> TypeDescriptor {
    match flags & 3 {
        0 => TypeDescriptor::class_of(
            "Person",
            vec![
                ("name".to_string(), TypeDescriptor::string()),
                ("age".to_string(), TypeDescriptor::int()),
                (
                    "hobbies".to_string(),
                    TypeDescriptor::list(TypeDescriptor::string()),
                ),
            ],
        )
        .unwrap(),
        1 => TypeDescriptor::dict(TypeDescriptor::string(), TypeDescriptor::string()),
        2 => TypeDescriptor::variadic_tuple(TypeDescriptor::int()),
        _ => {
            let a = TypeDescriptor::class_of(
                "A",
                vec![("x".to_string(), TypeDescriptor::float())],
            )
            .unwrap();
            let b = TypeDescriptor::class_of(
                "B",
                vec![("y".to_string(), TypeDescriptor::boolean())],
            )
            .unwrap();
            TypeDescriptor::union_alias("Choice", vec![a, b]).unwrap()
        }
    }
}

fn parse(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }
    let flags = data[0];
    let split_seed = u32::from_le_bytes(data[1..5].try_into().unwrap()) as u64;
    let data = &data[5..];
    if data.is_empty() {
        return;
    }

    let text = String::from_utf8_lossy(data).into_owned();

    // A tiny budget keeps the fuzzer exploring the fatal path too.
    let options = ParserOptions {
        max_text_len: if flags & 4 != 0 { 512 } else { 64 * 1024 },
        ..ParserOptions::default()
    };

    let mut parser = Parser::with_options(root_type(flags), options);
    for chunk in split_into_safe_chunks(&text, split_seed) {
        if parser.feed(chunk).is_err() {
            // Fatal must latch: a later feed returns an error as well.
            assert!(parser.feed("x").is_err());
            return;
        }
    }
    let _ = parser.get_partial();
    let _ = parser.validate();
    let _ = parser.is_complete();
}

fuzz_target!(|data: &[u8]| parse(data));

/// Split a UTF-8 `&str` into boundary-safe chunks using a deterministic
/// value to generate splits.
fn split_into_safe_chunks(serialized: &str, split_seed: u64) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let len = serialized.len();

    while start < len {
        let remaining = len - start;
        let mut size = (split_seed as usize % remaining) + 1;
        while start + size < len && !serialized.is_char_boundary(start + size) {
            size += 1;
        }
        chunks.push(&serialized[start..start + size]);
        start += size;
    }

    chunks
}
