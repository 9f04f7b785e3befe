//! Demonstrates reacting to a typed LLM response **while it streams**.
//!
//! The assistant was prompted to answer inside a `<Reply>` region (the prompt
//! block came from [`gasp::format_instructions`]), but like any LLM it also
//! thinks out loud around the payload. The example feeds the response to the
//! parser in small, irregular chunks to mirror how completion APIs deliver
//! partial tokens, and prints each partial as it refines.
//!
//! Run with
//!
//! ```bash
//! cargo run -p gasp --example llm_stream
//! ```

use gasp::{Parser, TypeDescriptor};

fn main() {
    let reply = TypeDescriptor::class_of(
        "Reply",
        vec![
            ("answer".to_string(), TypeDescriptor::string()),
            ("confidence".to_string(), TypeDescriptor::float()),
            (
                "sources".to_string(),
                TypeDescriptor::list(TypeDescriptor::string()),
            ),
        ],
    )
    .expect("valid class name");

    // A toy assistant response streamed in tiny chunks. In real life this
    // would come from the network.
    let simulated_stream: [&str; 8] = [
        "<think>The user wants the capital ",
        "of France, easy.</think>Here you go: <Re",
        "ply><answer>Par",
        "is</answer><confidence>0.",
        "98</confidence><sources><item>enc",
        "yclopedia</item><item>atlas</item>",
        "</sources></Reply>",
        " Anything else?",
    ];

    let mut parser = Parser::new(reply);
    for (i, chunk) in simulated_stream.iter().enumerate() {
        let partial = parser.feed(chunk).expect("within budget");
        match partial {
            Some(value) => println!("after chunk {i}: {value}"),
            None => println!("after chunk {i}: (no region yet)"),
        }
    }

    assert!(parser.is_complete());
    let final_value = parser.validate().expect("all required fields present");
    println!("final: {final_value}");
}
