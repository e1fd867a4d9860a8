// src/transfer/mod.rs
// The two mutually exclusive transfer loops

mod consumer;
mod publisher;

pub use consumer::dump_messages;
pub use publisher::{publish_lines, MAX_LINE_LEN};
