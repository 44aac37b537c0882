//! Step interpreter adapter.

mod openai;

pub use openai::{OpenAiInterpreter, OpenAiInterpreterConfig};
