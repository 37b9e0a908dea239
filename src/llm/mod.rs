pub mod backend;
pub mod fence;
pub mod prompt;

pub use backend::{generate_fragments, Batch, Fragments, GenerationRequest, TestGenerator};
pub use fence::{extract_code_blocks, unwrap_reply};
pub use prompt::{build_prompt, LlmPrompt};
