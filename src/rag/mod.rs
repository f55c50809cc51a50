//! Retrieval-augmented generation
//!
//! The query side of the system: embedding-based retrieval over named
//! collections, prompt assembly, project matching for grant pitches, and
//! answer composition against the LLM backend.

mod chain;
mod pitch;
mod prompts;
mod retriever;

pub use chain::*;
pub use pitch::*;
pub use prompts::*;
pub use retriever::*;
