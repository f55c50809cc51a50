//! canopy - RAG over conservation knowledge bases
//!
//! This crate provides:
//! - Document ingestion (text + PDF) into per-source Qdrant collections
//! - Embedding-based retrieval with LLM answer composition
//! - Conversation sessions scoped per website context
//! - A grant-pitch workflow that matches queries against a project catalog
//!   before falling back to LLM-generated proposals

pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod progress;
pub mod rag;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use models::Confirmation;
