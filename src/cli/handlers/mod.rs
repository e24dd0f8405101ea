//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - rag: Document ingestion and questions
//! - serve: API server
//! - info: Information display (config, index names)

pub mod info;
pub mod rag;
pub mod serve;

// Re-export all public handlers
pub use info::*;
pub use rag::*;
pub use serve::*;
