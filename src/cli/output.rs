//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `teachrag` CLI

use crate::rag::IngestReport;
use crate::rag::RagResponse;
use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// Returns the string with a "..." suffix if it was truncated.
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Print the result of an ingestion run
pub fn print_ingest_report(report: &IngestReport) {
    println!("📚 Index: {}", report.index_name);
    println!("  Pages loaded: {}", report.documents);
    println!("  Chunks: {}", report.chunks);
    println!("  Vectors written: {}", report.vectors);
}

/// Print an answer, optionally followed by the context it was built from
pub fn print_rag_response(response: &RagResponse, show_context: bool) {
    println!("\n{}", "═".repeat(80));
    println!("📝 Answer:\n");
    println!("{}", response.answer.trim());
    println!("\n{}", "═".repeat(80));

    if show_context {
        println!("\n📖 Context ({} chunks):", response.context.len());
        for (idx, chunk) in response.context.iter().enumerate() {
            let page = chunk
                .page
                .map_or_else(|| "?".to_string(), |p| p.to_string());
            println!(
                "  {}. {} p.{} (score {:.3})",
                idx + 1,
                chunk.source,
                page,
                chunk.score
            );
            println!("     {}", truncate_str(&chunk.text.replace('\n', " "), 160));
        }
    }
}

const NOT_SET: &str = "(not set)";

pub fn print_config(config: &AppConfig) {
    let config = config.redacted();

    println!("📋 teachrag Configuration:");
    println!();

    println!("🌐 Server:");
    println!("  Address: {}", config.bind_address());
    println!("  Mode: {:?}", config.server.mode);
    println!("  CORS: {}", config.server.cors);
    println!("  Request timeout: {}s", config.server.request_timeout_secs);
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("🧠 Embeddings:");
    println!("  Provider: {}", config.embeddings.provider);
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  API key: {}", config.embeddings.api_key.as_deref().unwrap_or(NOT_SET));
    println!();

    println!("💬 LLM:");
    println!("  Provider: {}", config.llm.provider);
    println!("  Model: {}", config.llm_model());
    println!("  Temperature: {}", config.llm.temperature);
    println!("  API key: {}", config.llm.api_key.as_deref().unwrap_or(NOT_SET));
    println!();

    println!("🌲 Pinecone:");
    println!("  Control endpoint: {}", config.pinecone.control_endpoint);
    println!(
        "  Serverless: {} / {} ({})",
        config.pinecone.cloud, config.pinecone.region, config.pinecone.metric
    );
    println!("  API key: {}", config.pinecone.api_key.as_deref().unwrap_or(NOT_SET));
    println!();

    println!("✂️  Chunking / retrieval:");
    println!(
        "  Chunk size: {}, overlap: {}",
        config.chunking.chunk_size, config.chunking.chunk_overlap
    );
    println!("  Top k: {}", config.retrieval.top_k);
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
