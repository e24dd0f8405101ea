//! Ingestion and question-answering handlers

use std::path::PathBuf;

use crate::cli::commands::IngestSource;
use crate::cli::output::*;
use crate::documents::DirectoryLoader;
use crate::documents::OnlinePdfLoader;
use crate::rag::RagService;
use crate::AppConfig;
use crate::Result;
use crate::TeachRagError;

pub async fn handle_ingest_command(
    config: &AppConfig,
    user_id: &str,
    source: IngestSource,
) -> Result<()> {
    let service = RagService::new(config)?;

    let documents = match (source.dir, source.url) {
        (Some(dir), _) => {
            print_info(&format!("📂 Loading PDFs from {}", dir.display()));
            load_directory(dir).await?
        }
        (None, Some(url)) => {
            print_info(&format!("🌐 Downloading {url}"));
            let client = reqwest::Client::builder()
                .timeout(config.request_timeout())
                .build()?;
            OnlinePdfLoader::new(&url, client)?.load().await?
        }
        (None, None) => {
            return Err(TeachRagError::InvalidInput(
                "either --dir or --url is required".to_string(),
            ))
        }
    };

    if documents.is_empty() {
        print_warning("No pages were loaded; the index will be created empty");
    }

    let report = service.ingest(user_id, &documents).await?;
    print_ingest_report(&report);
    print_success("RAG instance has been created successfully");
    Ok(())
}

pub async fn handle_ask_command(
    config: &AppConfig,
    user_id: &str,
    question: &str,
    show_context: bool,
) -> Result<()> {
    let service = RagService::new(config)?;
    print_info(&format!("🤖 Asking: \"{question}\""));

    let response = service.answer(user_id, question).await?;
    if response.context.is_empty() {
        print_warning("No relevant chunks found; answering without context");
    }
    print_rag_response(&response, show_context);
    Ok(())
}

async fn load_directory(dir: PathBuf) -> Result<Vec<crate::documents::Document>> {
    if !dir.is_dir() {
        return Err(TeachRagError::InvalidInput(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }
    DirectoryLoader::new(dir).load().await
}
