//! PDF loaders: a local directory of PDFs, or a single PDF fetched by URL

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use reqwest::Client;
use tracing::debug;
use tracing::info;
use tracing::warn;
use url::Url;

use super::Document;
use crate::errors::Result;
use crate::errors::TeachRagError;

/// Loads every `*.pdf` file directly inside a directory (non-recursive)
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// PDF files in the directory, sorted by file name
    pub fn pdf_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_pdf(path))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Load all PDFs as one document per page
    ///
    /// # Errors
    /// - Directory cannot be read
    /// - Any PDF fails to parse
    pub async fn load(&self) -> Result<Vec<Document>> {
        let paths = self.pdf_paths()?;
        if paths.is_empty() {
            warn!("No PDF files found in {}", self.dir.display());
        }

        let mut documents = Vec::new();
        for path in paths {
            let source = path.display().to_string();
            let pages = extract_pages(path).await?;
            debug!("Loaded {} pages from {}", pages.len(), source);
            documents.extend(into_documents(pages, &source));
        }

        info!(
            "Loaded {} pages from {}",
            documents.len(),
            self.dir.display()
        );
        Ok(documents)
    }
}

/// Downloads a PDF over HTTP(S) and loads it
pub struct OnlinePdfLoader {
    url: Url,
    client: Client,
}

impl OnlinePdfLoader {
    /// Create a loader for `url`
    ///
    /// # Errors
    /// - URL does not parse or is not http/https
    pub fn new(url: &str, client: Client) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| TeachRagError::InvalidInput(format!("Invalid PDF URL '{url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TeachRagError::InvalidInput(format!(
                "Unsupported URL scheme '{}'",
                url.scheme()
            )));
        }
        Ok(Self { url, client })
    }

    /// Fetch and parse the PDF as one document per page
    ///
    /// # Errors
    /// - Download fails or returns a non-success status
    /// - PDF fails to parse
    pub async fn load(&self) -> Result<Vec<Document>> {
        debug!("Downloading PDF from {}", self.url);
        let response = self.client.get(self.url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(TeachRagError::Document(format!(
                "Download of {} failed with status {}",
                self.url,
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;

        let path = file.into_temp_path();
        let pages = extract_pages(path.to_path_buf()).await?;
        let source = self.url.to_string();
        info!("Loaded {} pages from {}", pages.len(), source);

        Ok(into_documents(pages, &source))
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn into_documents(pages: Vec<String>, source: &str) -> Vec<Document> {
    pages
        .into_iter()
        .enumerate()
        .map(|(page, text)| Document::new(text, source, page))
        .collect()
}

/// Extract per-page text on the blocking pool
async fn extract_pages(path: PathBuf) -> Result<Vec<String>> {
    tokio::task::spawn_blocking(move || extract_pages_blocking(&path))
        .await
        .map_err(|e| TeachRagError::Document(format!("PDF extraction task failed: {e}")))?
}

fn extract_pages_blocking(path: &Path) -> Result<Vec<String>> {
    // pdf-extract can panic on malformed input
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_by_pages(path)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(TeachRagError::Document(format!(
            "Cannot read '{}': {e}",
            path.display()
        ))),
        Err(_) => Err(TeachRagError::Document(format!(
            "PDF parser panicked on '{}'",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("notes.pdf")));
        assert!(is_pdf(Path::new("NOTES.PDF")));
        assert!(!is_pdf(Path::new("notes.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_pdf_paths_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("readme.md"), b"# notes").unwrap();
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let paths = DirectoryLoader::new(dir.path()).pdf_paths().unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_empty_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let documents = DirectoryLoader::new(dir.path()).load().await.unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let result = DirectoryLoader::new("/nonexistent/teachrag/lessons").load().await;
        assert!(matches!(result, Err(TeachRagError::Io(_))));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_document_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"this is not a pdf").unwrap();

        let result = DirectoryLoader::new(dir.path()).load().await;
        assert!(matches!(result, Err(TeachRagError::Document(_))));
    }

    const LESSON_PDF: &[u8] = include_bytes!("../../tests/fixtures/lesson.pdf");

    fn words(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[tokio::test]
    async fn test_directory_loads_pdf_pages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lesson.pdf"), LESSON_PDF).unwrap();

        let documents = DirectoryLoader::new(dir.path()).load().await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].page, 0);
        assert!(documents[0].source.ends_with("lesson.pdf"));
        let text = words(&documents[0].text);
        assert!(text.contains("Photosynthesis"), "got {text:?}");
        assert!(text.contains("chloroplasts"), "got {text:?}");
    }

    #[test]
    fn test_online_loader_rejects_bad_urls() {
        assert!(OnlinePdfLoader::new("not a url", Client::new()).is_err());
        assert!(OnlinePdfLoader::new("ftp://example.com/a.pdf", Client::new()).is_err());
        assert!(OnlinePdfLoader::new("https://example.com/a.pdf", Client::new()).is_ok());
    }

    #[test]
    fn test_into_documents_numbers_pages() {
        let docs = into_documents(vec!["one".into(), "two".into()], "file.pdf");
        assert_eq!(docs[1], Document::new("two", "file.pdf", 1));
    }
}
