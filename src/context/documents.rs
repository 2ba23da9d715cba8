//! Reference document ingestion
//!
//! Reads `.pdf`, `.txt` and `.md` files from a directory tree (PDF through
//! the default `pdf` feature). Documents are returned sorted by source id,
//! the path relative to the root with `/` separators, so an index built from
//! the same directory is always built in the same order.

use std::path::Path;
use tracing::{debug, warn};

use crate::error::{LcaError, Result};

/// A source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Relative path, `/`-separated
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

fn is_supported(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("txt" | "md") => true,
        Some("pdf") => cfg!(feature = "pdf"),
        _ => false,
    }
}

#[cfg(feature = "pdf")]
fn read_pdf(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path)
        .map_err(|e| LcaError::Retrieval(format!("{}: {e}", path.display())))
}

fn read_document(path: &Path) -> Result<String> {
    #[cfg(feature = "pdf")]
    {
        if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        {
            return read_pdf(path);
        }
    }
    std::fs::read_to_string(path)
        .map_err(|e| LcaError::Retrieval(format!("{}: {e}", path.display())))
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<Document>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| LcaError::Retrieval(format!("{}: {e}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|e| LcaError::Retrieval(format!("{}: {e}", dir.display())))?;
        let path = entry.path();
        if path.is_dir() {
            collect(root, &path, out)?;
            continue;
        }
        if !is_supported(&path) {
            debug!(path = %path.display(), "Skipping unsupported document");
            continue;
        }
        let text = read_document(&path)?;
        if text.trim().is_empty() {
            warn!(path = %path.display(), "Skipping empty document");
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let source = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        out.push(Document { source, text });
    }
    Ok(())
}

/// Load every supported document under `dir`, sorted by source id
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(LcaError::Retrieval(format!(
            "document directory {} does not exist",
            dir.display()
        )));
    }
    let mut docs = Vec::new();
    collect(dir, dir, &mut docs)?;
    docs.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_text_and_markdown_sorted() {
        let dir = tempfile::tempdir().expect("tmpdir");
        std::fs::create_dir(dir.path().join("reports")).unwrap();
        std::fs::write(dir.path().join("b.md"), "# Copper\nRecovery is high.").unwrap();
        std::fs::write(dir.path().join("reports/a.txt"), "Aluminium scrap.").unwrap();
        std::fs::write(dir.path().join("notes.csv"), "x,y").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "   ").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        let sources: Vec<&str> = docs.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["b.md", "reports/a.txt"]);
    }

    #[test]
    fn test_missing_directory_is_retrieval_error() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let err = load_documents(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, LcaError::Retrieval(_)));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_pdf_is_ingested_and_unreadable_pdf_fails() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("lca_report.PDF");
        std::fs::write(&path, b"not a pdf document").unwrap();

        assert!(is_supported(&path));
        let err = load_documents(dir.path()).unwrap_err();
        assert!(matches!(err, LcaError::Retrieval(ref msg) if msg.contains("lca_report.PDF")));
    }
}
