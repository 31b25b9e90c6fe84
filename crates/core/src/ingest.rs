use crate::chunking::{chunk_page, ChunkingConfig};
use crate::extractor::PdfExtractor;
use crate::logging::log_step;
use crate::models::{Chunk, IngestionOptions};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Display name for citations: basename with `+` separators restored to
/// spaces (common in downloaded paper filenames).
pub fn short_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
        .replace('+', " ")
}

/// Best-effort ingestion of every document, in input order.
///
/// An unreadable document is logged and skipped; a page without extractable
/// text is logged and contributes zero passages; a document that reaches
/// `max_chunks_per_doc` stops early with a truncation diagnostic. Never
/// fails the run.
pub fn ingest_documents<X: PdfExtractor>(
    paths: &[PathBuf],
    extractor: &X,
    options: &IngestionOptions,
    logs: &mut Vec<String>,
) -> Vec<Chunk> {
    let config = ChunkingConfig::from(options);
    let mut all_chunks: Vec<Chunk> = Vec::new();

    for (index, path) in paths.iter().enumerate() {
        let doc_id = format!("doc{}", index + 1);
        let filename = path.to_string_lossy().to_string();

        let pages = match extractor.extract_pages(path) {
            Ok(pages) => pages,
            Err(error) => {
                log_step(logs, format!("Failed to read {filename}: {error}"));
                continue;
            }
        };

        log_step(
            logs,
            format!("Loaded PDF {filename} with {} pages", pages.len()),
        );

        let mut doc_chunk_count = 0usize;
        for page in pages {
            if page.text.trim().is_empty() {
                log_step(
                    logs,
                    format!(
                        "No extractable text on page {} of {filename} (possible scanned PDF)",
                        page.number
                    ),
                );
                continue;
            }

            let new_chunks = chunk_page(&page.text, &doc_id, &filename, page.number, config);
            doc_chunk_count += new_chunks.len();
            all_chunks.extend(new_chunks);

            if doc_chunk_count >= options.max_chunks_per_doc {
                log_step(logs, format!("Max chunks reached for {filename}; truncating"));
                break;
            }
        }
    }

    log_step(
        logs,
        format!("Chunked into {} passages total", all_chunks.len()),
    );
    all_chunks
}
