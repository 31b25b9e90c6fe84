use crate::answer::{answer_query, NOT_FOUND_ANSWER};
use crate::cache::EmbeddingCache;
use crate::error::QaError;
use crate::extractor::PdfExtractor;
use crate::ingest::ingest_documents;
use crate::logging::log_step;
use crate::models::{QaResponse, ResponseMeta};
use crate::settings::Settings;
use crate::traits::{EmbeddingProvider, GenerationProvider};
use std::path::PathBuf;
use std::time::Instant;

/// Sequences ingestion, retrieval, and generation for one question.
///
/// Synchronous and single-threaded throughout; the embedding cache is
/// passed in explicitly so callers own its lifetime and persistence.
pub struct QaPipeline<X, E, G>
where
    X: PdfExtractor,
    E: EmbeddingProvider,
    G: GenerationProvider,
{
    extractor: X,
    embedder: E,
    generator: G,
    settings: Settings,
}

impl<X, E, G> QaPipeline<X, E, G>
where
    X: PdfExtractor,
    E: EmbeddingProvider,
    G: GenerationProvider,
{
    pub fn new(extractor: X, embedder: E, generator: G, settings: Settings) -> Self {
        Self {
            extractor,
            embedder,
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn run(
        &self,
        cache: &mut EmbeddingCache,
        pdf_paths: &[PathBuf],
        query: &str,
        top_k: Option<usize>,
    ) -> Result<QaResponse, QaError> {
        let start = Instant::now();
        let mut logs = Vec::new();
        log_step(
            &mut logs,
            format!("Start pipeline with {} PDFs; query=\"{query}\"", pdf_paths.len()),
        );

        let mut chunks = ingest_documents(
            pdf_paths,
            &self.extractor,
            &self.settings.ingestion_options(),
            &mut logs,
        );

        let chosen_k = top_k.unwrap_or(self.settings.top_k);
        let (answer, citations) = answer_query(
            query,
            &mut chunks,
            cache,
            &self.embedder,
            &self.generator,
            chosen_k,
            &mut logs,
        )?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let confidence = (citations.len() as f32 / chosen_k.max(1) as f32).min(1.0);

        let answer = if answer.trim().is_empty() {
            NOT_FOUND_ANSWER.to_string()
        } else {
            answer
        };

        Ok(QaResponse {
            query: query.to_string(),
            answer,
            citations,
            meta: ResponseMeta {
                used_model: self.generator.model().to_string(),
                num_docs: pdf_paths.len(),
                retrieval_k: chosen_k,
                latency_ms,
                confidence,
            },
            logs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::QaPipeline;
    use crate::answer::NOT_FOUND_ANSWER;
    use crate::cache::EmbeddingCache;
    use crate::embeddings::{CharacterNgramEmbedder, StubGenerator};
    use crate::error::IngestError;
    use crate::extractor::{PageText, PdfExtractor};
    use crate::settings::Settings;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    struct FakeExtractor {
        pages: Vec<PageText>,
    }

    impl PdfExtractor for FakeExtractor {
        fn extract_pages(&self, _path: &Path) -> Result<Vec<PageText>, IngestError> {
            Ok(self.pages.clone())
        }
    }

    fn pipeline(pages: Vec<PageText>) -> QaPipeline<FakeExtractor, CharacterNgramEmbedder, StubGenerator> {
        QaPipeline::new(
            FakeExtractor { pages },
            CharacterNgramEmbedder::default(),
            StubGenerator::default(),
            Settings::default(),
        )
    }

    fn cache(dir: &tempfile::TempDir) -> EmbeddingCache {
        EmbeddingCache::load(dir.path().join("embeddings.json"))
    }

    #[test]
    fn zero_documents_yields_exact_fallback_and_no_citations() {
        let dir = tempdir().expect("tempdir");
        let mut cache = cache(&dir);
        let pipeline = pipeline(Vec::new());

        let response = pipeline
            .run(&mut cache, &[], "What is the main topic?", None)
            .unwrap();

        assert_eq!(response.answer, NOT_FOUND_ANSWER);
        assert!(response.citations.is_empty());
        assert_eq!(response.meta.num_docs, 0);
        assert_eq!(response.meta.confidence, 0.0);
        assert!(!response.logs.is_empty());
    }

    #[test]
    fn uncited_stub_answer_gets_citation_for_the_single_page() {
        let dir = tempdir().expect("tempdir");
        let mut cache = cache(&dir);
        let pipeline = pipeline(vec![PageText {
            number: 1,
            text: "The committee approved the budget in March.".to_string(),
        }]);

        let paths = vec![PathBuf::from("data/minutes+2024.pdf")];
        let response = pipeline
            .run(&mut cache, &paths, "When was the budget approved?", None)
            .unwrap();

        // The stub reply has no "(... p." shape, so the composer appends
        // the top passage's source.
        assert!(response.answer.ends_with("(minutes 2024.pdf p.1)"));
        assert_eq!(response.citations.len(), 1);
        assert_eq!(response.citations[0].filename, "minutes 2024.pdf");
        assert_eq!(response.citations[0].page, 1);
    }

    #[test]
    fn empty_page_logs_diagnostic_but_run_succeeds() {
        let dir = tempdir().expect("tempdir");
        let mut cache = cache(&dir);
        let pipeline = pipeline(vec![
            PageText {
                number: 1,
                text: String::new(),
            },
            PageText {
                number: 2,
                text: "Readable content on the second page.".to_string(),
            },
        ]);

        let paths = vec![PathBuf::from("data/partial.pdf")];
        let response = pipeline
            .run(&mut cache, &paths, "What is on the second page?", None)
            .unwrap();

        assert!(response
            .logs
            .iter()
            .any(|line| line.contains("No extractable text on page 1")));
        assert!(!response.citations.is_empty());
        assert!(response.citations.iter().all(|c| c.page == 2));
    }

    #[test]
    fn top_k_override_bounds_citations_and_confidence() {
        let dir = tempdir().expect("tempdir");
        let mut cache = cache(&dir);
        let pipeline = pipeline(vec![PageText {
            number: 1,
            text: "Short page.".to_string(),
        }]);

        let paths = vec![PathBuf::from("data/a.pdf")];
        let response = pipeline
            .run(&mut cache, &paths, "short question", Some(5))
            .unwrap();

        assert_eq!(response.meta.retrieval_k, 5);
        assert!(response.citations.len() <= 5);
        // one citation out of five requested
        assert!((response.meta.confidence - 0.2).abs() < 1e-6);
    }

    #[test]
    fn second_run_is_served_from_the_cache() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("embeddings.json");
        let pipeline = pipeline(vec![PageText {
            number: 1,
            text: "Cached passage content.".to_string(),
        }]);
        let paths = vec![PathBuf::from("data/a.pdf")];

        let mut first_cache = EmbeddingCache::load(&path);
        pipeline
            .run(&mut first_cache, &paths, "cached question", None)
            .unwrap();
        let entries_after_first = first_cache.len();
        assert!(entries_after_first >= 2); // passage + query

        let mut second_cache = EmbeddingCache::load(&path);
        assert_eq!(second_cache.len(), entries_after_first);
        let response = pipeline
            .run(&mut second_cache, &paths, "cached question", None)
            .unwrap();
        assert_eq!(second_cache.len(), entries_after_first);
        assert!(!response.answer.is_empty());
    }
}
