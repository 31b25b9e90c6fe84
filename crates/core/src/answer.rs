use crate::cache::EmbeddingCache;
use crate::error::QaError;
use crate::ingest::short_name;
use crate::logging::log_step;
use crate::models::{Chunk, Citation};
use crate::retrieval::{index_embeddings, search};
use crate::traits::{EmbeddingProvider, GenerationProvider};

/// Exact fallback phrase the generator is instructed to emit when the
/// context cannot answer the question. Also the in-band answer when
/// retrieval yields nothing; that case is a successful response.
pub const NOT_FOUND_ANSWER: &str = "Not found in provided documents.";

const EXCERPT_CHARS: usize = 240;

/// Grounded prompt: every retrieved passage labeled with its source, the
/// question, and a fixed instruction block.
pub fn build_prompt(query: &str, ranked: &[(Chunk, f32)]) -> String {
    let context = ranked
        .iter()
        .map(|(chunk, _score)| {
            format!("[{} p.{}] {}", short_name(&chunk.filename), chunk.page, chunk.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a careful assistant. Answer using ONLY the provided context.\n\
         If information conflicts across documents, note the differences and cite both.\n\n\
         Context:\n{context}\n\n\
         Question: {query}\n\n\
         Instructions:\n\
         - Provide a concise answer (3-6 sentences).\n\
         - Include inline citations like (filename p.X) where appropriate.\n\
         - If not found in context, say '{NOT_FOUND_ANSWER}' and stop.\n"
    )
}

fn citations_from(ranked: &[(Chunk, f32)]) -> Vec<Citation> {
    ranked
        .iter()
        .map(|(chunk, _score)| Citation {
            doc_id: chunk.doc_id.clone(),
            filename: short_name(&chunk.filename),
            page: chunk.page,
            excerpt: chunk.text.chars().take(EXCERPT_CHARS).collect(),
        })
        .collect()
}

/// Guarantees every non-fallback answer carries at least one inline
/// citation: when the generated text has no citation-shaped substring, the
/// top-ranked passage's source is appended.
pub fn enforce_citation(answer: String, citations: &[Citation]) -> String {
    if answer.contains(NOT_FOUND_ANSWER) || citations.is_empty() {
        return answer;
    }

    let has_inline_citation = answer.contains('(') && answer.contains(" p.");
    if has_inline_citation {
        return answer;
    }

    let top = &citations[0];
    format!("{answer} ({} p.{})", top.filename, top.page)
}

/// Retrieval + generation for one question over an ingested chunk set.
pub fn answer_query<E, G>(
    query: &str,
    chunks: &mut [Chunk],
    cache: &mut EmbeddingCache,
    embedder: &E,
    generator: &G,
    top_k: usize,
    logs: &mut Vec<String>,
) -> Result<(String, Vec<Citation>), QaError>
where
    E: EmbeddingProvider,
    G: GenerationProvider,
{
    if chunks.is_empty() {
        log_step(logs, "No chunks available for retrieval");
        return Ok((NOT_FOUND_ANSWER.to_string(), Vec::new()));
    }

    index_embeddings(chunks, cache, embedder)?;

    let ranked = search(query, chunks, cache, embedder, top_k)?;
    log_step(
        logs,
        format!("TopK retrieval returned {} passages", ranked.len()),
    );

    if ranked.is_empty() {
        return Ok((NOT_FOUND_ANSWER.to_string(), Vec::new()));
    }

    let citations = citations_from(&ranked);
    let prompt = build_prompt(query, &ranked);
    let answer = generator.generate(&prompt)?;
    let answer = enforce_citation(answer, &citations);

    Ok((answer, citations))
}

#[cfg(test)]
mod tests {
    use super::{answer_query, build_prompt, enforce_citation, NOT_FOUND_ANSWER};
    use crate::cache::EmbeddingCache;
    use crate::embeddings::{CharacterNgramEmbedder, StubGenerator};
    use crate::models::{Chunk, Citation};
    use tempfile::tempdir;

    fn chunk(text: &str, filename: &str, page: u32) -> Chunk {
        Chunk {
            doc_id: "doc1".to_string(),
            filename: filename.to_string(),
            page,
            text: text.to_string(),
            embedding: None,
        }
    }

    fn citation(filename: &str, page: u32) -> Citation {
        Citation {
            doc_id: "doc1".to_string(),
            filename: filename.to_string(),
            page,
            excerpt: "excerpt".to_string(),
        }
    }

    #[test]
    fn prompt_labels_passages_and_includes_fallback_instruction() {
        let ranked = vec![(chunk("passage body", "data/report+2024.pdf", 7), 0.9f32)];
        let prompt = build_prompt("what happened?", &ranked);

        assert!(prompt.contains("[report 2024.pdf p.7] passage body"));
        assert!(prompt.contains("Question: what happened?"));
        assert!(prompt.contains(NOT_FOUND_ANSWER));
    }

    #[test]
    fn citation_is_appended_when_answer_has_none() {
        let citations = vec![citation("paper.pdf", 2)];
        let result = enforce_citation("The answer is 42.".to_string(), &citations);
        assert_eq!(result, "The answer is 42. (paper.pdf p.2)");
    }

    #[test]
    fn existing_inline_citation_is_left_alone() {
        let citations = vec![citation("paper.pdf", 2)];
        let answer = "It is 42 (other.pdf p.9).".to_string();
        assert_eq!(enforce_citation(answer.clone(), &citations), answer);
    }

    #[test]
    fn fallback_answer_is_never_decorated() {
        let citations = vec![citation("paper.pdf", 2)];
        let answer = NOT_FOUND_ANSWER.to_string();
        assert_eq!(enforce_citation(answer.clone(), &citations), answer);
    }

    #[test]
    fn no_citations_means_no_append() {
        let answer = "Unsupported claim.".to_string();
        assert_eq!(enforce_citation(answer.clone(), &[]), answer);
    }

    #[test]
    fn empty_chunk_set_short_circuits_to_fallback() {
        let dir = tempdir().expect("tempdir");
        let mut cache = EmbeddingCache::load(dir.path().join("embeddings.json"));
        let embedder = CharacterNgramEmbedder::default();
        let generator = StubGenerator::default();
        let mut logs = Vec::new();

        let (answer, citations) = answer_query(
            "anything",
            &mut [],
            &mut cache,
            &embedder,
            &generator,
            3,
            &mut logs,
        )
        .unwrap();

        assert_eq!(answer, NOT_FOUND_ANSWER);
        assert!(citations.is_empty());
        assert!(logs.iter().any(|line| line.contains("No chunks available")));
    }

    #[test]
    fn excerpt_is_bounded_prefix_of_passage() {
        let dir = tempdir().expect("tempdir");
        let mut cache = EmbeddingCache::load(dir.path().join("embeddings.json"));
        let embedder = CharacterNgramEmbedder::default();
        let generator = StubGenerator::default();
        let mut logs = Vec::new();

        let long_text = "lorem ipsum ".repeat(40);
        let mut chunks = vec![chunk(&long_text, "long.pdf", 1)];

        let (_answer, citations) = answer_query(
            "lorem ipsum",
            &mut chunks,
            &mut cache,
            &embedder,
            &generator,
            1,
            &mut logs,
        )
        .unwrap();

        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].excerpt.chars().count(), 240);
        assert!(long_text.starts_with(&citations[0].excerpt));
    }
}
