use crate::cache::EmbeddingCache;
use crate::error::QaError;
use crate::models::Chunk;
use crate::traits::EmbeddingProvider;

/// Normalized dot product. Zero when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f32>();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// Attaches an embedding to every chunk that lacks one. Cache hits are
/// served directly; all misses go to the provider in a single batched call
/// and the cache is flushed once for the whole batch.
pub fn index_embeddings<E: EmbeddingProvider>(
    chunks: &mut [Chunk],
    cache: &mut EmbeddingCache,
    provider: &E,
) -> Result<(), QaError> {
    if chunks.is_empty() {
        return Ok(());
    }

    let mut miss_texts: Vec<String> = Vec::new();
    let mut miss_indices: Vec<usize> = Vec::new();

    for (index, chunk) in chunks.iter_mut().enumerate() {
        if chunk.embedding.is_some() {
            continue;
        }
        match cache.get(&chunk.text, provider.model()) {
            Some(vector) => chunk.embedding = Some(vector.clone()),
            None => {
                miss_texts.push(chunk.text.clone());
                miss_indices.push(index);
            }
        }
    }

    if miss_texts.is_empty() {
        return Ok(());
    }

    let vectors = provider.embed_batch(&miss_texts)?;
    if vectors.len() != miss_texts.len() {
        return Err(QaError::Request(format!(
            "embedder returned {} vectors for {} inputs",
            vectors.len(),
            miss_texts.len()
        )));
    }

    for (index, vector) in miss_indices.into_iter().zip(vectors) {
        cache.put(&chunks[index].text, provider.model(), vector.clone());
        chunks[index].embedding = Some(vector);
    }
    cache.flush()?;

    Ok(())
}

/// Ranks chunks against the query by cosine similarity and returns the top
/// `top_k` with their scores, best first. Chunks without an embedding are
/// excluded from ranking. Ties keep insertion order (the sort is stable).
/// An empty chunk set returns empty without touching the embedder.
pub fn search<E: EmbeddingProvider>(
    query: &str,
    chunks: &[Chunk],
    cache: &mut EmbeddingCache,
    provider: &E,
    top_k: usize,
) -> Result<Vec<(Chunk, f32)>, QaError> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let query_vector = match cache.get(query, provider.model()) {
        Some(vector) => vector.clone(),
        None => {
            let mut vectors = provider.embed_batch(&[query.to_string()])?;
            let vector = vectors.pop().ok_or_else(|| {
                QaError::Request("embedder returned no vector for the query".to_string())
            })?;
            cache.put(query, provider.model(), vector.clone());
            cache.flush()?;
            vector
        }
    };

    let mut ranked: Vec<(Chunk, f32)> = chunks
        .iter()
        .filter(|chunk| chunk.embedding.is_some())
        .map(|chunk| {
            let score = cosine_similarity(
                &query_vector,
                chunk.embedding.as_deref().unwrap_or_default(),
            );
            (chunk.clone(), score)
        })
        .collect();

    ranked.sort_by(|left, right| right.1.total_cmp(&left.1));
    ranked.truncate(top_k);

    Ok(ranked)
}
