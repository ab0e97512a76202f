//! Deterministic offline embeddings for tests and local experiments.

use crate::embeddings::provider::EmbeddingProvider;
use ragchat_core::AppResult;

pub const MOCK_MODEL: &str = "trigram-v1";
pub const MOCK_DIMENSIONS: usize = 384;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "what",
];

/// Hashes word trigrams into a fixed number of buckets.
///
/// Not semantic, but texts sharing words land close together, which is
/// enough to exercise retrieval without a model server.
#[derive(Debug)]
pub struct MockEmbeddings {
    dimensions: usize,
}

impl Default for MockEmbeddings {
    fn default() -> Self {
        Self::new(MOCK_DIMENSIONS)
    }
}

impl MockEmbeddings {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, bytes: impl Iterator<Item = u8>, seed: u64) -> usize {
        let hash = bytes.fold(seed, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
        });
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        let words = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w));

        for word in words {
            vector[self.bucket(word.bytes(), 0xcbf2_9ce4_8422_2325)] += 1.0;

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(trigram.bytes(), 0x8422_2325_cbf2_9ce4)] += 0.5;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddings {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}
