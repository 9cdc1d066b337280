//! Embedding generation for work item summaries.
//!
//! The core only depends on the [`EmbeddingGenerator`] trait. The default
//! backend is fastembed running a local sentence-transformer model; the
//! model identifier comes from configuration.

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

use crate::vector::{VectorDimension, VectorError};

/// Model identifiers accepted in configuration, with their dimensions.
const SUPPORTED_MODELS: &[(&str, EmbeddingModel, usize)] = &[
    ("AllMiniLML6V2", EmbeddingModel::AllMiniLML6V2, 384),
    ("AllMiniLML12V2", EmbeddingModel::AllMiniLML12V2, 384),
    ("BGESmallENV15", EmbeddingModel::BGESmallENV15, 384),
    ("BGEBaseENV15", EmbeddingModel::BGEBaseENV15, 768),
    (
        "ParaphraseMLMiniLML12V2",
        EmbeddingModel::ParaphraseMLMiniLML12V2,
        384,
    ),
    ("MultilingualE5Small", EmbeddingModel::MultilingualE5Small, 384),
];

const SUPPORTED_MODEL_NAMES: &str = "AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15, ParaphraseMLMiniLML12V2, MultilingualE5Small";

/// Trait for generating embeddings from text.
///
/// Implementations must be deterministic for a fixed model identifier and
/// safe to share between threads.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts, one per input, in order.
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Identifier of the model, recorded alongside stored vectors.
    fn model_id(&self) -> &str;

    /// Generate the embedding for a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        self.generate_embeddings(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| {
                VectorError::EmbeddingFailed("Provider returned no embedding".to_string())
            })
    }
}

/// Resolves a configured model identifier to a fastembed model and its
/// output dimension.
pub fn parse_embedding_model(name: &str) -> Result<(EmbeddingModel, usize), VectorError> {
    SUPPORTED_MODELS
        .iter()
        .find(|(id, _, _)| id.eq_ignore_ascii_case(name))
        .map(|(_, model, dim)| (model.clone(), *dim))
        .ok_or_else(|| VectorError::UnknownModel(name.to_string(), SUPPORTED_MODEL_NAMES))
}

/// Default directory for downloaded model files.
#[must_use]
pub fn default_models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("scopesync")
        .join("models")
}

/// fastembed implementation backed by a local ONNX model.
///
/// # Performance
/// - Batch processing: ~1-10ms per embedding on average
/// - Memory: 384 * 4 bytes = 1536 bytes per embedding for the default model
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    model_id: String,
    dimension: VectorDimension,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model_id", &self.model_id)
            .field("dimension", &self.dimension)
            .field("model", &"<TextEmbedding>")
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Load the named model, downloading it into `cache_dir` on first use.
    ///
    /// # Errors
    /// Returns an error if the identifier is unknown or the model fails to
    /// initialize or download.
    pub fn new(
        model_id: &str,
        cache_dir: Option<PathBuf>,
        show_download_progress: bool,
    ) -> Result<Self, VectorError> {
        let (model, dim) = parse_embedding_model(model_id)?;
        let cache_dir = cache_dir.unwrap_or_else(default_models_dir);
        info!(model = model_id, cache = %cache_dir.display(), "loading embedding model");

        let text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| VectorError::EmbeddingFailed(
            format!("Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download")
        ))?;

        Ok(Self {
            model: Mutex::new(text_model),
            model_id: model_id.to_string(),
            dimension: VectorDimension::new(dim)?,
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let text_strings: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();
        debug!(count = text_strings.len(), "generating embeddings");

        let embeddings = self
            .model
            .lock()
            .map_err(|_| {
                VectorError::EmbeddingFailed(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(text_strings, None)
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        if embeddings.len() != texts.len() {
            return Err(VectorError::EmbeddingFailed(format!(
                "Expected {} embeddings, model returned {}",
                texts.len(),
                embeddings.len()
            )));
        }
        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Mock embedding generator for testing.
///
/// Produces deterministic unit vectors from a small topic vocabulary, so
/// texts sharing topics land close together.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
}

#[cfg(test)]
impl Default for MockEmbeddingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    const TOPICS: &'static [&'static str] =
        &["password", "reset", "billing", "export", "profile", "login"];

    /// Create a new mock generator with 8 dimensions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dimension: VectorDimension::new(8).unwrap(),
        }
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        let dim = self.dimension.get();
        let mut embeddings = Vec::new();

        for text in texts {
            let lower = text.to_lowercase();
            let mut embedding = vec![0.0; dim];
            // Last slot keeps every vector non-zero
            embedding[dim - 1] = 0.05;

            for (slot, topic) in Self::TOPICS.iter().enumerate() {
                if slot < dim - 1 && lower.contains(topic) {
                    embedding[slot] = 1.0;
                }
            }

            let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            for val in &mut embedding {
                *val /= magnitude;
            }

            embeddings.push(embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "mock-topics"
    }
}
