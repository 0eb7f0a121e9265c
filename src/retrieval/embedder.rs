//! Sentence embedding for the semantic index
//!
//! `TextEmbedder` is the seam between the index and whatever produces
//! vectors. With the `embeddings` feature the crate ships `MiniLmEmbedder`,
//! a Candle port of `sentence-transformers/all-MiniLM-L6-v2`.

use anyhow::Result;

/// Produces fixed-size, L2-normalized vectors for text
pub trait TextEmbedder: Send + Sync {
    /// Batch embed catalog documents
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a request text
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier; an index built by a different model is rebuilt
    fn model_name(&self) -> &str;
}

#[cfg(feature = "embeddings")]
pub use minilm::MiniLmEmbedder;

#[cfg(feature = "embeddings")]
mod minilm {
    use anyhow::{anyhow, Context, Result};
    use candle_core::{DType, Device, Tensor};
    use candle_nn::VarBuilder;
    use candle_transformers::models::bert::{BertModel, Config, DTYPE};
    use hf_hub::{api::sync::Api, Repo, RepoType};
    use tokenizers::Tokenizer;
    use tracing::{debug, info};

    use super::TextEmbedder;

    /// Model repository on HuggingFace Hub
    const MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

    pub const EMBEDDING_DIM: usize = 384;

    /// MiniLM sentence embedder (mean pooling over the attention mask)
    pub struct MiniLmEmbedder {
        model: BertModel,
        tokenizer: Tokenizer,
        device: Device,
        model_name: String,
    }

    impl MiniLmEmbedder {
        /// Load the default model, downloading it into the HuggingFace cache on first use (~90MB)
        pub fn new() -> Result<Self> {
            Self::with_model(MODEL_REPO)
        }

        pub fn with_model(model_name: &str) -> Result<Self> {
            info!("Loading embedding model: {}", model_name);

            let device = Device::Cpu;

            let api = Api::new().context("Failed to create HuggingFace API client")?;
            let repo = api.repo(Repo::new(model_name.to_string(), RepoType::Model));

            let config_path = repo.get("config.json").context("Failed to download config.json")?;
            let tokenizer_path = repo
                .get("tokenizer.json")
                .context("Failed to download tokenizer.json")?;
            let weights_path = repo
                .get("model.safetensors")
                .context("Failed to download model.safetensors")?;

            let config: Config = serde_json::from_str(
                &std::fs::read_to_string(&config_path).context("Failed to read config.json")?,
            )
            .context("Failed to parse config.json")?;
            debug!("Model config: hidden_size={}", config.hidden_size);

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

            // SAFETY: the safetensors file is owned by the HF cache and not mutated while mapped
            let vb = unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                    .context("Failed to load model weights")?
            };
            let model = BertModel::load(vb, &config).context("Failed to build BERT model")?;

            info!("Embedding model loaded ({})", model_name);

            Ok(Self {
                model,
                tokenizer,
                device,
                model_name: model_name.to_string(),
            })
        }

        fn forward_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(vec![]);
            }

            let encodings = self
                .tokenizer
                .encode_batch(texts.to_vec(), true)
                .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

            let max_len = encodings
                .iter()
                .map(|e| e.get_ids().len())
                .max()
                .unwrap_or(0);

            let mut ids = Vec::with_capacity(texts.len() * max_len);
            let mut mask = Vec::with_capacity(texts.len() * max_len);
            let mut type_ids = Vec::with_capacity(texts.len() * max_len);
            for encoding in &encodings {
                let pad = max_len - encoding.get_ids().len();
                ids.extend(encoding.get_ids().iter().copied().chain(std::iter::repeat(0).take(pad)));
                mask.extend(
                    encoding
                        .get_attention_mask()
                        .iter()
                        .copied()
                        .chain(std::iter::repeat(0).take(pad)),
                );
                type_ids.extend(
                    encoding
                        .get_type_ids()
                        .iter()
                        .copied()
                        .chain(std::iter::repeat(0).take(pad)),
                );
            }

            let shape = (texts.len(), max_len);
            let input_ids = Tensor::from_vec(ids, shape, &self.device)?;
            let attention_mask = Tensor::from_vec(mask, shape, &self.device)?;
            let token_type_ids = Tensor::from_vec(type_ids, shape, &self.device)?;

            // (batch, seq, hidden)
            let output = self
                .model
                .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

            // mean over real tokens only
            let weights = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
            let summed = output.broadcast_mul(&weights)?.sum(1)?;
            let counts = weights.sum(1)?.clamp(1e-9, f64::MAX)?;
            let pooled = summed.broadcast_div(&counts)?;

            let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
            let normalized = pooled.broadcast_div(&norm)?;

            Ok(normalized.to_vec2::<f32>()?)
        }
    }

    impl TextEmbedder for MiniLmEmbedder {
        fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            self.forward_batch(&refs)
        }

        fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            self.forward_batch(&[text])?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("Embedding model returned no vector"))
        }

        fn model_name(&self) -> &str {
            &self.model_name
        }
    }

}
