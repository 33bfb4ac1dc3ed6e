//! Sentence-transformer embeddings using Hugging Face Candle
//!
//! Runs a BERT-family encoder (e.g. `sentence-transformers/all-MiniLM-L6-v2`)
//! locally, mean-pools the last hidden state over the attention mask and
//! L2-normalises the result.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{
    embedding, layer_norm, linear, Activation, Embedding, LayerNorm, Linear, VarBuilder,
};
use serde::Deserialize;
use tokenizers::Tokenizer;

use super::Embedder;
use crate::error::RetrievalError;

/// Default Hugging Face repository for [`BertEmbedder::download`]
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Encoder hyper-parameters read from `config.json`
#[derive(Debug, Clone, Deserialize)]
pub struct BertConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
}

fn default_hidden_act() -> String {
    "gelu".to_string()
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

struct Embeddings {
    word: Embedding,
    position: Embedding,
    token_type: Embedding,
    layer_norm: LayerNorm,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        Ok(Self {
            word: embedding(config.vocab_size, config.hidden_size, vb.pp("word_embeddings"))?,
            position: embedding(
                config.max_position_embeddings,
                config.hidden_size,
                vb.pp("position_embeddings"),
            )?,
            token_type: embedding(
                config.type_vocab_size,
                config.hidden_size,
                vb.pp("token_type_embeddings"),
            )?,
            layer_norm: layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        position_ids: &Tensor,
    ) -> Result<Tensor> {
        let summed = ((self.word.forward(input_ids)? + self.position.forward(position_ids)?)?
            + self.token_type.forward(token_type_ids)?)?;
        Ok(self.layer_norm.forward(&summed)?)
    }
}

/// Self-attention with its output projection and residual norm
struct Attention {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    layer_norm: LayerNorm,
    num_heads: usize,
    head_size: usize,
}

impl Attention {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let head_size = config.hidden_size / config.num_attention_heads;
        let hidden = config.hidden_size;
        let self_vb = vb.pp("self");
        let out_vb = vb.pp("output");

        Ok(Self {
            query: linear(hidden, hidden, self_vb.pp("query"))?,
            key: linear(hidden, hidden, self_vb.pp("key"))?,
            value: linear(hidden, hidden, self_vb.pp("value"))?,
            output: linear(hidden, hidden, out_vb.pp("dense"))?,
            layer_norm: layer_norm(hidden, config.layer_norm_eps, out_vb.pp("LayerNorm"))?,
            num_heads: config.num_attention_heads,
            head_size,
        })
    }

    /// [batch, seq, hidden] -> [batch, heads, seq, head_size]
    fn split_heads(&self, x: &Tensor) -> Result<Tensor> {
        let (batch, seq, _) = x.dims3()?;
        Ok(x
            .reshape((batch, seq, self.num_heads, self.head_size))?
            .transpose(1, 2)?
            .contiguous()?)
    }

    fn forward(&self, hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
        let (batch, seq, width) = hidden.dims3()?;
        let q = self.split_heads(&self.query.forward(hidden)?)?;
        let k = self.split_heads(&self.key.forward(hidden)?)?;
        let v = self.split_heads(&self.value.forward(hidden)?)?;

        let scores = (q.matmul(&k.t()?.contiguous()?)? / (self.head_size as f64).sqrt())?;
        let scores = scores.broadcast_add(mask)?;
        let probs = candle_nn::ops::softmax_last_dim(&scores)?;

        let context = probs
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, seq, width))?;

        let projected = self.output.forward(&context)?;
        Ok(self.layer_norm.forward(&(projected + hidden)?)?)
    }
}

/// One transformer block: attention then feed-forward
struct Layer {
    attention: Attention,
    intermediate: Linear,
    activation: Activation,
    output: Linear,
    layer_norm: LayerNorm,
}

impl Layer {
    fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self> {
        let activation = match config.hidden_act.as_str() {
            "relu" => Activation::Relu,
            _ => Activation::Gelu,
        };

        Ok(Self {
            attention: Attention::load(vb.pp("attention"), config)?,
            intermediate: linear(
                config.hidden_size,
                config.intermediate_size,
                vb.pp("intermediate").pp("dense"),
            )?,
            activation,
            output: linear(
                config.intermediate_size,
                config.hidden_size,
                vb.pp("output").pp("dense"),
            )?,
            layer_norm: layer_norm(
                config.hidden_size,
                config.layer_norm_eps,
                vb.pp("output").pp("LayerNorm"),
            )?,
        })
    }

    fn forward(&self, hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
        let attended = self.attention.forward(hidden, mask)?;
        let expanded = self.activation.forward(&self.intermediate.forward(&attended)?)?;
        let out = self.output.forward(&expanded)?;
        Ok(self.layer_norm.forward(&(out + attended)?)?)
    }
}

/// Local BERT sentence encoder
pub struct BertEmbedder {
    embeddings: Embeddings,
    layers: Vec<Layer>,
    tokenizer: Tokenizer,
    max_len: usize,
    dimension: usize,
    device: Device,
}

impl BertEmbedder {
    /// Load a model directory containing `config.json`, `tokenizer.json`
    /// and `model.safetensors`
    pub fn load(model_path: &Path) -> Result<Self> {
        let device = Device::Cpu;

        let config_path = model_path.join("config.json");
        let tokenizer_path = model_path.join("tokenizer.json");
        let weights_path = model_path.join("model.safetensors");
        for path in [&config_path, &tokenizer_path, &weights_path] {
            if !path.exists() {
                return Err(anyhow!("Model file not found at {}", path.display()));
            }
        }

        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| anyhow!("Failed to parse config.json: {}", e))?;
        tracing::info!(
            "Loading encoder: {} layers, {} hidden size, {} attention heads",
            config.num_hidden_layers,
            config.hidden_size,
            config.num_attention_heads
        );

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        // sentence-transformers exports store tensors without the "bert." prefix
        let vb = if vb.contains_tensor("embeddings.word_embeddings.weight") {
            vb
        } else {
            vb.pp("bert")
        };

        let embeddings = Embeddings::load(vb.pp("embeddings"), &config)?;
        let layers = (0..config.num_hidden_layers)
            .map(|i| Layer::load(vb.pp("encoder").pp("layer").pp(i), &config))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Embedding model loaded from {}", model_path.display());

        Ok(Self {
            embeddings,
            layers,
            tokenizer,
            max_len: config.max_position_embeddings,
            dimension: config.hidden_size,
            device,
        })
    }

    /// Fetch model files from the Hugging Face Hub and return their directory
    pub fn download(repo: &str) -> Result<PathBuf> {
        use hf_hub::api::sync::Api;

        tracing::info!("Downloading {} from Hugging Face Hub", repo);
        let api = Api::new()?;
        let model = api.model(repo.to_string());

        let _config = model.get("config.json")?;
        let _tokenizer = model.get("tokenizer.json")?;
        let weights = model.get("model.safetensors")?;

        weights
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("Downloaded weights have no parent directory"))
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let seq_len = encoding.get_ids().len().min(self.max_len);
        if seq_len == 0 {
            return Err(anyhow!("Tokenizer produced no tokens"));
        }
        let ids = &encoding.get_ids()[..seq_len];
        let mask = &encoding.get_attention_mask()[..seq_len];

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let positions: Vec<u32> = (0..seq_len as u32).collect();
        let position_ids = Tensor::new(positions.as_slice(), &self.device)?.unsqueeze(0)?;
        let mask = Tensor::new(mask, &self.device)?.to_dtype(DType::F32)?;

        // Additive mask shaped [1, 1, 1, seq]: 0 to attend, -10000 to ignore
        let additive = ((mask.affine(-1.0, 1.0)? * -10000.0)?)
            .reshape((1, 1, 1, seq_len))?;

        let mut hidden = self.embeddings.forward(&input_ids, &token_type_ids, &position_ids)?;
        for layer in &self.layers {
            hidden = layer.forward(&hidden, &additive)?;
        }

        // Mean pooling over attended tokens
        let hidden = hidden.squeeze(0)?;
        let weights = mask.unsqueeze(1)?;
        let summed = hidden.broadcast_mul(&weights)?.sum(0)?;
        let pooled = summed.broadcast_div(&weights.sum(0)?)?;

        let norm = (pooled.sqr()?.sum_all()?.sqrt()? + 1e-12)?;
        Ok(pooled.broadcast_div(&norm)?.to_vec1::<f32>()?)
    }
}

impl Embedder for BertEmbedder {
    fn name(&self) -> &str {
        "bert"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RetrievalError::EmbeddingFailure("input is empty".to_string()));
        }
        self.encode(text)
            .map_err(|e| RetrievalError::EmbeddingFailure(e.to_string()))
    }
}
