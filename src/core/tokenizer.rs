//! Tokenizer adapters for the stability search.
//!
//! The search only needs one capability from a tokenizer: a pure,
//! deterministic `text -> token ids` function with no special-token
//! handling. [`TokenSource`] captures that contract; adapters wrap concrete
//! tokenizer backends:
//!
//! - [`TiktokenSource`]: tiktoken encodings (`cl100k_base`, `o200k_base`, ...)
//!   via `tiktoken-rs`.
//! - `HfTokenizerSource` (feature `huggingface`): a `tokenizer.json` file
//!   loaded through the Hugging Face `tokenizers` crate.
//!
//! Model-loading failures are fatal setup errors; they propagate and are
//! never retried or recovered by the search.

use thiserror::Error;
use tiktoken_rs::CoreBPE;

/// Errors raised by tokenizer adapters.
#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("unknown model or encoding: {0}")]
    UnknownModel(String),
    #[error("failed to load tokenizer for {model}")]
    Load {
        model: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to encode text: {0}")]
    Encode(String),
}

/// A pure text-to-token-ids function, deterministic for a fixed model.
pub trait TokenSource: Send + Sync {
    /// Tokenize `text` into ordered token ids, without special tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    /// Opaque model identity, used to derive cache keys.
    fn model_key(&self) -> &str;
}

/// Token source backed by a tiktoken encoding.
pub struct TiktokenSource {
    bpe: CoreBPE,
    key: String,
}

impl TiktokenSource {
    /// Load a named tiktoken encoding.
    ///
    /// Supported: `cl100k_base`, `o200k_base`, `p50k_base`, `r50k_base`.
    pub fn from_encoding(name: &str) -> Result<Self, TokenizerError> {
        let bpe = match name {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            _ => {
                return Err(TokenizerError::UnknownModel(format!(
                    "{name}. Supported: cl100k_base, o200k_base, p50k_base, r50k_base"
                )))
            }
        }
        .map_err(|e| TokenizerError::Load {
            model: name.to_string(),
            source: e,
        })?;

        Ok(Self {
            bpe,
            key: name.to_string(),
        })
    }
}

impl TokenSource for TiktokenSource {
    // Rank width differs across tiktoken-rs versions; normalize to u32.
    #[allow(clippy::unnecessary_cast)]
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok(self
            .bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|rank| rank as u32)
            .collect())
    }

    fn model_key(&self) -> &str {
        &self.key
    }
}

/// Token source backed by a Hugging Face `tokenizer.json` file.
#[cfg(feature = "huggingface")]
pub struct HfTokenizerSource {
    inner: tokenizers::Tokenizer,
    key: String,
}

#[cfg(feature = "huggingface")]
impl HfTokenizerSource {
    /// Load a tokenizer from a `tokenizer.json` file.
    ///
    /// `key` names the model for cache-key purposes, typically the repo the
    /// file came from (e.g. `meta-llama/Llama-3.2-3B`).
    pub fn from_file(
        path: impl AsRef<std::path::Path>,
        key: impl Into<String>,
    ) -> Result<Self, TokenizerError> {
        let key = key.into();
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| TokenizerError::Load {
            model: key.clone(),
            source: anyhow::anyhow!(e),
        })?;
        Ok(Self { inner, key })
    }
}

#[cfg(feature = "huggingface")]
impl TokenSource for HfTokenizerSource {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| TokenizerError::Encode(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn model_key(&self) -> &str {
        &self.key
    }
}
