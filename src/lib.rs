//! Ephemid - tokenizer-stable ephemeral identifiers for LLM prompts
//!
//! Produces short textual identifiers that a target model's subword
//! tokenizer reliably re-encodes as a fixed 3-token run regardless of the
//! punctuation or context surrounding them in generated text, so callers
//! can embed opaque markers in prompts and later find or redact them in
//! model output with high confidence.
//!
//! Two core pieces:
//! - the stability search ([`generate_id_map`]), which discovers the
//!   starter/suffix fragments that survive re-tokenization under 20
//!   surrounding contexts, and
//! - the pool allocator ([`EphemeralIds`]), which hands out and reclaims
//!   identifiers with O(1) operations and collision-free active tracking.
//!
//! # Example
//!
//! ```ignore
//! use ephemid::{EphemeralIds, GenerateOptions, MapCache, TiktokenSource};
//!
//! let source = TiktokenSource::from_encoding("cl100k_base")?;
//! let mut ids = EphemeralIds::from_source_cached(
//!     &source,
//!     &GenerateOptions::new(),
//!     &MapCache::default_dir(),
//! )?;
//!
//! let id = ids.create()?;   // e.g. "Zq3f"
//! // ... embed `id` in a prompt, locate it in the output ...
//! ids.release(&id);
//! ```

pub mod core;

pub use core::{
    generate_id_map, generate_id_map_cached, is_banned, AllocError, CacheError, CacheParams,
    ContextTemplate, EphemeralIds, GenerateError, GenerateOptions, MapCache, SetupError,
    StabilityMap, TiktokenSource, TokenSource, TokenizerError, ALT_CONTEXTS, BASE_CONTEXTS,
    BASE_TEXT, CACHE_VERSION,
};

#[cfg(feature = "huggingface")]
pub use core::HfTokenizerSource;
