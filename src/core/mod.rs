//! Core engine for ephemid.
//!
//! This module contains the stability search and the pool allocator that
//! together produce and manage tokenizer-stable ephemeral identifiers:
//!
//! - [`generator`]: combinatorial sweep over starter/suffix candidates,
//!   validated under 20 surrounding contexts via a [`TokenSource`]
//! - [`allocator`]: O(1) allocate/release over a built [`StabilityMap`]
//! - [`tokenizer`]: the pluggable text-to-token-ids adapter
//! - [`cache`]: keyed JSON persistence of built maps
//! - [`contexts`]: static probe tables (context templates, banned starters)
//!
//! # Architecture
//!
//! Data flows one way: the generator (optionally short-circuited by the
//! cache) produces a read-only [`StabilityMap`], which the allocator
//! consumes. The generator is a one-shot batch computation, parallel across
//! starters; the allocator is single-owner and unsynchronized.

pub mod allocator;
pub mod cache;
pub mod contexts;
pub mod generator;
pub mod map;
pub mod tokenizer;

pub use allocator::{AllocError, EphemeralIds, SetupError};
pub use cache::{CacheError, CacheParams, MapCache};
pub use contexts::{
    is_banned, ContextTemplate, ALT_CONTEXTS, BASE_CONTEXTS, BASE_TEXT, CACHE_VERSION,
};
pub use generator::{generate_id_map, generate_id_map_cached, GenerateError, GenerateOptions};
pub use map::StabilityMap;
#[cfg(feature = "huggingface")]
pub use tokenizer::HfTokenizerSource;
pub use tokenizer::{TiktokenSource, TokenSource, TokenizerError};
