//! Stability search: discover identifier fragments a tokenizer always
//! encodes as an isolated, relocatable 3-token run.
//!
//! Subword tokenizers merge and split tokens based on neighboring
//! characters, so a short identifier embedded in generated text may
//! tokenize differently depending on what surrounds it. The search
//! enumerates `Upper+lower` starters (plus a third lowercase letter in long
//! mode) and `digit+lower` suffixes, and keeps only combinations whose
//! token triple `[starter, digit, letter]` survives re-tokenization under
//! all 20 probe contexts in [`super::contexts`].
//!
//! The sweep is a batch computation (worst case ~700 x 260 x 22
//! tokenizations, ~26x more in long mode) intended to run once per model
//! and be cached; it is parallelized across starters with rayon, which
//! never changes the result because output is collected into an ordered
//! map.

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use super::cache::{CacheParams, MapCache};
use super::contexts::{is_banned, ALT_CONTEXTS, BASE_CONTEXTS, BASE_TEXT};
use super::map::StabilityMap;
use super::tokenizer::{TokenSource, TokenizerError};

/// Errors raised while building a stability map.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),
    #[error(
        "base and alternate calibration streams diverge for prefix {prefix:?}; \
         the prefix likely spans more than one token"
    )]
    PrefixMisaligned { prefix: String },
}

/// Options for the stability search.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Prepended to every identifier; must combine with any starter into at
    /// most one additional token under the base lead.
    pub prefix: String,
    /// Use three-character starters instead of two (~26x the search space).
    pub long: bool,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enable long mode (three-character starters).
    pub fn long(mut self, long: bool) -> Self {
        self.long = long;
        self
    }
}

/// Whether `triple` occurs as a contiguous subsequence of `tokens`.
fn contains_triple(tokens: &[u32], triple: &[u32; 3]) -> bool {
    tokens.windows(3).any(|window| window == &triple[..])
}

/// Enumerate non-banned starter candidates for the configured mode.
fn starter_candidates(long: bool) -> Vec<String> {
    let mut candidates = Vec::with_capacity(if long { 26 * 26 * 26 } else { 26 * 26 });
    for upper in b'A'..=b'Z' {
        for lower in b'a'..=b'z' {
            if long {
                for extra in b'a'..=b'z' {
                    let starter = format!("{}{}{}", upper as char, lower as char, extra as char);
                    if !is_banned(&starter) {
                        candidates.push(starter);
                    }
                }
            } else {
                let starter = format!("{}{}", upper as char, lower as char);
                if !is_banned(&starter) {
                    candidates.push(starter);
                }
            }
        }
    }
    candidates
}

/// Build a [`StabilityMap`] by sweeping all starter and suffix candidates.
///
/// Deterministic for a fixed tokenizer, prefix, and mode. Returns
/// [`GenerateError::PrefixMisaligned`] when the configured prefix tokenizes
/// differently under the base and alternate calibration leads, which makes
/// the method inapplicable for that prefix.
pub fn generate_id_map(
    source: &dyn TokenSource,
    options: &GenerateOptions,
) -> Result<StabilityMap, GenerateError> {
    let prefix = options.prefix.as_str();
    let alt_lead = ALT_CONTEXTS[0].leading;

    // Calibration streams for the base (space) and alternate (@) leads.
    let base_calibration = if prefix.is_empty() {
        BASE_TEXT.to_string()
    } else {
        format!("{BASE_TEXT} {prefix}")
    };
    let base_tokens = source.tokenize(&base_calibration)?;
    let alt_tokens = source.tokenize(&format!("{BASE_TEXT}{alt_lead}{prefix}"))?;

    // The alternate stream must share the base stream's prefix, up to the
    // one extra token the alternate lead symbol introduces.
    let shared = if prefix.is_empty() {
        base_tokens.len()
    } else {
        base_tokens.len().saturating_sub(1)
    };
    if alt_tokens.len() < shared || alt_tokens[..shared] != base_tokens[..shared] {
        return Err(GenerateError::PrefixMisaligned {
            prefix: prefix.to_string(),
        });
    }

    let candidates = starter_candidates(options.long);
    let entries = candidates
        .par_iter()
        .map(|starter| probe_starter(source, prefix, alt_lead, starter, &base_tokens, &alt_tokens))
        .collect::<Result<Vec<_>, GenerateError>>()?;

    let map: StabilityMap = entries.into_iter().flatten().collect();
    debug!(
        model = source.model_key(),
        starters = map.len(),
        long = options.long,
        "stability search complete"
    );
    Ok(map)
}

/// Build a [`StabilityMap`], short-circuiting through the cache.
///
/// A cache hit skips the sweep entirely. A failed cache write never aborts
/// a successful build; it is logged and the freshly built map is returned.
pub fn generate_id_map_cached(
    source: &dyn TokenSource,
    options: &GenerateOptions,
    cache: &MapCache,
) -> Result<StabilityMap, GenerateError> {
    let params = CacheParams {
        model: source.model_key(),
        prefix: &options.prefix,
        long: options.long,
    };

    if let Some(map) = cache.load(&params) {
        return Ok(map);
    }

    let map = generate_id_map(source, options)?;
    if let Err(e) = cache.save(&params, &map) {
        warn!(error = %e, "failed to persist id map cache");
    }
    Ok(map)
}

/// Probe one starter: validate it under both leads, then sweep its 260
/// suffixes. Returns the surviving `(prefix+starter, suffixes)` entry, or
/// `None` when the starter is rejected or retains no suffix.
fn probe_starter(
    source: &dyn TokenSource,
    prefix: &str,
    alt_lead: &str,
    starter: &str,
    base_tokens: &[u32],
    alt_tokens: &[u32],
) -> Result<Option<(String, Vec<String>)>, GenerateError> {
    let test_base = source.tokenize(&format!("{BASE_TEXT} {prefix}{starter}"))?;
    let test_alt = source.tokenize(&format!("{BASE_TEXT}{alt_lead}{prefix}{starter}"))?;

    // The starter must add exactly one token beyond each calibration stream
    // and leave the shared region untouched.
    if test_base.len() != base_tokens.len() + 1 || test_base[..base_tokens.len()] != *base_tokens {
        return Ok(None);
    }
    if test_alt.len() != alt_tokens.len() + 1 || test_alt[..alt_tokens.len()] != *alt_tokens {
        return Ok(None);
    }

    let base_starter_token = test_base[test_base.len() - 1];
    let alt_starter_token = test_alt[test_alt.len() - 1];

    // With a prefix, the starter's token must not depend on the lead.
    if !prefix.is_empty() && base_starter_token != alt_starter_token {
        return Ok(None);
    }

    let mut suffixes = Vec::new();

    for digit in b'0'..=b'9' {
        'suffix: for lower in b'a'..=b'z' {
            let suffix = format!("{}{}", digit as char, lower as char);
            let full_id = format!("{starter}{suffix}");

            let full_base = source.tokenize(&format!("{BASE_TEXT} {prefix}{full_id}"))?;
            let full_alt = source.tokenize(&format!("{BASE_TEXT}{alt_lead}{prefix}{full_id}"))?;

            let base_len = test_base.len();
            let alt_len = test_alt.len();

            // The suffix must add exactly two tokens beyond the starter probe.
            if full_base.len() != base_len + 2
                || full_alt.len() != alt_len + 2
                || full_base[..base_len] != test_base[..]
                || full_alt[..alt_len] != test_alt[..]
            {
                continue;
            }

            // Token triple per lead family: [starter, digit, letter].
            let triple_base = [
                full_base[base_len - 1],
                full_base[base_len],
                full_base[base_len + 1],
            ];
            let triple_alt = [full_alt[alt_len - 1], full_alt[alt_len], full_alt[alt_len + 1]];

            if triple_base[0] != base_starter_token || triple_alt[0] != alt_starter_token {
                continue;
            }

            // The triple must survive relocation into every probe context.
            for ctx in &BASE_CONTEXTS {
                let tokens = source.tokenize(&format!(
                    "{BASE_TEXT}{}{prefix}{full_id}{}",
                    ctx.leading, ctx.trailing
                ))?;
                if !contains_triple(&tokens, &triple_base) {
                    continue 'suffix;
                }
            }
            for ctx in &ALT_CONTEXTS {
                let tokens = source.tokenize(&format!(
                    "{BASE_TEXT}{}{prefix}{full_id}{}",
                    ctx.leading, ctx.trailing
                ))?;
                if !contains_triple(&tokens, &triple_alt) {
                    continue 'suffix;
                }
            }

            suffixes.push(suffix);
        }
    }

    if suffixes.is_empty() {
        Ok(None)
    } else {
        Ok(Some((format!("{prefix}{starter}"), suffixes)))
    }
}
