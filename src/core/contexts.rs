//! Static probe tables for the stability search.
//!
//! These tables are configuration, not derived data. The search algorithm in
//! [`super::generator`] stays free of special cases by driving everything off
//! them:
//!
//! - [`BASE_CONTEXTS`]: space/colon leads with ordinary trailing punctuation.
//! - [`ALT_CONTEXTS`]: symbol leads (`@`, `#`, quotes, brackets, ...) that
//!   commonly change how the first identifier character tokenizes.
//! - [`is_banned`]: starters excluded up front because they collide with
//!   ordinary vocabulary (doubled letters and common short words).

/// Calibration sentence prepended to every probe text.
///
/// Tokenizes identically across probes, so any change in stream length is
/// attributable to the candidate under test.
pub const BASE_TEXT: &str = "Test Test";

/// Schema version baked into cache keys; bump on any format change.
pub const CACHE_VERSION: u32 = 3;

/// A fixed surrounding-text pattern used to probe tokenization robustness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextTemplate {
    /// Text inserted between [`BASE_TEXT`] and the identifier.
    pub leading: &'static str,
    /// Text appended after the identifier.
    pub trailing: &'static str,
}

/// Contexts with ordinary leads (space, colon) and trailing punctuation.
pub const BASE_CONTEXTS: [ContextTemplate; 8] = [
    ContextTemplate { leading: " ", trailing: "" },
    ContextTemplate { leading: ": ", trailing: "" },
    ContextTemplate { leading: ": ", trailing: "." },
    ContextTemplate { leading: ": ", trailing: "," },
    ContextTemplate { leading: ": ", trailing: "!" },
    ContextTemplate { leading: " ", trailing: "-" },
    ContextTemplate { leading: " ", trailing: ";" },
    ContextTemplate { leading: " ", trailing: ":" },
];

/// Contexts with symbol leads. The first entry (` @`) doubles as the
/// alternate calibration lead for the search.
pub const ALT_CONTEXTS: [ContextTemplate; 12] = [
    ContextTemplate { leading: " @", trailing: "" },
    ContextTemplate { leading: " #", trailing: "" },
    ContextTemplate { leading: " ,", trailing: "" },
    ContextTemplate { leading: " \"", trailing: "\"" },
    ContextTemplate { leading: " '", trailing: "'" },
    ContextTemplate { leading: " (", trailing: ")" },
    ContextTemplate { leading: " <", trailing: ">" },
    ContextTemplate { leading: " [", trailing: "]" },
    ContextTemplate { leading: " {", trailing: "}" },
    ContextTemplate { leading: " -", trailing: "-" },
    ContextTemplate { leading: " ,", trailing: "," },
    ContextTemplate { leading: " _", trailing: "_" },
];

/// Common English words and abbreviations excluded as starters.
const BANNED_WORDS: &[&str] = &[
    // Two-letter words
    "Am", "An", "As", "At", "Be", "By", "Do", "Go", "He", "If", "In", "Is",
    "It", "Me", "My", "No", "Of", "On", "Or", "So", "To", "Up", "Us", "We",
    "Id",
    // Three-letter words (long mode)
    "Not", "Non", "Yes", "Oui", "Out", "Msg", "For", "The", "And", "Are",
    "But", "You", "All", "Any", "His", "Him", "Her", "Was", "One", "Two",
    "Six", "Ten", "Get", "Our", "Has", "Its", "Who", "Why", "How", "Let",
    "Now", "See",
];

/// Whether a starter candidate is excluded a priori.
///
/// Covers doubled-letter starters (`Aa`..`Zz`, `Aaa`..`Zzz`) and the fixed
/// word list above. Candidates are always one uppercase letter followed by
/// lowercase letters.
pub fn is_banned(starter: &str) -> bool {
    let mut chars = starter.chars();
    if let Some(first) = chars.next() {
        let first = first.to_ascii_lowercase();
        if chars.clone().count() > 0 && chars.all(|c| c == first) {
            return true;
        }
    }
    BANNED_WORDS.contains(&starter)
}
