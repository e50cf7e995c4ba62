//! Search-string normalization for name comparison and album-intent detection.
//!
//! The normalized form is only ever used for matching. Display always uses the
//! catalogue's original name.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Parenthesized, bracketed or braced segments: "(Remastered 2009)", "[Live]", "{Demo}"
pub static BRACKETED_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]|\{[^}]*\}").unwrap());

/// Punctuation stripped from both query and names (also catches unbalanced brackets)
pub static PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.,!?¡¿'"‘’“”´`:;\-–—&/\\*#@$%^~+=|<>()\[\]{}_]"#).unwrap()
});

/// A single leading definite/indefinite article
pub static LEADING_ARTICLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:the|an|a)\s+").unwrap());

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// ALBUM INTENT
// ============================================================================

/// Substrings that suggest the user is looking for a release rather than an act.
pub const ALBUM_INDICATORS: &[&str] = &[
    "album",
    "record",
    "soundtrack",
    "vol",
    "volume",
    "collection",
    "deluxe",
    "remaster",
];

/// Well-known album titles, stored already normalized.
pub static KNOWN_ALBUMS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "abbey road",
        "revolver",
        "sgt peppers lonely hearts club band",
        "dark side of the moon",
        "wish you were here",
        "thriller",
        "bad",
        "ok computer",
        "kid a",
        "nevermind",
        "rumours",
        "back in black",
        "purple rain",
        "kind of blue",
        "born to run",
        "led zeppelin iv",
        "physical graffiti",
        "london calling",
        "blonde",
        "lemonade",
        "1989",
        "red",
        "folklore",
        "to pimp a butterfly",
        "good kid maad city",
        "my beautiful dark twisted fantasy",
        "college dropout",
        "random access memories",
        "pet sounds",
        "hotel california",
    ]
    .into_iter()
    .collect()
});

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize a query or catalogue name for matching.
/// Lower-cases and strips one leading article first, then drops bracketed
/// segments and punctuation and collapses whitespace. An article only exposed
/// by those later removals is kept.
pub fn normalize_search_string(s: &str) -> String {
    let lower = s.to_lowercase();
    let result = LEADING_ARTICLE.replace(lower.trim(), "");
    let result = BRACKETED_SEGMENT.replace_all(&result, " ");
    let result = PUNCTUATION.replace_all(&result, "");
    MULTI_SPACE.replace_all(result.trim(), " ").into_owned()
}

/// Fuzzy equality over already-normalized names.
///
/// An empty name only matches another empty name; otherwise the empty string
/// would be a substring of everything.
pub fn names_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return a == b;
    }
    a == b
        || a.contains(b)
        || b.contains(a)
        || b.strip_prefix("the ") == Some(a)
        || a.strip_prefix("the ") == Some(b)
}

/// Coarse, permissive name comparison: exact, substring either way, or a
/// "the " prefix away. Not a distance metric.
pub fn compare_names(a: &str, b: &str) -> bool {
    names_match(&normalize_search_string(a), &normalize_search_string(b))
}

/// Album-intent check over an already-normalized query.
pub fn is_album_query(query_norm: &str) -> bool {
    ALBUM_INDICATORS.iter().any(|&ind| query_norm.contains(ind))
        || KNOWN_ALBUMS.contains(query_norm)
}

/// True when the query looks like it names a release rather than an artist.
pub fn is_likely_album_search(query: &str) -> bool {
    is_album_query(&normalize_search_string(query))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_article_stripping() {
        assert_eq!(
            normalize_search_string("The Beatles"),
            normalize_search_string("Beatles")
        );
        assert_eq!(normalize_search_string("A Tribe Called Quest"), "tribe called quest");
        assert_eq!(normalize_search_string("An Horse"), "horse");
        // Only one article goes
        assert_eq!(normalize_search_string("The The"), "the");
        // Bare article has nothing after it to strip towards
        assert_eq!(normalize_search_string("A"), "a");
    }

    #[test]
    fn test_normalize_brackets_and_punctuation() {
        assert_eq!(normalize_search_string("Abbey Road (Remastered 2009)"), "abbey road");
        assert_eq!(normalize_search_string("Help! [Live]"), "help");
        assert_eq!(
            normalize_search_string("Sgt. Pepper's Lonely Hearts Club Band"),
            "sgt peppers lonely hearts club band"
        );
        assert_eq!(normalize_search_string("Simon & Garfunkel"), "simon garfunkel");
        assert_eq!(normalize_search_string("  AC/DC  "), "acdc");
        assert_eq!(normalize_search_string("Song (Live"), "song live");
    }

    #[test]
    fn test_article_stripped_before_other_removals() {
        // Punctuation right after the article means it is not a leading article
        assert_eq!(normalize_search_string("A: Night"), "a night");
        // An article uncovered by dropping a bracketed prefix stays
        assert_eq!(normalize_search_string("(Live) The Beatles"), "the beatles");
        assert_eq!(normalize_search_string("  The Wall (Remastered)"), "wall");
    }

    #[test]
    fn test_compare_names() {
        assert!(compare_names("Led Zeppelin", "led zeppelin iv"));
        assert!(compare_names("The Beatles", "Beatles"));
        assert!(compare_names("Radiohead", "RADIOHEAD"));
        assert!(!compare_names("Radiohead", "Portishead"));
        assert!(!compare_names("()", "Radiohead"));
    }

    #[test]
    fn test_names_match_the_prefix() {
        assert!(names_match("the the", "the"));
        assert!(names_match("wall", "the wall"));
        assert!(!names_match("", "wall"));
        assert!(names_match("", ""));
    }

    #[test]
    fn test_album_intent() {
        assert!(is_likely_album_search("Abbey Road"));
        assert!(is_likely_album_search("The Dark Side of the Moon"));
        assert!(is_likely_album_search("greatest hits vol 2"));
        assert!(is_likely_album_search("Rumours (Deluxe)"));
        assert!(is_likely_album_search("some soundtrack"));
        assert!(!is_likely_album_search("Radiohead"));
        assert!(!is_likely_album_search("Taylor Swift"));
    }
}
