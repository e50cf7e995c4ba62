//! Relevance scoring for mixed artist/album search results.
//!
//! Every candidate is scored on its own from a few named sub-scores, then the
//! merged list is sorted best-first. The sort is stable so candidates with equal
//! scores keep the order the catalogue returned them in.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::models::{CandidateKind, SearchCandidate};
use crate::normalize::{is_album_query, names_match, normalize_search_string};

// ============================================================================
// Score Constants
// ============================================================================

/// Name fuzzy-matches the query
pub const EXACT_MATCH_SCORE: f64 = 10_000.0;

/// One normalized name starts with the other
pub const PREFIX_MATCH_SCORE: f64 = 8_000.0;

/// One normalized name contains the other
pub const SUBSTRING_MATCH_SCORE: f64 = 6_000.0;

/// Flat boost when a credited artist is in `MAJOR_ARTISTS`
pub const MAJOR_ARTIST_BOOST: f64 = 5_000.0;

/// Floor for albums whose credited artist matches the query
pub const ARTIST_CREDIT_SCORE: f64 = 7_000.0;

/// Upper bound on the log-follower bonus
pub const FOLLOWER_BONUS_CAP: f64 = 3_000.0;

/// Ceiling for artists that don't match an album-looking query
pub const ALBUM_SEARCH_ARTIST_CAP: f64 = 1_000.0;

// Popularity weights per branch
pub const ALBUM_INTENT_POPULARITY_WEIGHT: f64 = 100.0;
pub const MATCH_POPULARITY_WEIGHT: f64 = 50.0;
pub const ALBUM_FALLBACK_POPULARITY_WEIGHT: f64 = 30.0;
pub const ARTIST_FALLBACK_POPULARITY_WEIGHT: f64 = 10.0;

/// Acts popular enough that their releases get a flat boost. Normalized form.
pub static MAJOR_ARTISTS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "beatles",
        "rolling stones",
        "led zeppelin",
        "pink floyd",
        "queen",
        "michael jackson",
        "taylor swift",
        "drake",
        "beyoncé",
        "kanye west",
        "kendrick lamar",
        "eminem",
    ]
    .into_iter()
    .collect()
});

// ============================================================================
// Query Context
// ============================================================================

/// A query normalized once and shared by every candidate's score.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub normalized: String,
    pub album_intent: bool,
}

impl QueryContext {
    pub fn new(query: &str) -> Self {
        let normalized = normalize_search_string(query);
        let album_intent = is_album_query(&normalized);
        Self {
            normalized,
            album_intent,
        }
    }
}

// ============================================================================
// Sub-scores
// ============================================================================

/// Text match tier between a candidate name and the query.
pub fn base_text_score(name: &str, ctx: &QueryContext) -> f64 {
    let name_norm = normalize_search_string(name);
    let query_norm = ctx.normalized.as_str();
    if name_norm.is_empty() || query_norm.is_empty() {
        return 0.0;
    }

    if names_match(&name_norm, query_norm) {
        EXACT_MATCH_SCORE
    } else if name_norm.starts_with(query_norm) || query_norm.starts_with(&name_norm) {
        PREFIX_MATCH_SCORE
    } else if name_norm.contains(query_norm) || query_norm.contains(&name_norm) {
        SUBSTRING_MATCH_SCORE
    } else {
        0.0
    }
}

pub fn popularity_bonus(popularity: u32, weight: f64) -> f64 {
    f64::from(popularity) * weight
}

/// `ln(followers) * 100`, capped. Missing or zero followers count as 1.
pub fn follower_bonus(followers: Option<u64>) -> f64 {
    let followers = followers.unwrap_or(1).max(1) as f64;
    (followers.ln() * 100.0).min(FOLLOWER_BONUS_CAP)
}

/// `MAJOR_ARTIST_BOOST` if any of the names is a major artist.
pub fn major_artist_bonus<'a>(names: impl IntoIterator<Item = &'a str>) -> f64 {
    let is_major = names
        .into_iter()
        .any(|n| MAJOR_ARTISTS.contains(normalize_search_string(n).as_str()));
    if is_major {
        MAJOR_ARTIST_BOOST
    } else {
        0.0
    }
}

// ============================================================================
// Combined Scoring
// ============================================================================

/// Which formula produced a score. Scores are only comparable by popularity
/// within one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBranch {
    /// Album, album-looking query, album name matched
    AlbumTitle,
    /// Album whose credited artist matched the query
    AlbumArtistCredit,
    /// Album with no stronger signal
    AlbumFallback,
    /// Artist whose name matched the query
    ArtistName,
    /// Artist, no name match, query looks like an artist search
    ArtistFallback,
    /// Artist, no name match, query looks like an album search
    ArtistSuppressed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub branch: ScoreBranch,
}

fn score_album(
    candidate: &SearchCandidate,
    artists: &[String],
    ctx: &QueryContext,
) -> ScoreBreakdown {
    let name_score = base_text_score(&candidate.name, ctx);
    let artist_match = artists
        .iter()
        .any(|a| names_match(&normalize_search_string(a), &ctx.normalized));
    let major_boost = major_artist_bonus(artists.iter().map(String::as_str));
    let popularity = candidate.popularity_or_default();

    if ctx.album_intent && name_score > 0.0 {
        ScoreBreakdown {
            score: name_score * 2.0
                + popularity_bonus(popularity, ALBUM_INTENT_POPULARITY_WEIGHT)
                + major_boost,
            branch: ScoreBranch::AlbumTitle,
        }
    } else if artist_match {
        ScoreBreakdown {
            score: ARTIST_CREDIT_SCORE
                + popularity_bonus(popularity, MATCH_POPULARITY_WEIGHT)
                + major_boost,
            branch: ScoreBranch::AlbumArtistCredit,
        }
    } else {
        ScoreBreakdown {
            score: name_score
                + popularity_bonus(popularity, ALBUM_FALLBACK_POPULARITY_WEIGHT)
                + major_boost / 2.0,
            branch: ScoreBranch::AlbumFallback,
        }
    }
}

fn score_artist(
    candidate: &SearchCandidate,
    followers: Option<u64>,
    ctx: &QueryContext,
) -> ScoreBreakdown {
    let popularity = candidate.popularity_or_default();
    let name_match = names_match(&normalize_search_string(&candidate.name), &ctx.normalized);

    if name_match {
        ScoreBreakdown {
            score: popularity_bonus(popularity, MATCH_POPULARITY_WEIGHT)
                + follower_bonus(followers)
                + major_artist_bonus([candidate.name.as_str()]),
            branch: ScoreBranch::ArtistName,
        }
    } else if !ctx.album_intent {
        ScoreBreakdown {
            score: popularity_bonus(popularity, ARTIST_FALLBACK_POPULARITY_WEIGHT),
            branch: ScoreBranch::ArtistFallback,
        }
    } else {
        // Artists carry no text score of their own, so the running total is 0
        let running = 0.0_f64;
        ScoreBreakdown {
            score: running.min(ALBUM_SEARCH_ARTIST_CAP),
            branch: ScoreBranch::ArtistSuppressed,
        }
    }
}

/// Score one candidate against a prepared query.
pub fn score_candidate(candidate: &SearchCandidate, ctx: &QueryContext) -> ScoreBreakdown {
    match candidate.kind() {
        CandidateKind::Album { artists } => score_album(candidate, artists, ctx),
        CandidateKind::Artist { followers } => score_artist(candidate, *followers, ctx),
    }
}

/// Score one candidate against a raw query string.
pub fn score(candidate: &SearchCandidate, query: &str) -> f64 {
    score_candidate(candidate, &QueryContext::new(query)).score
}

// ============================================================================
// Ranking
// ============================================================================

/// A candidate together with the score that placed it.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub candidate: SearchCandidate,
    pub score: f64,
    pub branch: ScoreBranch,
}

/// Score and sort candidates best-first. Equal scores keep input order.
pub fn rank_candidates(candidates: Vec<SearchCandidate>, query: &str) -> Vec<RankedCandidate> {
    let ctx = QueryContext::new(query);
    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let breakdown = score_candidate(&candidate, &ctx);
            RankedCandidate {
                candidate,
                score: breakdown.score,
                branch: breakdown.branch,
            }
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
