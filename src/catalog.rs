//! Search and bulk retrieval over a `CatalogApi`.
//!
//! Retrieval fans out one request per album and one per feature batch, at most
//! `MAX_CONCURRENT_REQUESTS` at a time, and joins the results positionally so
//! batch `i` of features lines up with batch `i` of tracks.

use anyhow::{anyhow, bail};
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use rustc_hash::FxHashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::api::{
    merge_track_features, AlbumObject, CatalogApi, TrackObject, FEATURE_BATCH_SIZE,
};
use crate::error::{ApiError, ApiResult};
use crate::models::{Collection, EntityKind, FeatureVector};
use crate::scoring::{rank_candidates, RankedCandidate};

/// Default number of results requested per entity type.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Upper bound on requests in flight during bulk retrieval.
pub const MAX_CONCURRENT_REQUESTS: usize = 8;

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub market: Option<String>,
    pub limit: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            market: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Search artists and albums and rank them best-first.
///
/// Blank input returns no results without touching the API. Transport and
/// auth failures come back as `Err`, never as an empty list.
pub async fn search<A: CatalogApi + ?Sized>(
    api: &A,
    query: &str,
    opts: &SearchOptions,
) -> ApiResult<Vec<RankedCandidate>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let response = api
        .search(
            query,
            &[EntityKind::Artist, EntityKind::Album],
            opts.market.as_deref(),
            opts.limit,
        )
        .await?;
    let candidates = response.into_candidates();
    debug!(query, candidates = candidates.len(), "search returned");
    Ok(rank_candidates(candidates, query))
}

// ============================================================================
// Selection
// ============================================================================

/// What the user picked: an artist's whole catalogue or a single album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Artist(String),
    Album(String),
}

impl Selection {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        match kind {
            EntityKind::Artist => Selection::Artist(id.into()),
            EntityKind::Album => Selection::Album(id.into()),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Artist(id) => write!(f, "artist:{}", id),
            Selection::Album(id) => write!(f, "album:{}", id),
        }
    }
}

impl FromStr for Selection {
    type Err = anyhow::Error;

    /// Accepts `artist:ID`, `album:ID`, or `spotify:artist:ID` style URIs.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        let s = s.strip_prefix("spotify:").unwrap_or(s);
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("expected artist:ID or album:ID, got '{}'", s))?;
        if id.is_empty() {
            bail!("missing id in '{}'", s);
        }
        match kind {
            "artist" => Ok(Selection::Artist(id.to_string())),
            "album" => Ok(Selection::Album(id.to_string())),
            other => bail!("unknown selection kind '{}'", other),
        }
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Every album of an artist, following `next` links until they run out.
pub async fn all_artist_albums<A: CatalogApi + ?Sized>(
    api: &A,
    artist_id: &str,
) -> ApiResult<Vec<AlbumObject>> {
    let mut albums = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = api.artist_albums(artist_id, cursor.as_deref()).await?;
        debug!(artist_id, items = page.items.len(), "album page");
        albums.extend(page.items);
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(albums)
}

/// Every track of an album, following `next` links until they run out.
pub async fn all_album_tracks<A: CatalogApi + ?Sized>(
    api: &A,
    album_id: &str,
) -> ApiResult<Vec<TrackObject>> {
    let mut tracks = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = api.album_tracks(album_id, cursor.as_deref()).await?;
        debug!(album_id, items = page.items.len(), "track page");
        tracks.extend(page.items);
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(tracks)
}

// ============================================================================
// Feature Retrieval
// ============================================================================

/// Look up features for the given tracks in batches and merge them in.
///
/// Tracks without an id, repeated ids, and tracks whose feature record is
/// `null` are dropped. Output order follows input order.
pub async fn fetch_features<A: CatalogApi + ?Sized>(
    api: &A,
    tracks: Vec<TrackObject>,
    pb: &ProgressBar,
) -> ApiResult<Vec<FeatureVector>> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let tracks: Vec<(String, TrackObject)> = tracks
        .into_iter()
        .filter_map(|t| t.id.clone().map(|id| (id, t)))
        .filter(|(id, _)| seen.insert(id.clone()))
        .collect();

    let ids: Vec<String> = tracks.iter().map(|(id, _)| id.clone()).collect();
    let batches: Vec<&[String]> = ids.chunks(FEATURE_BATCH_SIZE).collect();
    pb.set_length(batches.len() as u64);
    pb.set_position(0);

    // buffered() yields in input order, which keeps batches aligned
    let results: Vec<_> = stream::iter(batches.iter().map(|batch| async move {
        let features = api.audio_features(batch).await?;
        pb.inc(1);
        if features.len() != batch.len() {
            return Err(ApiError::BatchMismatch {
                expected: batch.len(),
                got: features.len(),
            });
        }
        Ok(features)
    }))
    .buffered(MAX_CONCURRENT_REQUESTS)
    .try_collect()
    .await?;

    let mut vectors = Vec::with_capacity(tracks.len());
    for ((id, track), features) in tracks.iter().zip(results.into_iter().flatten()) {
        match features {
            Some(f) => vectors.push(merge_track_features(id, track, &f)),
            None => warn!(track_id = %id, name = %track.name, "no audio features, skipping"),
        }
    }
    Ok(vectors)
}

/// Retrieve a whole selection as a labelled collection.
pub async fn fetch_collection<A: CatalogApi + ?Sized>(
    api: &A,
    selection: &Selection,
    pb: &ProgressBar,
) -> ApiResult<Collection> {
    let (label, tracks) = match selection {
        Selection::Artist(id) => {
            let artist = api.artist(id).await?;
            pb.set_message(format!("Listing albums for {}", artist.name));
            let albums = all_artist_albums(api, id).await?;

            pb.set_message(format!("Listing tracks on {} albums", albums.len()));
            let per_album: Vec<Vec<TrackObject>> =
                stream::iter(albums.iter().map(|a| all_album_tracks(api, &a.id)))
                    .buffered(MAX_CONCURRENT_REQUESTS)
                    .try_collect()
                    .await?;
            (artist.name, per_album.into_iter().flatten().collect::<Vec<_>>())
        }
        Selection::Album(id) => {
            let album = api.album(id).await?;
            pb.set_message(format!("Listing tracks on {}", album.name));
            let tracks = all_album_tracks(api, id).await?;
            (album.name, tracks)
        }
    };

    pb.set_message(format!("Fetching features for {} tracks", tracks.len()));
    let track_count = tracks.len();
    let vectors = fetch_features(api, tracks, pb).await?;
    let collection = Collection::new(label, vectors);
    info!(
        label = %collection.label,
        tracks = track_count,
        with_features = collection.len(),
        "collection retrieved"
    );
    Ok(collection)
}
