//! Core data models shared by the search and radar pipelines.
//!
//! Search candidates come straight out of a catalogue search response and are
//! only ever re-sorted. Feature vectors are built once per track and grouped
//! into collections that are replaced wholesale on every new selection.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;

// ============================================================================
// Search Models
// ============================================================================

/// The two entity types a search can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Album,
}

impl EntityKind {
    /// Type name as the catalogue API spells it in `type=` query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image reference attached to an artist or album.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageRef {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Kind-specific data. Followers only exist on artists, credited artists only on albums.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CandidateKind {
    Artist { followers: Option<u64> },
    Album { artists: Vec<String> },
}

/// A search hit, either an artist or an album.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchCandidate {
    pub id: String,
    pub name: String,
    pub popularity: Option<u32>, // 0-100 when present
    pub images: Vec<ImageRef>,
    #[serde(flatten)]
    kind: CandidateKind,
}

impl SearchCandidate {
    pub fn artist(
        id: impl Into<String>,
        name: impl Into<String>,
        popularity: Option<u32>,
        followers: Option<u64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            popularity,
            images: Vec::new(),
            kind: CandidateKind::Artist { followers },
        }
    }

    pub fn album(
        id: impl Into<String>,
        name: impl Into<String>,
        popularity: Option<u32>,
        artists: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            popularity,
            images: Vec::new(),
            kind: CandidateKind::Album { artists },
        }
    }

    pub fn with_images(mut self, images: Vec<ImageRef>) -> Self {
        self.images = images;
        self
    }

    /// Kind data is read-only once the candidate exists.
    pub fn kind(&self) -> &CandidateKind {
        &self.kind
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self.kind {
            CandidateKind::Artist { .. } => EntityKind::Artist,
            CandidateKind::Album { .. } => EntityKind::Album,
        }
    }

    /// Popularity with the missing-value default of 0.
    pub fn popularity_or_default(&self) -> u32 {
        self.popularity.unwrap_or(0)
    }

    /// Credited artist names, empty for artist candidates.
    pub fn credited_artists(&self) -> &[String] {
        match &self.kind {
            CandidateKind::Album { artists } => artists.as_slice(),
            CandidateKind::Artist { .. } => &[],
        }
    }

    /// Smallest image, used for compact listings. `None` means no placeholder.
    pub fn thumbnail(&self) -> Option<&ImageRef> {
        self.images
            .iter()
            .min_by_key(|i| i.width.unwrap_or(u32::MAX))
    }
}

// ============================================================================
// Feature Models
// ============================================================================

/// One track's raw audio profile. Values are kept in their natural units;
/// normalization happens per feature in `radar::feature`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureVector {
    pub track_id: String,
    pub name: String,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness_db: f64,
    pub tempo_bpm: f64,
    pub duration_ms: f64,
}

/// Ordered, deduplicated group of tracks with a display label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Collection {
    pub label: String,
    tracks: Vec<FeatureVector>,
}

impl Collection {
    /// Builds a collection, dropping repeated track ids (first occurrence wins).
    pub fn new(label: impl Into<String>, tracks: Vec<FeatureVector>) -> Self {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let tracks = tracks
            .into_iter()
            .filter(|t| seen.insert(t.track_id.clone()))
            .collect();
        Self {
            label: label.into(),
            tracks,
        }
    }

    pub fn tracks(&self) -> &[FeatureVector] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_vector(id: &str, tempo_bpm: f64) -> FeatureVector {
    FeatureVector {
        track_id: id.to_string(),
        name: format!("Track {}", id),
        danceability: 0.5,
        energy: 0.7,
        valence: 0.3,
        acousticness: 0.1,
        instrumentalness: 0.0,
        liveness: 0.2,
        loudness_db: -6.0,
        tempo_bpm,
        duration_ms: 180_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_dedup_keeps_first() {
        let mut dup = test_vector("a", 90.0);
        dup.name = "Duplicate".to_string();
        let c = Collection::new("x", vec![test_vector("a", 120.0), test_vector("b", 100.0), dup]);
        assert_eq!(c.len(), 2);
        assert_eq!(c.tracks()[0].tempo_bpm, 120.0);
        assert_eq!(c.tracks()[1].track_id, "b");
    }

    #[test]
    fn test_candidate_kind_accessors() {
        let artist = SearchCandidate::artist("1", "Radiohead", None, Some(10));
        assert_eq!(artist.entity_kind(), EntityKind::Artist);
        assert_eq!(artist.popularity_or_default(), 0);
        assert!(artist.credited_artists().is_empty());

        let album = SearchCandidate::album("2", "OK Computer", Some(80), vec!["Radiohead".into()]);
        assert_eq!(album.entity_kind(), EntityKind::Album);
        assert_eq!(album.credited_artists(), ["Radiohead".to_string()]);
        assert!(album.thumbnail().is_none());
    }

    #[test]
    fn test_thumbnail_picks_smallest() {
        let album = SearchCandidate::album("2", "x", None, vec![]).with_images(vec![
            ImageRef { url: "big".into(), width: Some(640), height: Some(640) },
            ImageRef { url: "small".into(), width: Some(64), height: Some(64) },
        ]);
        assert_eq!(album.thumbnail().map(|i| i.url.as_str()), Some("small"));
    }
}
