//! Catalogue API boundary.
//!
//! `CatalogApi` is the seam between the pure ranking/radar code and the remote
//! service. `SpotifyClient` is the production implementation; tests use an
//! in-memory fake.

pub mod client;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::models::{EntityKind, FeatureVector, ImageRef, SearchCandidate};

pub use client::{ClientConfig, SpotifyClient};

/// Maximum number of ids per feature lookup.
pub const FEATURE_BATCH_SIZE: usize = 100;

/// Maximum page size the API accepts for searches and listings.
pub const MAX_PAGE_LIMIT: u32 = 50;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Search for the given entity types. `kinds` may be artist-only or artist+album.
    async fn search(
        &self,
        query: &str,
        kinds: &[EntityKind],
        market: Option<&str>,
        limit: u32,
    ) -> ApiResult<SearchResponse>;

    async fn artist(&self, id: &str) -> ApiResult<ArtistObject>;

    async fn album(&self, id: &str) -> ApiResult<AlbumObject>;

    /// One page of an artist's albums. `cursor` is the previous page's `next` link.
    async fn artist_albums(&self, artist_id: &str, cursor: Option<&str>)
        -> ApiResult<Paging<AlbumObject>>;

    /// One page of an album's tracks. `cursor` is the previous page's `next` link.
    async fn album_tracks(&self, album_id: &str, cursor: Option<&str>)
        -> ApiResult<Paging<TrackObject>>;

    /// Features for up to `FEATURE_BATCH_SIZE` ids, positionally aligned with `ids`.
    /// Unknown tracks come back as `None` in their slot.
    async fn audio_features(&self, ids: &[String]) -> ApiResult<Vec<Option<AudioFeaturesObject>>>;
}

// ============================================================================
// Response Models
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: u32,
}

impl<T> Paging<T> {
    pub fn single(items: Vec<T>) -> Self {
        let total = items.len() as u32;
        Self {
            items,
            next: None,
            total,
        }
    }
}

/// Search results; entries can be `null` in the wire format.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub artists: Option<Paging<Option<ArtistObject>>>,
    #[serde(default)]
    pub albums: Option<Paging<Option<AlbumObject>>>,
}

impl SearchResponse {
    /// Artists first, then albums, each in the order the API returned them.
    pub fn into_candidates(self) -> Vec<SearchCandidate> {
        let artists = self
            .artists
            .map(|p| p.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(SearchCandidate::from);
        let albums = self
            .albums
            .map(|p| p.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(SearchCandidate::from);
        artists.chain(albums).collect()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImageObject {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Followers {
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ArtistObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub followers: Option<Followers>,
    #[serde(default)]
    pub images: Vec<ImageObject>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SimplifiedArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AlbumObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub images: Vec<ImageObject>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TrackObject {
    /// `None` for local files, which can't have features
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AudioFeaturesObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub danceability: f64,
    #[serde(default)]
    pub energy: f64,
    #[serde(default)]
    pub valence: f64,
    #[serde(default)]
    pub acousticness: f64,
    #[serde(default)]
    pub instrumentalness: f64,
    #[serde(default)]
    pub liveness: f64,
    #[serde(default)]
    pub loudness: f64,
    #[serde(default)]
    pub tempo: f64,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Deserialize)]
pub(crate) struct AudioFeaturesResponse {
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeaturesObject>>,
}

// ============================================================================
// Conversions
// ============================================================================

fn image_refs(images: Vec<ImageObject>) -> Vec<ImageRef> {
    images
        .into_iter()
        .map(|i| ImageRef {
            url: i.url,
            width: i.width,
            height: i.height,
        })
        .collect()
}

impl From<ArtistObject> for SearchCandidate {
    fn from(a: ArtistObject) -> Self {
        let followers = a.followers.and_then(|f| f.total);
        SearchCandidate::artist(a.id, a.name, a.popularity, followers)
            .with_images(image_refs(a.images))
    }
}

impl From<AlbumObject> for SearchCandidate {
    fn from(a: AlbumObject) -> Self {
        let artists = a.artists.into_iter().map(|ar| ar.name).collect();
        SearchCandidate::album(a.id, a.name, a.popularity, artists)
            .with_images(image_refs(a.images))
    }
}

/// Merge catalogue track metadata with its feature record.
/// Duration prefers the catalogue value and falls back to the feature record.
pub fn merge_track_features(
    track_id: &str,
    track: &TrackObject,
    features: &AudioFeaturesObject,
) -> FeatureVector {
    let duration_ms = if track.duration_ms > 0 {
        track.duration_ms
    } else {
        features.duration_ms
    };
    FeatureVector {
        track_id: track_id.to_string(),
        name: track.name.clone(),
        danceability: features.danceability,
        energy: features.energy,
        valence: features.valence,
        acousticness: features.acousticness,
        instrumentalness: features.instrumentalness,
        liveness: features.liveness,
        loudness_db: features.loudness,
        tempo_bpm: features.tempo,
        duration_ms: duration_ms as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateKind, EntityKind};

    #[test]
    fn test_search_response_decoding() {
        let body = r#"{
            "artists": {"items": [
                {"id": "a1", "name": "Radiohead", "popularity": 80,
                 "followers": {"total": 1000}, "images": []},
                null
            ], "next": null, "total": 1},
            "albums": {"items": [
                {"id": "b1", "name": "OK Computer",
                 "artists": [{"id": "a1", "name": "Radiohead"}],
                 "images": [{"url": "http://img", "width": 64, "height": 64}]}
            ]}
        }"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        let candidates = resp.into_candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].entity_kind(), EntityKind::Artist);
        assert_eq!(
            candidates[0].kind(),
            &CandidateKind::Artist {
                followers: Some(1000)
            }
        );
        assert_eq!(candidates[1].entity_kind(), EntityKind::Album);
        assert_eq!(candidates[1].popularity, None);
        assert_eq!(candidates[1].credited_artists(), ["Radiohead".to_string()]);
        assert_eq!(candidates[1].images.len(), 1);
    }

    #[test]
    fn test_artist_only_search_response() {
        let body = r#"{"artists": {"items": [{"id": "a1", "name": "X"}]}}"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.into_candidates().len(), 1);
    }

    #[test]
    fn test_features_response_keeps_null_slots() {
        let body = r#"{"audio_features": [{"id": "t1", "tempo": 120.0}, null, {"id": "t3"}]}"#;
        let resp: AudioFeaturesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.audio_features.len(), 3);
        assert!(resp.audio_features[1].is_none());
    }

    #[test]
    fn test_merge_track_features_duration_fallback() {
        let track = TrackObject {
            id: Some("t1".into()),
            name: "Airbag".into(),
            duration_ms: 0,
        };
        let features = AudioFeaturesObject {
            tempo: 120.0,
            loudness: -7.5,
            duration_ms: 284_000,
            ..Default::default()
        };
        let v = merge_track_features("t1", &track, &features);
        assert_eq!(v.duration_ms, 284_000.0);
        assert_eq!(v.tempo_bpm, 120.0);
        assert_eq!(v.loudness_db, -7.5);
        assert_eq!(v.name, "Airbag");
    }
}
