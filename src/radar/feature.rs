//! The fixed, ordered feature set that defines the chart's axes.
//!
//! Order matters: a feature's position in `FEATURES` decides its axis angle.

use serde::Serialize;

use crate::models::FeatureVector;

// ============================================================================
// Reference Constants
// ============================================================================

/// Duration that maps to 1.0. Longer tracks go past the outer ring.
pub const DURATION_REFERENCE_MS: f64 = 360_000.0;

/// Loudness window: -60 dB maps to 0.0, 0 dB to 1.0. Not clamped.
pub const LOUDNESS_FLOOR_DB: f64 = -60.0;
pub const LOUDNESS_SPAN_DB: f64 = 60.0;

/// Tempo window: 40-200 BPM, clamped.
pub const TEMPO_MIN_BPM: f64 = 40.0;
pub const TEMPO_SPAN_BPM: f64 = 160.0;

// ============================================================================
// Feature Set
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Danceability,
    Energy,
    Valence,
    Acousticness,
    Instrumentalness,
    Liveness,
    Loudness,
    Tempo,
    Duration,
}

/// Axis order, starting at the top and going clockwise.
pub const FEATURES: [Feature; 9] = [
    Feature::Danceability,
    Feature::Energy,
    Feature::Valence,
    Feature::Acousticness,
    Feature::Instrumentalness,
    Feature::Liveness,
    Feature::Loudness,
    Feature::Tempo,
    Feature::Duration,
];

pub const FEATURE_COUNT: usize = FEATURES.len();

/// One normalized value per axis, in `FEATURES` order.
pub type FeatureValues = [f64; FEATURE_COUNT];

pub fn normalize_duration(duration_ms: f64) -> f64 {
    duration_ms / DURATION_REFERENCE_MS
}

pub fn normalize_loudness(loudness_db: f64) -> f64 {
    (loudness_db - LOUDNESS_FLOOR_DB) / LOUDNESS_SPAN_DB
}

pub fn normalize_tempo(bpm: f64) -> f64 {
    ((bpm - TEMPO_MIN_BPM) / TEMPO_SPAN_BPM).clamp(0.0, 1.0)
}

impl Feature {
    /// Machine name, used for JSON keys and CSS classes.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Danceability => "danceability",
            Feature::Energy => "energy",
            Feature::Valence => "valence",
            Feature::Acousticness => "acousticness",
            Feature::Instrumentalness => "instrumentalness",
            Feature::Liveness => "liveness",
            Feature::Loudness => "loudness",
            Feature::Tempo => "tempo",
            Feature::Duration => "duration",
        }
    }

    /// Axis label.
    pub fn label(self) -> &'static str {
        match self {
            Feature::Danceability => "Danceability",
            Feature::Energy => "Energy",
            Feature::Valence => "Valence",
            Feature::Acousticness => "Acousticness",
            Feature::Instrumentalness => "Instrumentalness",
            Feature::Liveness => "Liveness",
            Feature::Loudness => "Loudness",
            Feature::Tempo => "Tempo",
            Feature::Duration => "Duration",
        }
    }

    /// Raw value in the feature's natural unit.
    pub fn raw(self, v: &FeatureVector) -> f64 {
        match self {
            Feature::Danceability => v.danceability,
            Feature::Energy => v.energy,
            Feature::Valence => v.valence,
            Feature::Acousticness => v.acousticness,
            Feature::Instrumentalness => v.instrumentalness,
            Feature::Liveness => v.liveness,
            Feature::Loudness => v.loudness_db,
            Feature::Tempo => v.tempo_bpm,
            Feature::Duration => v.duration_ms,
        }
    }

    /// Map a raw value onto the chart scale. Total over all inputs; only
    /// tempo is clamped.
    pub fn normalize_raw(self, raw: f64) -> f64 {
        match self {
            Feature::Loudness => normalize_loudness(raw),
            Feature::Tempo => normalize_tempo(raw),
            Feature::Duration => normalize_duration(raw),
            // Already 0..1 at the source
            _ => raw,
        }
    }

    pub fn normalize(self, v: &FeatureVector) -> f64 {
        self.normalize_raw(self.raw(v))
    }

    /// Human-readable raw value.
    pub fn format(self, raw: f64) -> String {
        match self {
            Feature::Loudness => format!("{:.1} dB", raw),
            Feature::Tempo => format!("{:.0} BPM", raw),
            Feature::Duration => {
                let secs = (raw / 1000.0).round().max(0.0) as u64;
                format!("{}:{:02}", secs / 60, secs % 60)
            }
            _ => format!("{:.0}%", raw * 100.0),
        }
    }
}

/// All normalized values of one vector, in axis order.
pub fn normalized_values(v: &FeatureVector) -> FeatureValues {
    FEATURES.map(|f| f.normalize(v))
}
