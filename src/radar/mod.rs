//! Radar chart pipeline: normalize, project, average, style, render.

pub mod feature;
pub mod geometry;
pub mod style;
pub mod svg;

pub use feature::{Feature, FeatureValues, FEATURES, FEATURE_COUNT};
pub use geometry::{average_values, Curve, Point, RadarGeometry, RadarPath};
pub use style::{average_style, baseline_opacity, track_style, Side, TrackStyle};
pub use svg::render_chart;
