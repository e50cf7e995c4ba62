//! Radial projection and collection averaging.
//!
//! Chart space is centred on the origin with y pointing down, as in SVG.
//! Axis 0 points straight up.

use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::Write;

use super::feature::{
    normalize_tempo, normalized_values, Feature, FeatureValues, FEATURES, FEATURE_COUNT,
};
use crate::models::{Collection, FeatureVector};

/// How far a smoothed segment's control point sits past the chord midpoint.
pub const SMOOTH_BULGE: f64 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    fn scale(self, k: f64) -> Point {
        Point {
            x: self.x * k,
            y: self.y * k,
        }
    }
}

/// Segment style between consecutive vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Curve {
    /// Straight lines
    #[default]
    Linear,
    /// Quadratic curves bowed outward through each vertex
    Smooth,
}

/// A closed shape through one vertex per axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarPath {
    vertices: Vec<Point>,
}

impl RadarPath {
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// SVG path data. Passes through every vertex in axis order and closes.
    pub fn to_svg_path(&self, curve: Curve) -> String {
        let mut d = String::new();
        let Some(first) = self.vertices.first() else {
            return d;
        };
        let _ = write!(d, "M{:.2},{:.2}", first.x, first.y);

        let n = self.vertices.len();
        for i in 0..n {
            let from = self.vertices[i];
            let to = self.vertices[(i + 1) % n];
            match curve {
                Curve::Linear => {
                    if i + 1 < n {
                        let _ = write!(d, " L{:.2},{:.2}", to.x, to.y);
                    }
                }
                Curve::Smooth => {
                    let control = from.midpoint(to).scale(SMOOTH_BULGE);
                    let _ = write!(
                        d,
                        " Q{:.2},{:.2} {:.2},{:.2}",
                        control.x, control.y, to.x, to.y
                    );
                }
            }
        }
        d.push_str(" Z");
        d
    }
}

/// Radius and axis layout for one rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarGeometry {
    pub radius: f64,
}

impl RadarGeometry {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Angle of axis `index`, before the quarter-turn that puts axis 0 on top.
    pub fn axis_angle(index: usize) -> f64 {
        index as f64 * (TAU / FEATURE_COUNT as f64)
    }

    /// Chart-space position of `value` on axis `index`.
    pub fn point(&self, index: usize, value: f64) -> Point {
        let r = value * self.radius;
        let theta = Self::axis_angle(index) - FRAC_PI_2;
        Point {
            x: r * theta.cos(),
            y: r * theta.sin(),
        }
    }

    /// Outer end of an axis line.
    pub fn axis_end(&self, feature: Feature) -> Point {
        let index = FEATURES.iter().position(|&f| f == feature).unwrap_or(0);
        self.point(index, 1.0)
    }

    pub fn project_values(&self, values: &FeatureValues) -> RadarPath {
        RadarPath {
            vertices: values
                .iter()
                .enumerate()
                .map(|(i, &v)| self.point(i, v))
                .collect(),
        }
    }

    pub fn project(&self, vector: &FeatureVector) -> RadarPath {
        self.project_values(&normalized_values(vector))
    }

    /// Grid ring at a fixed level on every axis.
    pub fn ring(&self, level: f64) -> RadarPath {
        self.project_values(&[level; FEATURE_COUNT])
    }

    /// Composite shape of a collection, or `None` when it is empty.
    pub fn average_path(&self, collection: &Collection) -> Option<RadarPath> {
        average_values(collection.tracks()).map(|v| self.project_values(&v))
    }
}

/// Per-axis average of a set of vectors.
///
/// Every feature averages normalized values, except tempo: its raw BPM values
/// are averaged first and the mean is normalized, since the clamped window
/// makes the two orders disagree.
pub fn average_values(tracks: &[FeatureVector]) -> Option<FeatureValues> {
    if tracks.is_empty() {
        return None;
    }
    let n = tracks.len() as f64;

    Some(FEATURES.map(|feature| match feature {
        Feature::Tempo => {
            let mean_bpm = tracks.iter().map(|t| t.tempo_bpm).sum::<f64>() / n;
            normalize_tempo(mean_bpm)
        }
        _ => tracks.iter().map(|t| feature.normalize(t)).sum::<f64>() / n,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_vector;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_axis_zero_points_up() {
        let g = RadarGeometry::new(100.0);
        let p = g.point(0, 1.0);
        assert!(p.x.abs() < EPS);
        assert!((p.y + 100.0).abs() < EPS);
    }

    #[test]
    fn test_vertex_count_is_fixed() {
        let g = RadarGeometry::new(50.0);
        let mut v = test_vector("a", 120.0);
        v.energy = -3.0;
        v.loudness_db = 20.0;
        v.duration_ms = 0.0;
        v.tempo_bpm = 1e9;
        assert_eq!(g.project(&v).vertices().len(), FEATURE_COUNT);
        assert_eq!(g.project(&test_vector("b", 0.0)).vertices().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_projection_uses_normalized_values() {
        let g = RadarGeometry::new(200.0);
        let v = test_vector("a", 120.0);
        let path = g.project(&v);
        // Tempo is axis 7 at normalized 0.5
        let tempo = path.vertices()[7];
        let expected = g.point(7, 0.5);
        assert!((tempo.x - expected.x).abs() < EPS);
        assert!((tempo.y - expected.y).abs() < EPS);
        assert!(((tempo.x.powi(2) + tempo.y.powi(2)).sqrt() - 100.0).abs() < EPS);
    }

    #[test]
    fn test_average_of_empty_is_none() {
        let g = RadarGeometry::new(100.0);
        assert!(average_values(&[]).is_none());
        assert!(g.average_path(&Collection::new("empty", vec![])).is_none());
    }

    #[test]
    fn test_single_track_average_equals_projection() {
        let g = RadarGeometry::new(100.0);
        let mut v = test_vector("a", 250.0);
        v.loudness_db = -61.3;
        v.duration_ms = 401_234.0;
        let c = Collection::new("one", vec![v.clone()]);
        assert_eq!(g.average_path(&c), Some(g.project(&v)));
    }

    #[test]
    fn test_tempo_averaged_raw_then_normalized() {
        let avg = average_values(&[test_vector("a", 100.0), test_vector("b", 140.0)]).unwrap();
        assert_eq!(avg[7], normalize_tempo(120.0));

        // Straddling the clamp makes the two orders disagree
        let avg = average_values(&[test_vector("a", 30.0), test_vector("b", 170.0)]).unwrap();
        let raw_then_norm = normalize_tempo(100.0);
        let norm_then_avg = (normalize_tempo(30.0) + normalize_tempo(170.0)) / 2.0;
        assert!((raw_then_norm - norm_then_avg).abs() > 0.01);
        assert_eq!(avg[7], raw_then_norm);
    }

    #[test]
    fn test_other_features_average_normalized() {
        let mut a = test_vector("a", 120.0);
        let mut b = test_vector("b", 120.0);
        a.loudness_db = -60.0;
        b.loudness_db = 0.0;
        a.energy = 0.2;
        b.energy = 0.6;
        let avg = average_values(&[a, b]).unwrap();
        assert!((avg[6] - 0.5).abs() < EPS);
        assert!((avg[1] - 0.4).abs() < EPS);
    }

    #[test]
    fn test_svg_path_linear() {
        let g = RadarGeometry::new(10.0);
        let d = g.ring(1.0).to_svg_path(Curve::Linear);
        assert!(d.starts_with("M0.00,-10.00"));
        assert_eq!(d.matches(" L").count(), FEATURE_COUNT - 1);
        assert!(d.ends_with(" Z"));
    }

    #[test]
    fn test_svg_path_smooth_hits_vertices() {
        let g = RadarGeometry::new(10.0);
        let path = g.ring(1.0);
        let d = path.to_svg_path(Curve::Smooth);
        assert_eq!(d.matches(" Q").count(), FEATURE_COUNT);
        for p in path.vertices() {
            assert!(d.contains(&format!("{:.2},{:.2}", p.x, p.y)));
        }
        assert!(d.ends_with(" Z"));
    }
}
