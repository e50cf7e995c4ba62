//! Size-aware render attributes.
//!
//! Each track's weight shrinks as its collection grows so that dense overlays
//! stay readable. Hover replaces the scaled values with fixed ones.

use serde::Serialize;

pub const OPACITY_EXPONENT: f64 = 0.55;
pub const OPACITY_FLOOR: f64 = 0.006;

const FILL_SCALE: f64 = 0.5;
const STROKE_SCALE: f64 = 0.9;

pub const HOVER_FILL_OPACITY: f64 = 0.7;
pub const HOVER_STROKE_OPACITY: f64 = 1.0;

const TRACK_STROKE_WIDTH: f64 = 1.0;
const HOVER_STROKE_WIDTH: f64 = 2.0;
const AVERAGE_STROKE_WIDTH: f64 = 3.0;

/// Which collection a shape belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn color(self) -> &'static str {
        match self {
            Side::Left => "#1db954",
            Side::Right => "#e8115b",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackStyle {
    pub color: &'static str,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
    pub stroke_width: f64,
}

/// `max(floor, 1 / n^exponent)`. An empty collection is treated as one track.
pub fn baseline_opacity(n: usize) -> f64 {
    let n = n.max(1) as f64;
    (1.0 / n.powf(OPACITY_EXPONENT)).max(OPACITY_FLOOR)
}

/// Style for one track of a collection of `n` tracks.
pub fn track_style(side: Side, n: usize, hovered: bool) -> TrackStyle {
    if hovered {
        return TrackStyle {
            color: side.color(),
            fill_opacity: HOVER_FILL_OPACITY,
            stroke_opacity: HOVER_STROKE_OPACITY,
            stroke_width: HOVER_STROKE_WIDTH,
        };
    }
    let base = baseline_opacity(n);
    TrackStyle {
        color: side.color(),
        fill_opacity: base * FILL_SCALE,
        stroke_opacity: base * STROKE_SCALE,
        stroke_width: TRACK_STROKE_WIDTH,
    }
}

/// Style for a collection's averaged shape.
pub fn average_style(side: Side) -> TrackStyle {
    TrackStyle {
        color: side.color(),
        fill_opacity: 0.0,
        stroke_opacity: 1.0,
        stroke_width: AVERAGE_STROKE_WIDTH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_track_full_baseline() {
        assert_eq!(baseline_opacity(1), 1.0);
        assert_eq!(baseline_opacity(0), 1.0);
    }

    #[test]
    fn test_opacity_non_increasing_with_size() {
        let mut prev = track_style(Side::Left, 1, false);
        for n in 2..2000 {
            let s = track_style(Side::Left, n, false);
            assert!(s.fill_opacity <= prev.fill_opacity, "fill rose at n={}", n);
            assert!(s.stroke_opacity <= prev.stroke_opacity, "stroke rose at n={}", n);
            prev = s;
        }
    }

    #[test]
    fn test_floor_for_huge_collections() {
        // 1 / n^0.55 drops below the floor somewhere past ten thousand tracks
        assert_eq!(baseline_opacity(1_000_000), OPACITY_FLOOR);
    }

    #[test]
    fn test_hover_overrides_size() {
        for n in [1, 10, 500] {
            let normal = track_style(Side::Right, n, false);
            let hover = track_style(Side::Right, n, true);
            assert!(hover.fill_opacity > normal.fill_opacity);
            assert!(hover.stroke_opacity > normal.stroke_opacity);
            assert_eq!(hover.fill_opacity, HOVER_FILL_OPACITY);
        }
    }

    #[test]
    fn test_average_style_uses_side_color() {
        let s = average_style(Side::Right);
        assert_eq!(s.color, Side::Right.color());
        assert_eq!(s.stroke_opacity, 1.0);
        assert!(s.stroke_width > track_style(Side::Right, 1, false).stroke_width);
    }
}
