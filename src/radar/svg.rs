//! Standalone SVG rendering of one or two collections.
//!
//! Per-track opacity is set per side in an embedded stylesheet; hover state is
//! a `:hover` rule so the document needs no script.

use std::fmt::Write;

use super::feature::FEATURES;
use super::geometry::{Curve, RadarGeometry};
use super::style::{average_style, track_style, Side, TrackStyle};
use crate::models::{Collection, FeatureVector};

/// Grid levels drawn as rings.
const RING_LEVELS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];

/// Extra room around the outer ring for labels and the legend.
const LABEL_OFFSET: f64 = 1.12;
const MARGIN: f64 = 120.0;
const LEGEND_LINE: f64 = 18.0;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn style_rule(selector: &str, style: &TrackStyle) -> String {
    format!(
        "{} {{ stroke: {c}; fill: {c}; fill-opacity: {:.4}; stroke-opacity: {:.4}; \
         stroke-width: {}; }}\n",
        selector,
        style.fill_opacity,
        style.stroke_opacity,
        style.stroke_width,
        c = style.color,
    )
}

/// Tooltip text: track name followed by each raw value.
fn track_title(track: &FeatureVector) -> String {
    let mut title = track.name.clone();
    for feature in FEATURES {
        let _ = write!(
            title,
            "\n{}: {}",
            feature.label(),
            feature.format(feature.raw(track))
        );
    }
    escape_xml(&title)
}

/// Render a complete SVG document. Sides with empty collections get a legend
/// entry and nothing else.
pub fn render_chart(
    sides: &[(Side, &Collection)],
    geometry: &RadarGeometry,
    curve: Curve,
) -> String {
    let half = geometry.radius + MARGIN;
    let size = half * 2.0;
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        r#"<svg xmlns="{}" viewBox="{:.0} {:.0} {:.0} {:.0}" width="{:.0}" height="{:.0}">"#,
        SVG_NS,
        -half,
        -half,
        size,
        size,
        size,
        size
    );

    // ========================================================================
    // Stylesheet
    // ========================================================================
    svg.push_str("<style>\n");
    svg.push_str(".grid { fill: none; stroke: #c8c8c8; stroke-width: 1; }\n");
    svg.push_str(".axis-label { font: 12px sans-serif; fill: #555; }\n");
    svg.push_str(".legend { font: 13px sans-serif; }\n");
    for (side, collection) in sides {
        let class = format!(".track-{}", side.as_str());
        svg.push_str(&style_rule(&class, &track_style(*side, collection.len(), false)));
        svg.push_str(&style_rule(
            &format!("{}:hover", class),
            &track_style(*side, collection.len(), true),
        ));
        svg.push_str(&style_rule(
            &format!(".average-{}", side.as_str()),
            &average_style(*side),
        ));
    }
    svg.push_str(".average { fill: none; pointer-events: none; }\n");
    svg.push_str("</style>\n");

    // ========================================================================
    // Grid
    // ========================================================================
    svg.push_str("<g class=\"grid\">\n");
    for level in RING_LEVELS {
        let _ = writeln!(svg, r#"<path d="{}"/>"#, geometry.ring(level).to_svg_path(Curve::Linear));
    }
    for feature in FEATURES {
        let end = geometry.axis_end(feature);
        let _ = writeln!(svg, r#"<line x1="0" y1="0" x2="{:.2}" y2="{:.2}"/>"#, end.x, end.y);
    }
    svg.push_str("</g>\n");

    for feature in FEATURES {
        let end = geometry.axis_end(feature);
        let anchor = if end.x.abs() < 1.0 {
            "middle"
        } else if end.x > 0.0 {
            "start"
        } else {
            "end"
        };
        let _ = writeln!(
            svg,
            concat!(
                r#"<text class="axis-label" x="{:.2}" y="{:.2}" text-anchor="{}" "#,
                r#"dominant-baseline="middle">{}</text>"#
            ),
            end.x * LABEL_OFFSET,
            end.y * LABEL_OFFSET,
            anchor,
            feature.label()
        );
    }

    // ========================================================================
    // Tracks and averages
    // ========================================================================
    for (side, collection) in sides {
        let _ = writeln!(svg, r#"<g class="collection-{}">"#, side.as_str());
        for track in collection.tracks() {
            let _ = writeln!(
                svg,
                r#"<path class="track track-{}" d="{}"><title>{}</title></path>"#,
                side.as_str(),
                geometry.project(track).to_svg_path(curve),
                track_title(track)
            );
        }
        if let Some(avg) = geometry.average_path(collection) {
            let _ = writeln!(
                svg,
                r#"<path class="average average-{}" d="{}"/>"#,
                side.as_str(),
                avg.to_svg_path(curve)
            );
        }
        svg.push_str("</g>\n");
    }

    // ========================================================================
    // Legend
    // ========================================================================
    let legend_y = -half + LEGEND_LINE;
    for (i, (side, collection)) in sides.iter().enumerate() {
        let y = legend_y + i as f64 * LEGEND_LINE;
        let count = match collection.len() {
            0 => "no tracks".to_string(),
            1 => "1 track".to_string(),
            n => format!("{} tracks", n),
        };
        let _ = writeln!(
            svg,
            r#"<text class="legend" x="{:.0}" y="{:.0}" fill="{}">{} ({})</text>"#,
            -half + 10.0,
            y,
            side.color(),
            escape_xml(&collection.label),
            count
        );
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_vector;

    fn geometry() -> RadarGeometry {
        RadarGeometry::new(200.0)
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Tom & Jerry <live>"), "Tom &amp; Jerry &lt;live&gt;");
        assert_eq!(escape_xml(r#"a "b" 'c'"#), "a &quot;b&quot; &apos;c&apos;");
    }

    #[test]
    fn test_empty_collection_renders_nothing() {
        let empty = Collection::new("Nothing", vec![]);
        let svg = render_chart(&[(Side::Left, &empty)], &geometry(), Curve::Linear);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(!svg.contains("class=\"track "));
        assert!(!svg.contains("class=\"average "));
        assert!(svg.contains("Nothing (no tracks)"));
    }

    #[test]
    fn test_one_path_per_track_plus_average() {
        let left = Collection::new(
            "Left",
            vec![test_vector("a", 100.0), test_vector("b", 140.0)],
        );
        let right = Collection::new("Right", vec![test_vector("c", 90.0)]);
        let svg = render_chart(
            &[(Side::Left, &left), (Side::Right, &right)],
            &geometry(),
            Curve::Smooth,
        );
        assert_eq!(svg.matches("class=\"track track-left\"").count(), 2);
        assert_eq!(svg.matches("class=\"track track-right\"").count(), 1);
        assert_eq!(svg.matches("class=\"average average-").count(), 2);
        assert!(svg.contains(".track-left:hover"));
        assert!(svg.contains("Left (2 tracks)"));
        assert!(svg.contains("Right (1 track)"));
    }

    #[test]
    fn test_labels_and_titles_escaped() {
        let mut v = test_vector("a", 120.0);
        v.name = "Rock & Roll".to_string();
        let c = Collection::new("<Live>", vec![v]);
        let svg = render_chart(&[(Side::Left, &c)], &geometry(), Curve::Linear);
        assert!(svg.contains("<title>Rock &amp; Roll\nDanceability: 50%"));
        assert!(svg.contains("&lt;Live&gt; (1 track)"));
        assert!(!svg.contains("<Live>"));
    }

    #[test]
    fn test_axis_labels_present() {
        let c = Collection::new("x", vec![test_vector("a", 120.0)]);
        let svg = render_chart(&[(Side::Left, &c)], &geometry(), Curve::Linear);
        for feature in FEATURES {
            assert!(svg.contains(&format!(">{}</text>", feature.label())));
        }
    }
}
