use std::collections::HashMap;
use std::ops::Range;

use lazy_static::lazy_static;
use plotters::style::RGBColor;

use crate::config::constants::BASE_RENDER_WIDTH;

/// Shared categorical palette for series that have no fixed color.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Muted line color for "every scenario" backdrops.
pub const SCENARIO_GRAY: RGBColor = RGBColor(158, 158, 158);

lazy_static! {
    /// Fixed colors for the scenario families so every chart agrees.
    pub static ref FAMILY_COLORS: HashMap<&'static str, RGBColor> = {
        let mut colors = HashMap::new();
        colors.insert("WEM", RGBColor(64, 64, 64));
        colors.insert("PAM1", PALETTE[0]);
        colors.insert("PAM2", PALETTE[1]);
        colors.insert("PAM3", PALETTE[2]);
        colors.insert("PAM4", PALETTE[3]);
        colors.insert("PAM4 Variant", PALETTE[4]);
        colors.insert("High Carbon", RGBColor(139, 69, 19));
        colors.insert("Low Carbon", PALETTE[9]);
        colors.insert("Other", SCENARIO_GRAY);
        colors
    };
}

pub fn family_color(family: &str) -> RGBColor {
    FAMILY_COLORS.get(family).copied().unwrap_or(SCENARIO_GRAY)
}

pub fn palette_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

pub fn growth_color(growth: &str) -> RGBColor {
    match growth {
        "Reference" => PALETTE[0],
        "Low" => PALETTE[2],
        "High" => PALETTE[3],
        _ => SCENARIO_GRAY,
    }
}

/// Pixel-size dependent style values, resolved once per render target so a
/// report-tier image is not a dev-tier image with stretched pixels.
#[derive(Debug, Clone)]
pub struct TierStyle {
    pub font_family: String,
    pub base_font_px: u32,
    pub scale: f64,
}

impl TierStyle {
    pub fn font_px(&self, base: u32) -> u32 {
        ((base as f64) * self.scale).round().max(1.0) as u32
    }

    pub fn title_font(&self) -> (&str, u32) {
        (&self.font_family, self.font_px(self.base_font_px + 8))
    }

    pub fn label_font(&self) -> (&str, u32) {
        (&self.font_family, self.font_px(self.base_font_px))
    }

    pub fn legend_font(&self) -> (&str, u32) {
        (&self.font_family, self.font_px(self.base_font_px.saturating_sub(1)))
    }

    pub fn stroke_width(&self) -> u32 {
        (2.0 * self.scale).round().max(1.0) as u32
    }

    pub fn thin_stroke(&self) -> u32 {
        self.scale.round().max(1.0) as u32
    }

    pub fn marker_size(&self) -> i32 {
        (5.0 * self.scale).round().max(2.0) as i32
    }

    pub fn margin(&self) -> i32 {
        (18.0 * self.scale).round() as i32
    }

    pub fn x_label_area(&self) -> i32 {
        (48.0 * self.scale).round() as i32
    }

    pub fn y_label_area(&self) -> i32 {
        (72.0 * self.scale).round() as i32
    }
}

/// Scale factor for a tier width against the 1200 px base.
pub fn tier_scale(width: u32) -> f64 {
    f64::from(width) / f64::from(BASE_RENDER_WIDTH)
}

/// Axis formatter for charts that put categories at integer positions on a
/// numeric axis. Off-integer key points come out blank.
pub fn index_label(labels: &[String]) -> impl Fn(&f64) -> String + '_ {
    move |x: &f64| {
        let idx = x.round();
        if idx < 0.0 || (x - idx).abs() > 0.3 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

/// Padded numeric ranges for a value-over-x chart. All-positive data keeps a
/// zero baseline; degenerate extents fall back to a unit range.
pub fn value_axis(x_lo: f64, x_hi: f64, y_lo: f64, y_hi: f64) -> (Range<f64>, Range<f64>) {
    let x_pad = ((x_hi - x_lo) * 0.02).max(0.5);
    let x_range = x_lo - x_pad..x_hi + x_pad;
    if !y_lo.is_finite() || !y_hi.is_finite() || y_hi < y_lo {
        return (x_range, 0.0..1.0);
    }
    let span = (y_hi - y_lo).max(y_hi.abs() * 0.1).max(1.0);
    let floor = if y_lo >= 0.0 { 0.0 } else { y_lo - span * 0.06 };
    (x_range, floor..y_hi + span * 0.06)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_tier_doubles_the_base() {
        assert_eq!(tier_scale(1200), 1.0);
        assert_eq!(tier_scale(2400), 2.0);
        let style = TierStyle {
            font_family: "sans-serif".to_string(),
            base_font_px: 14,
            scale: 2.0,
        };
        assert_eq!(style.label_font().1, 28);
        assert_eq!(style.stroke_width(), 4);
    }

    #[test]
    fn every_family_has_a_color() {
        for family in ["WEM", "PAM1", "PAM4 Variant", "High Carbon", "Other"] {
            assert!(FAMILY_COLORS.contains_key(family));
        }
        assert_eq!(family_color("never heard of it"), SCENARIO_GRAY);
    }

    #[test]
    fn index_labels_blank_between_categories() {
        let labels = vec!["WEM".to_string(), "PAM".to_string()];
        let fmt = index_label(&labels);
        assert_eq!(fmt(&0.0), "WEM");
        assert_eq!(fmt(&1.02), "PAM");
        assert_eq!(fmt(&0.5), "");
        assert_eq!(fmt(&5.0), "");
    }

    #[test]
    fn value_axis_keeps_zero_baseline_for_positive_data() {
        let (x, y) = value_axis(2025.0, 2050.0, 40.0, 120.0);
        assert!(x.start < 2025.0 && x.end > 2050.0);
        assert_eq!(y.start, 0.0);
        assert!(y.end > 120.0);
    }

    #[test]
    fn value_axis_survives_a_single_point() {
        let (x, y) = value_axis(2030.0, 2030.0, 55.0, 55.0);
        assert!(x.end > x.start);
        assert!(y.end > 55.0 && y.start < y.end);
    }
}
