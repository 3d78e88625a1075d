use anyhow::{Result, anyhow};
use plotters::style::RGBColor;

/// Sequential yellow → orange → red palette, 9 classes.
pub const YL_OR_RD_9: [&str; 9] = [
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026",
    "#800026",
];

/// Color of markers whose value is missing.
pub const MISSING_COLOR: RGBColor = RGBColor(128, 128, 128);

/// Linear color scale over an observed `[min, max]` range.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
    stops: Vec<RGBColor>,
}

impl ColorScale {
    pub fn linear(min: f64, max: f64, palette: &[&str]) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(anyhow!("Invalid color scale range [{}, {}]", min, max));
        }
        if palette.is_empty() {
            return Err(anyhow!("Color palette has no stops"));
        }
        let stops = palette.iter().map(|hex| hex_to_rgb(hex)).collect::<Result<Vec<_>>>()?;
        Ok(Self { min, max, stops })
    }

    pub fn yl_or_rd(min: f64, max: f64) -> Result<Self> {
        Self::linear(min, max, &YL_OR_RD_9)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn mid(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn stops(&self) -> &[RGBColor] {
        &self.stops
    }

    /// Interpolated color for `value`, clamped to the scale's range.
    /// A single-point range maps everything to the first stop.
    pub fn color_at(&self, value: f64) -> RGBColor {
        if self.stops.len() == 1 || self.max == self.min || value.is_nan() {
            return self.stops[0];
        }
        let t = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        let pos = t * (self.stops.len() - 1) as f64;
        let i = (pos.floor() as usize).min(self.stops.len() - 2);
        lerp(self.stops[i], self.stops[i + 1], pos - i as f64)
    }

    /// Color for an optional value; missing values are gray.
    pub fn color_for(&self, value: Option<f64>) -> RGBColor {
        value.map_or(MISSING_COLOR, |v| self.color_at(v))
    }
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let channel = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    RGBColor(channel(a.0, b.0), channel(a.1, b.1), channel(a.2, b.2))
}

pub fn hex_to_rgb(hex: &str) -> Result<RGBColor> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(anyhow!("Invalid hex color: '#{}'", hex));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|e| anyhow!("Invalid hex color '#{}': {}", hex, e))
    };
    Ok(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_map_to_first_and_last_stops() {
        let scale = ColorScale::yl_or_rd(100.0, 900.0).unwrap();
        assert_eq!(to_hex(scale.color_at(100.0)), "#ffffcc");
        assert_eq!(to_hex(scale.color_at(900.0)), "#800026");
        // Exactly on an interior stop: 100 + 800 * 4/8
        assert_eq!(to_hex(scale.color_at(500.0)), "#fd8d3c");
    }

    #[test]
    fn values_outside_range_are_clamped() {
        let scale = ColorScale::yl_or_rd(0.0, 1.0).unwrap();
        assert_eq!(scale.color_at(-5.0), scale.color_at(0.0));
        assert_eq!(scale.color_at(42.0), scale.color_at(1.0));
    }

    #[test]
    fn interpolates_between_neighbouring_stops() {
        let scale = ColorScale::linear(0.0, 1.0, &["#000000", "#ff8040"]).unwrap();
        assert_eq!(scale.color_at(0.5), RGBColor(128, 64, 32));
    }

    #[test]
    fn redness_increases_along_the_scale() {
        let scale = ColorScale::yl_or_rd(0.0, 80.0).unwrap();
        let greens: Vec<u8> = (0..=80).map(|v| scale.color_at(v as f64).1).collect();
        assert!(greens.windows(2).all(|w| w[0] >= w[1]));
        assert!(greens[0] > greens[80]);
    }

    #[test]
    fn degenerate_range_uses_one_color() {
        let scale = ColorScale::yl_or_rd(100.0, 100.0).unwrap();
        assert_eq!(scale.color_at(100.0), RGBColor(0xff, 0xff, 0xcc));
        assert_eq!(scale.color_at(3.0), scale.color_at(1e9));
    }

    #[test]
    fn missing_values_are_gray() {
        let scale = ColorScale::yl_or_rd(0.0, 10.0).unwrap();
        assert_eq!(scale.color_for(None), MISSING_COLOR);
        assert_eq!(to_hex(scale.color_for(None)), "#808080");
        assert_eq!(scale.color_for(Some(10.0)), scale.color_at(10.0));
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(ColorScale::yl_or_rd(f64::NAN, 1.0).is_err());
        assert!(ColorScale::yl_or_rd(2.0, 1.0).is_err());
        assert!(ColorScale::linear(0.0, 1.0, &[]).is_err());
        assert!(hex_to_rgb("#12345").is_err());
        assert!(hex_to_rgb("zzzzzz").is_err());
        assert_eq!(hex_to_rgb("#bd0026").unwrap(), RGBColor(0xbd, 0x00, 0x26));
    }
}
