//! Colors, role palette and the field-amplitude colormap.

use plotters::style::RGBAColor;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Upper bound of the internal MZI phase theta.
pub const MAX_THETA: f64 = PI;

/// Upper bound of the external phase phi (and of the input phases gamma).
pub const MAX_PHI: f64 = 2.0 * PI;

/// RGBA color with components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same color with a new alpha.
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn to_plotters(self) -> RGBAColor {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        RGBAColor(
            channel(self.r),
            channel(self.g),
            channel(self.b),
            self.a.clamp(0.0, 1.0),
        )
    }
}

pub const BEAMSPLITTER_COLOR: Rgba = Rgba::opaque(0.0, 0.4, 0.8);
pub const THETA_COLOR: Rgba = Rgba::opaque(0.8, 0.2, 0.0);
pub const PHI_COLOR: Rgba = Rgba::opaque(0.0, 0.6, 0.2);
pub const GAMMA_COLOR: Rgba = Rgba::opaque(0.6, 0.2, 0.8);
pub const BACKGROUND_COLOR: Rgba = Rgba::opaque(0.0, 0.0, 0.0);
pub const LABEL_COLOR: Rgba = Rgba::opaque(1.0, 1.0, 0.0);

/// Alpha encoding a phase value relative to its maximum.
#[inline]
pub fn phase_alpha(value: f64, max: f64) -> f64 {
    (value / max).clamp(0.0, 1.0)
}

#[derive(Clone, Copy, Debug)]
struct ChannelStop {
    at: f64,
    value: f64,
}

const fn stop(at: f64, value: f64) -> ChannelStop {
    ChannelStop { at, value }
}

const HOT_RED: [ChannelStop; 3] = [stop(0.0, 0.0416), stop(0.365079, 1.0), stop(1.0, 1.0)];
const HOT_GREEN: [ChannelStop; 4] = [
    stop(0.0, 0.0),
    stop(0.365079, 0.0),
    stop(0.746032, 1.0),
    stop(1.0, 1.0),
];
const HOT_BLUE: [ChannelStop; 3] = [stop(0.0, 0.0), stop(0.746032, 0.0), stop(1.0, 1.0)];

fn sample_channel(stops: &[ChannelStop], t: f64) -> f64 {
    if t <= stops[0].at {
        return stops[0].value;
    }
    for window in stops.windows(2) {
        if let [start, end] = window {
            if t <= end.at {
                let span = (end.at - start.at).max(f64::EPSILON);
                let frac = ((t - start.at) / span).clamp(0.0, 1.0);
                return start.value + (end.value - start.value) * frac;
            }
        }
    }
    stops[stops.len() - 1].value
}

/// Black-red-yellow-white ramp for field amplitudes.
///
/// Values are normalized against the color limits `[vmin, vmax]` and clamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HotColormap {
    pub vmin: f64,
    pub vmax: f64,
}

impl HotColormap {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    /// Normalized position of `value` inside the color limits.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span <= 0.0 || !value.is_finite() {
            return 0.0;
        }
        ((value - self.vmin) / span).clamp(0.0, 1.0)
    }

    pub fn to_rgba(&self, value: f64) -> Rgba {
        let t = self.normalize(value);
        Rgba::opaque(
            sample_channel(&HOT_RED, t),
            sample_channel(&HOT_GREEN, t),
            sample_channel(&HOT_BLUE, t),
        )
    }
}

impl Default for HotColormap {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_alpha_bounds() {
        assert_eq!(phase_alpha(MAX_PHI, MAX_PHI), 1.0);
        assert_eq!(phase_alpha(MAX_THETA, MAX_THETA), 1.0);
        assert_eq!(phase_alpha(0.0, MAX_PHI), 0.0);
        assert_eq!(phase_alpha(3.0 * MAX_PHI, MAX_PHI), 1.0);
        assert_eq!(phase_alpha(-1.0, MAX_PHI), 0.0);
    }

    #[test]
    fn test_hot_endpoints() {
        let cmap = HotColormap::default();
        let low = cmap.to_rgba(0.0);
        assert!((low.r - 0.0416).abs() < 1e-12);
        assert_eq!((low.g, low.b, low.a), (0.0, 0.0, 1.0));
        assert_eq!(cmap.to_rgba(1.0), Rgba::opaque(1.0, 1.0, 1.0));
        assert_eq!(cmap.to_rgba(5.0), Rgba::opaque(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_hot_is_monotonic() {
        let cmap = HotColormap::default();
        let mut prev = cmap.to_rgba(0.0);
        for i in 1..=100 {
            let cur = cmap.to_rgba(i as f64 / 100.0);
            assert!(cur.r >= prev.r && cur.g >= prev.g && cur.b >= prev.b);
            prev = cur;
        }
    }

    #[test]
    fn test_plotters_conversion() {
        let c = GAMMA_COLOR.with_alpha(0.5).to_plotters();
        assert_eq!((c.0, c.1, c.2), (153, 51, 204));
        assert_eq!(c.3, 0.5);
    }
}
