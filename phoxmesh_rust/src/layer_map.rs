//! Polygon index to sub-layer / semantic role mapping.
//!
//! A rendered waveguide path is a run of sub-polygons: a few leading polygons
//! covering the input (gamma) region, then a fixed count per MZI unit. Each
//! unit spans four field sub-layers banded as {3, 1, 3, 3} polygons.

use crate::color::{Rgba, BEAMSPLITTER_COLOR, GAMMA_COLOR, PHI_COLOR, THETA_COLOR};

/// Polygons in the input region ahead of the first MZI unit.
pub const LEADING_POLYGONS: usize = 4;

/// Polygons per repeating MZI unit.
pub const POLYGONS_PER_UNIT: usize = 10;

/// Field sub-layers per MZI unit.
pub const SUB_LAYERS_PER_UNIT: usize = 4;

/// Position of a polygon inside its unit, relative to the first unit start.
///
/// Floor semantics: the polygons just before the first unit wrap to the
/// tail of a virtual unit -1.
#[inline]
fn unit_and_offset(index: usize) -> (i64, usize) {
    let shifted = index as i64 - LEADING_POLYGONS as i64;
    let unit = shifted.div_euclid(POLYGONS_PER_UNIT as i64);
    let offset = shifted.rem_euclid(POLYGONS_PER_UNIT as i64) as usize;
    (unit, offset)
}

/// Field sub-layer sampled by the polygon at `index`.
pub fn sub_layer_of(index: usize) -> usize {
    if index == 0 {
        return 0;
    }
    let (unit, offset) = unit_and_offset(index);
    let start = unit * SUB_LAYERS_PER_UNIT as i64 + 1;
    let band = match offset {
        0..=2 => 0,
        3 => 1,
        4..=6 => 2,
        _ => 3,
    };
    (start + band).max(0) as usize
}

/// Clamp a sub-layer to the last one available in a field tensor.
#[inline]
pub fn clamp_sub_layer(sub_layer: usize, available: usize) -> usize {
    sub_layer.min(available.saturating_sub(1))
}

/// Physical role of a waveguide sub-polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatchRole {
    Gamma,
    BeamSplitter,
    Theta,
    Phi,
}

impl PatchRole {
    pub fn color(self) -> Rgba {
        match self {
            PatchRole::Gamma => GAMMA_COLOR,
            PatchRole::BeamSplitter => BEAMSPLITTER_COLOR,
            PatchRole::Theta => THETA_COLOR,
            PatchRole::Phi => PHI_COLOR,
        }
    }
}

/// Role of the polygon at `index`.
///
/// Inside a unit the regions run beam splitter, theta, beam splitter, phi,
/// beam splitter.
pub fn role_of(index: usize) -> PatchRole {
    if index < 3 {
        return PatchRole::Gamma;
    }
    let (_, offset) = unit_and_offset(index);
    match offset {
        0..=1 => PatchRole::BeamSplitter,
        2 => PatchRole::Theta,
        3..=5 => PatchRole::BeamSplitter,
        6..=8 => PatchRole::Phi,
        _ => PatchRole::BeamSplitter,
    }
}

pub fn role_color_of(index: usize) -> Rgba {
    role_of(index).color()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_region_is_sub_layer_zero() {
        for idx in 0..LEADING_POLYGONS {
            assert_eq!(sub_layer_of(idx), 0, "index {}", idx);
        }
    }

    #[test]
    fn test_first_unit_banding() {
        let expected = [1, 1, 1, 2, 3, 3, 3, 4, 4, 4];
        for (offset, &sub) in expected.iter().enumerate() {
            assert_eq!(sub_layer_of(LEADING_POLYGONS + offset), sub);
        }
        // Second unit starts four sub-layers later
        assert_eq!(sub_layer_of(LEADING_POLYGONS + POLYGONS_PER_UNIT), 5);
        assert_eq!(sub_layer_of(LEADING_POLYGONS + POLYGONS_PER_UNIT + 3), 6);
    }

    #[test]
    fn test_sub_layer_is_monotonic() {
        let mut prev = sub_layer_of(0);
        for idx in 1..500 {
            let cur = sub_layer_of(idx);
            assert!(cur >= prev, "index {} went from {} to {}", idx, prev, cur);
            prev = cur;
        }
    }

    #[test]
    fn test_clamp_hits_last_sub_layer() {
        for available in 1..20 {
            for sub in 0..60 {
                let clamped = clamp_sub_layer(sub, available);
                assert!(clamped < available);
                if sub >= available - 1 {
                    assert_eq!(clamped, available - 1);
                } else {
                    assert_eq!(clamped, sub);
                }
            }
        }
    }

    #[test]
    fn test_roles() {
        assert_eq!(role_of(0), PatchRole::Gamma);
        assert_eq!(role_of(2), PatchRole::Gamma);
        assert_eq!(role_of(3), PatchRole::BeamSplitter);
        let unit: Vec<PatchRole> = (4..14).map(role_of).collect();
        use PatchRole::*;
        assert_eq!(
            unit,
            vec![
                BeamSplitter,
                BeamSplitter,
                Theta,
                BeamSplitter,
                BeamSplitter,
                BeamSplitter,
                Phi,
                Phi,
                Phi,
                BeamSplitter
            ]
        );
        assert_eq!(role_of(16), Theta);
    }

    #[test]
    fn test_role_colors_are_opaque() {
        for idx in 0..40 {
            assert_eq!(role_color_of(idx).a, 1.0);
        }
    }
}
