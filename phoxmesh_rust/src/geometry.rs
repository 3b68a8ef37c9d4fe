//! Mesh Geometry
//!
//! Polygon primitive, per-MZI dimensions, and the mesh layout handed to the
//! renderer by the component geometry generator.

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};

/// Closed 2D polygon (last point connects back to the first).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<[f64; 2]>,
}

impl Polygon {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Axis-aligned box from its corner coordinates.
    pub fn from_bounds(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(vec![[x1, y0], [x1, y1], [x0, y1], [x0, y0]])
    }

    /// Axis-aligned box of size (width, height) centered at (cx, cy).
    pub fn rect(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::from_bounds(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    pub fn translate(mut self, dx: f64, dy: f64) -> Self {
        for p in self.points.iter_mut() {
            p[0] += dx;
            p[1] += dy;
        }
        self
    }

    /// Rotate by pi about the origin.
    pub fn rotate_half_turn(mut self) -> Self {
        for p in self.points.iter_mut() {
            p[0] = -p[0];
            p[1] = -p[1];
        }
        self
    }

    /// (min_x, min_y, max_x, max_y), or None for an empty polygon.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.points.first()?;
        let init = (first[0], first[1], first[0], first[1]);
        Some(self.points.iter().fold(init, |(x0, y0, x1, y1), p| {
            (x0.min(p[0]), y0.min(p[1]), x1.max(p[0]), y1.max(p[1]))
        }))
    }

    pub fn centroid(&self) -> Option<[f64; 2]> {
        let (x0, y0, x1, y1) = self.bounds()?;
        Some([(x0 + x1) / 2.0, (y0 + y1) / 2.0])
    }
}

/// Fixed dimensions of one MZI unit cell, shared by every MZI in a mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MziGeometry {
    /// Span from the first beam splitter entry to the second beam splitter exit.
    pub mzi_x_span: f64,
    /// Span of a full unit including the external phase shifter section.
    pub x_span: f64,
    pub phase_shifter_length: f64,
    pub waveguide_width: f64,
    /// Beam splitter coupling length.
    pub interaction_length: f64,
    /// Beam splitter bend (x, y).
    pub bend_dim: (f64, f64),
    /// Bend between adjacent MZIs (x, y).
    pub end_bend_dim: (f64, f64),
}

impl MziGeometry {
    /// Horizontal distance between consecutive mesh layers.
    #[inline]
    pub fn layer_pitch(&self) -> f64 {
        (self.mzi_x_span + self.x_span) / 2.0
    }
}

impl Default for MziGeometry {
    fn default() -> Self {
        let phase_shifter_length = 20.0;
        let interaction_length = 10.0;
        let bend_dim = (10.0, 5.0);
        let end_bend_dim = (10.0, 10.0);
        let mzi_x_span = 4.0 * bend_dim.0 + 2.0 * interaction_length + phase_shifter_length;
        let x_span = mzi_x_span + 2.0 * end_bend_dim.0 + phase_shifter_length;
        Self {
            mzi_x_span,
            x_span,
            phase_shifter_length,
            waveguide_width: 0.5,
            interaction_length,
            bend_dim,
            end_bend_dim,
        }
    }
}

/// Waveguide polygons of one port, authored from the output tip to the input root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveguidePath {
    pub polygons: Vec<Polygon>,
}

/// Rendered geometry of a rectangular mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshLayout {
    pub num_ports: usize,
    pub depth: usize,
    pub mzi: MziGeometry,
    /// Length of the straight input/output sections.
    pub end_length: f64,
    pub interport_distance: f64,
    /// Bounding box (width, height) of the whole mesh.
    pub dim: (f64, f64),
    pub waveguide_paths: Vec<WaveguidePath>,
}

impl MeshLayout {
    /// Schematic layout with straight, segmented waveguides.
    ///
    /// Each path holds the leading input polygons, ten polygons per layer
    /// aligned with the theta and phi shifters, and one trailing output polygon.
    pub fn rectangular(mzi: MziGeometry, num_ports: usize, depth: usize, end_length: f64) -> Self {
        let interport_distance = mzi.end_bend_dim.1;
        let pitch = mzi.layer_pitch();
        let parity_shift = mzi.phase_shifter_length / 2.0 * (num_ports % 2) as f64;
        let first_unit = end_length + mzi.end_bend_dim.0 / 2.0 - parity_shift;

        let width = 2.0 * end_length
            + mzi.end_bend_dim.0 / 2.0
            + depth.saturating_sub(1) as f64 * pitch
            + mzi.x_span;
        let height = num_ports.saturating_sub(1) as f64 * interport_distance;

        // Segment breakpoints along x, input to output
        let mut breaks = Vec::with_capacity(depth * 10 + 6);
        for i in 0..=4 {
            breaks.push(first_unit.max(0.0) * i as f64 / 4.0);
        }
        let unit_breaks = unit_breakpoints(&mzi, pitch);
        for layer in 0..depth {
            let start = first_unit + layer as f64 * pitch;
            for rel in unit_breaks.iter().skip(1) {
                breaks.push(start + rel);
            }
        }
        breaks.push(width);
        for i in 1..breaks.len() {
            breaks[i] = breaks[i].max(breaks[i - 1]);
        }

        let waveguide_paths = (0..num_ports)
            .map(|wvg_idx| {
                let y = wvg_idx as f64 * interport_distance;
                let polygons = breaks
                    .windows(2)
                    .rev()
                    .map(|w| {
                        // Authored frame is the rendered frame turned by half a turn
                        let (x0, x1) = (width - w[1], width - w[0]);
                        Polygon::from_bounds(
                            x0,
                            y - mzi.waveguide_width / 2.0,
                            x1,
                            y + mzi.waveguide_width / 2.0,
                        )
                    })
                    .collect();
                WaveguidePath { polygons }
            })
            .collect();

        Self {
            num_ports,
            depth,
            mzi,
            end_length,
            interport_distance,
            dim: (width, height),
            waveguide_paths,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.waveguide_paths.len() != self.num_ports {
            return Err(MeshError::ShapeMismatch {
                name: "waveguide_paths",
                expected: vec![self.num_ports],
                actual: vec![self.waveguide_paths.len()],
            });
        }
        if !(self.dim.0 > 0.0 && self.dim.1 >= 0.0) {
            return Err(MeshError::InvalidConfig(format!(
                "mesh bounding box must be positive, got {:?}",
                self.dim
            )));
        }
        Ok(())
    }

    /// Polygon count of every port path.
    pub fn path_polygon_counts(&self) -> Vec<usize> {
        self.waveguide_paths.iter().map(|p| p.polygons.len()).collect()
    }

    /// Shift taking mesh-global coordinates to mesh-centered ones.
    #[inline]
    pub fn center_offset(&self) -> (f64, f64) {
        (-self.dim.0 / 2.0, -self.dim.1 / 2.0)
    }
}

/// Breakpoints of the ten polygons of one unit, relative to the unit start.
///
/// Bands: two beam splitter, one theta, three beam splitter, three phi, one
/// beam splitter.
fn unit_breakpoints(mzi: &MziGeometry, pitch: f64) -> [f64; 11] {
    let half_ps = mzi.phase_shifter_length / 2.0;
    let theta_start = mzi.mzi_x_span / 2.0 - half_ps;
    let theta_end = mzi.mzi_x_span / 2.0 + half_ps;
    let phi_start = mzi.mzi_x_span - half_ps;
    let phi_end = (mzi.mzi_x_span + half_ps).min(pitch);
    let bs = (phi_start - theta_end) / 3.0;
    let phi = (phi_end - phi_start) / 3.0;
    [
        0.0,
        theta_start / 2.0,
        theta_start,
        theta_end,
        theta_end + bs,
        theta_end + 2.0 * bs,
        phi_start,
        phi_start + phi,
        phi_start + 2.0 * phi,
        phi_end,
        pitch,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer_map::{LEADING_POLYGONS, POLYGONS_PER_UNIT};

    #[test]
    fn test_rect_bounds() {
        let r = Polygon::rect(1.0, 2.0, 4.0, 2.0);
        assert_eq!(r.bounds(), Some((-1.0, 1.0, 3.0, 3.0)));
        assert_eq!(r.centroid(), Some([1.0, 2.0]));
    }

    #[test]
    fn test_translate_and_rotate() {
        let r = Polygon::rect(1.0, 1.0, 2.0, 2.0).translate(1.0, -1.0).rotate_half_turn();
        assert_eq!(r.bounds(), Some((-3.0, -1.0, -1.0, 1.0)));
    }

    #[test]
    fn test_default_mzi_fits_pitch() {
        let mzi = MziGeometry::default();
        assert!(mzi.mzi_x_span + mzi.phase_shifter_length / 2.0 <= mzi.layer_pitch());
    }

    #[test]
    fn test_rectangular_layout_polygon_counts() {
        let layout = MeshLayout::rectangular(MziGeometry::default(), 4, 4, 10.0);
        assert!(layout.validate().is_ok());
        let expected = LEADING_POLYGONS + POLYGONS_PER_UNIT * 4 + 1;
        assert_eq!(layout.path_polygon_counts(), vec![expected; 4]);
    }

    #[test]
    fn test_rectangular_layout_is_authored_tip_to_root() {
        let layout = MeshLayout::rectangular(MziGeometry::default(), 3, 2, 10.0);
        for path in &layout.waveguide_paths {
            let xs: Vec<f64> = path
                .polygons
                .iter()
                .map(|p| p.bounds().unwrap().0)
                .collect();
            assert!(xs.windows(2).all(|w| w[0] <= w[1]));
            let (x0, _, _, _) = path.polygons[0].bounds().unwrap();
            let (_, _, x1, _) = path.polygons.last().unwrap().bounds().unwrap();
            assert!(x0.abs() < 1e-9);
            assert!((x1 - layout.dim.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mismatched_paths_rejected() {
        let mut layout = MeshLayout::rectangular(MziGeometry::default(), 4, 2, 10.0);
        layout.waveguide_paths.pop();
        assert!(matches!(
            layout.validate(),
            Err(MeshError::ShapeMismatch { .. })
        ));
    }
}
