//! Patch Builder
//!
//! Positions every phase shifter and waveguide segment of the mesh in
//! mesh-centered coordinates and assigns its color.
//!
//! Patch order is fixed: gamma shifters by port, theta shifters by mesh
//! position, phi shifters by mesh position, then waveguide segments by port
//! and by input-to-output polygon index. The color-only functions below walk
//! the same order so a recolor pass lines up slot for slot with the build.

use ndarray::{ArrayView1, ArrayView2};
use num_complex::Complex64;

use crate::color::{
    phase_alpha, HotColormap, Rgba, GAMMA_COLOR, MAX_PHI, MAX_THETA, PHI_COLOR, THETA_COLOR,
};
use crate::error::{MeshError, Result};
use crate::geometry::{MeshLayout, Polygon};
use crate::layer_map::{clamp_sub_layer, role_color_of, sub_layer_of};
use crate::topology::MeshPosition;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatchKind {
    Gamma,
    Theta,
    Phi,
    Waveguide,
}

/// Positioned polygon with its fill color.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPatch {
    pub kind: PatchKind,
    pub polygon: Polygon,
    pub color: Rgba,
}

/// Ordered patches drawn as one unit.
///
/// Polygons and colors are parallel sequences; a recolor must supply exactly
/// one color per polygon, in build order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchCollection {
    kinds: Vec<PatchKind>,
    polygons: Vec<Polygon>,
    colors: Vec<Rgba>,
}

impl PatchCollection {
    pub fn new(patches: Vec<RenderedPatch>) -> Self {
        let mut collection = Self {
            kinds: Vec::with_capacity(patches.len()),
            polygons: Vec::with_capacity(patches.len()),
            colors: Vec::with_capacity(patches.len()),
        };
        for patch in patches {
            collection.kinds.push(patch.kind);
            collection.polygons.push(patch.polygon);
            collection.colors.push(patch.color);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn kinds(&self) -> &[PatchKind] {
        &self.kinds
    }

    pub fn count(&self, kind: PatchKind) -> usize {
        self.kinds.iter().filter(|&&k| k == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Polygon, &Rgba)> {
        self.polygons.iter().zip(self.colors.iter())
    }

    /// Replace every fill color, keeping geometry untouched.
    pub fn set_face_colors(&mut self, colors: Vec<Rgba>) -> Result<()> {
        if colors.len() != self.polygons.len() {
            return Err(MeshError::ShapeMismatch {
                name: "face colors",
                expected: vec![self.polygons.len()],
                actual: vec![colors.len()],
            });
        }
        self.colors = colors;
        Ok(())
    }
}

/// How waveguide segments are colored.
#[derive(Clone, Copy, Debug)]
pub enum Coloring<'a> {
    /// Hot colormap of the field magnitude sampled at each segment's sub-layer.
    FieldDriven {
        fields: ArrayView2<'a, Complex64>,
        colormap: HotColormap,
    },
    /// Static color of each segment's physical role.
    RoleDriven,
}

impl<'a> Coloring<'a> {
    pub fn field_driven(fields: ArrayView2<'a, Complex64>) -> Self {
        Coloring::FieldDriven {
            fields,
            colormap: HotColormap::default(),
        }
    }

    /// Color of polygon `poly_idx` (input-to-output order) on rendered path `wvg_idx`.
    pub fn color_of(&self, num_ports: usize, wvg_idx: usize, poly_idx: usize) -> Rgba {
        match self {
            Coloring::FieldDriven { fields, colormap } => {
                let sub_layer = clamp_sub_layer(sub_layer_of(poly_idx), fields.ncols());
                // Field rows run in the opposite port order from the geometry
                let amplitude = fields[[num_ports - 1 - wvg_idx, sub_layer]].norm();
                colormap.to_rgba(amplitude)
            }
            Coloring::RoleDriven => role_color_of(poly_idx),
        }
    }
}

pub fn validate_gamma(gamma: ArrayView1<f64>, num_ports: usize) -> Result<()> {
    if gamma.len() != num_ports {
        return Err(MeshError::ShapeMismatch {
            name: "phase_shift_layer",
            expected: vec![num_ports],
            actual: vec![gamma.len()],
        });
    }
    Ok(())
}

pub fn validate_checkerboard(
    name: &'static str,
    values: ArrayView2<f64>,
    num_ports: usize,
    depth: usize,
) -> Result<()> {
    let (rows, cols) = values.dim();
    if rows < num_ports.saturating_sub(1) || cols < depth {
        return Err(MeshError::ShapeMismatch {
            name,
            expected: vec![num_ports.saturating_sub(1), depth],
            actual: vec![rows, cols],
        });
    }
    Ok(())
}

pub fn validate_fields(fields: ArrayView2<Complex64>, num_ports: usize) -> Result<()> {
    let (rows, cols) = fields.dim();
    if rows != num_ports || cols == 0 {
        return Err(MeshError::ShapeMismatch {
            name: "fields",
            expected: vec![num_ports, 1],
            actual: vec![rows, cols],
        });
    }
    Ok(())
}

/// Gamma shifter colors, one per port.
pub fn gamma_colors(gamma: ArrayView1<f64>) -> Vec<Rgba> {
    gamma
        .iter()
        .map(|&g| GAMMA_COLOR.with_alpha(phase_alpha(g, MAX_PHI)))
        .collect()
}

/// Theta or phi shifter colors, one per mesh position.
pub fn checkerboard_colors(
    positions: &[MeshPosition],
    values: ArrayView2<f64>,
    base: Rgba,
    max: f64,
) -> Vec<Rgba> {
    positions
        .iter()
        .map(|pt| base.with_alpha(phase_alpha(values[[pt.port, pt.layer]], max)))
        .collect()
}

/// Waveguide segment colors for paths with the given polygon counts.
pub fn waveguide_colors(coloring: &Coloring, path_counts: &[usize]) -> Vec<Rgba> {
    let num_ports = path_counts.len();
    path_counts
        .iter()
        .enumerate()
        .flat_map(|(wvg_idx, &count)| {
            (0..count).map(move |poly_idx| coloring.color_of(num_ports, wvg_idx, poly_idx))
        })
        .collect()
}

/// Builds positioned patches for one mesh layout.
pub struct PatchBuilder<'a> {
    layout: &'a MeshLayout,
    positions: &'a [MeshPosition],
    thickness: f64,
}

impl<'a> PatchBuilder<'a> {
    pub fn new(
        layout: &'a MeshLayout,
        positions: &'a [MeshPosition],
        thickness: Option<f64>,
    ) -> Self {
        let thickness = thickness.unwrap_or(3.0 * layout.mzi.waveguide_width);
        Self {
            layout,
            positions,
            thickness,
        }
    }

    pub fn layout(&self) -> &MeshLayout {
        self.layout
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn positions(&self) -> &[MeshPosition] {
        self.positions
    }

    /// Half-shifter shift applied to meshes with an odd port count.
    #[inline]
    fn parity_shift(&self) -> f64 {
        self.layout.mzi.phase_shifter_length / 2.0 * (self.layout.num_ports % 2) as f64
    }

    /// Center of the gamma shifter of `port`, mesh-global coordinates.
    pub fn gamma_center(&self, port: usize) -> [f64; 2] {
        let psl = self.layout.mzi.phase_shifter_length;
        [
            self.layout.end_length - psl / 2.0 - self.parity_shift(),
            port as f64 * self.layout.interport_distance,
        ]
    }

    /// Left edge of the MZI unit at `layer`, mesh-global coordinates.
    fn unit_start(&self, layer: usize) -> f64 {
        let mzi = &self.layout.mzi;
        layer as f64 * mzi.layer_pitch() + self.layout.end_length + mzi.end_bend_dim.0 / 2.0
            - self.parity_shift()
    }

    fn unit_row(&self, port: usize) -> f64 {
        port as f64 * self.layout.interport_distance + self.layout.mzi.end_bend_dim.1 / 2.0
    }

    /// Theta shifter center: midpoint of the unit.
    pub fn theta_center(&self, pos: MeshPosition) -> [f64; 2] {
        [
            self.unit_start(pos.layer) + self.layout.mzi.mzi_x_span / 2.0,
            self.unit_row(pos.port),
        ]
    }

    /// Phi shifter center: trailing edge of the unit.
    pub fn phi_center(&self, pos: MeshPosition) -> [f64; 2] {
        [
            self.unit_start(pos.layer) + self.layout.mzi.mzi_x_span,
            self.unit_row(pos.port),
        ]
    }

    /// Mesh-global point re-centered on the origin.
    pub fn to_centered(&self, p: [f64; 2]) -> [f64; 2] {
        let (dx, dy) = self.layout.center_offset();
        [p[0] + dx, p[1] + dy]
    }

    fn shifter(&self, center: [f64; 2]) -> Polygon {
        let (dx, dy) = self.layout.center_offset();
        Polygon::rect(
            center[0],
            center[1],
            self.layout.mzi.phase_shifter_length,
            self.thickness,
        )
        .translate(dx, dy)
    }

    pub fn gamma_patches(&self, gamma: ArrayView1<f64>) -> Result<Vec<RenderedPatch>> {
        validate_gamma(gamma, self.layout.num_ports)?;
        Ok(gamma_colors(gamma)
            .into_iter()
            .enumerate()
            .map(|(port, color)| RenderedPatch {
                kind: PatchKind::Gamma,
                polygon: self.shifter(self.gamma_center(port)),
                color,
            })
            .collect())
    }

    pub fn theta_patches(&self, theta: ArrayView2<f64>) -> Result<Vec<RenderedPatch>> {
        validate_checkerboard(
            "theta_checkerboard",
            theta,
            self.layout.num_ports,
            self.layout.depth,
        )?;
        let colors = checkerboard_colors(self.positions, theta, THETA_COLOR, MAX_THETA);
        Ok(self.mesh_patches(PatchKind::Theta, colors, |pt| self.theta_center(pt)))
    }

    pub fn phi_patches(&self, phi: ArrayView2<f64>) -> Result<Vec<RenderedPatch>> {
        validate_checkerboard(
            "phi_checkerboard",
            phi,
            self.layout.num_ports,
            self.layout.depth,
        )?;
        let colors = checkerboard_colors(self.positions, phi, PHI_COLOR, MAX_PHI);
        Ok(self.mesh_patches(PatchKind::Phi, colors, |pt| self.phi_center(pt)))
    }

    fn mesh_patches<F>(&self, kind: PatchKind, colors: Vec<Rgba>, center: F) -> Vec<RenderedPatch>
    where
        F: Fn(MeshPosition) -> [f64; 2],
    {
        self.positions
            .iter()
            .zip(colors)
            .map(|(&pt, color)| RenderedPatch {
                kind,
                polygon: self.shifter(center(pt)),
                color,
            })
            .collect()
    }

    /// Waveguide segments of every port, polygons taken in reverse authored order.
    pub fn waveguide_patches(&self, coloring: &Coloring) -> Result<Vec<RenderedPatch>> {
        if let Coloring::FieldDriven { fields, .. } = coloring {
            validate_fields(*fields, self.layout.num_ports)?;
        }
        let (dx, dy) = self.layout.center_offset();
        let counts = self.layout.path_polygon_counts();
        let colors = waveguide_colors(coloring, &counts);

        let polygons = self.layout.waveguide_paths.iter().flat_map(|path| {
            path.polygons
                .iter()
                .rev()
                .map(move |poly| poly.clone().translate(dx, dy).rotate_half_turn())
        });

        Ok(polygons
            .zip(colors)
            .map(|(polygon, color)| RenderedPatch {
                kind: PatchKind::Waveguide,
                polygon,
                color,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MziGeometry;
    use crate::topology::rectangular_mesh_points;
    use ndarray::{Array1, Array2};

    fn layout(num_ports: usize, depth: usize) -> MeshLayout {
        MeshLayout::rectangular(MziGeometry::default(), num_ports, depth, 10.0)
    }

    #[test]
    fn test_gamma_alpha_at_max_is_exactly_one() {
        let layout = layout(4, 4);
        let points = rectangular_mesh_points(4, 4);
        let builder = PatchBuilder::new(&layout, &points, None);
        let gamma = Array1::from_vec(vec![0.0, MAX_PHI / 2.0, MAX_PHI, MAX_PHI]);
        let patches = builder.gamma_patches(gamma.view()).unwrap();

        assert_eq!(patches.len(), 4);
        assert_eq!(patches[0].color.a, 0.0);
        assert!((patches[1].color.a - 0.5).abs() < 1e-12);
        assert_eq!(patches[2].color.a, 1.0);
        assert!(patches.iter().all(|p| p.color.with_alpha(1.0) == GAMMA_COLOR));
    }

    #[test]
    fn test_theta_sits_at_mid_unit_and_phi_at_trailing_edge() {
        let layout = layout(4, 4);
        let points = rectangular_mesh_points(4, 4);
        let builder = PatchBuilder::new(&layout, &points, None);
        let pt = MeshPosition::new(1, 1);
        let theta = builder.theta_center(pt);
        let phi = builder.phi_center(pt);

        assert!((phi[0] - theta[0] - layout.mzi.mzi_x_span / 2.0).abs() < 1e-9);
        assert_eq!(theta[1], phi[1]);

        let next = builder.theta_center(MeshPosition::new(0, 2));
        assert!((next[0] - theta[0] - layout.mzi.layer_pitch()).abs() < 1e-9);
    }

    #[test]
    fn test_shifters_are_recentered() {
        let layout = layout(4, 4);
        let points = rectangular_mesh_points(4, 4);
        let builder = PatchBuilder::new(&layout, &points, Some(2.0));
        let gamma = Array1::zeros(4);
        let patches = builder.gamma_patches(gamma.view()).unwrap();
        let c = patches[0].polygon.centroid().unwrap();
        let expected = builder.to_centered(builder.gamma_center(0));

        assert!((c[0] - expected[0]).abs() < 1e-9);
        assert!((c[1] - expected[1]).abs() < 1e-9);
        assert!((c[1] + layout.dim.1 / 2.0).abs() < 1e-9);
        let (_, y0, _, y1) = patches[0].polygon.bounds().unwrap();
        assert!((y1 - y0 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_checkerboard_colors_follow_positions() {
        let points = rectangular_mesh_points(4, 4);
        let mut theta = Array2::zeros((3, 4));
        theta[[1, 1]] = MAX_THETA;
        let colors = checkerboard_colors(&points, theta.view(), THETA_COLOR, MAX_THETA);

        assert_eq!(colors.len(), points.len());
        for (pt, c) in points.iter().zip(&colors) {
            let expected = if (pt.port, pt.layer) == (1, 1) { 1.0 } else { 0.0 };
            assert_eq!(c.a, expected);
        }
    }

    #[test]
    fn test_field_coloring_mirrors_ports_and_clamps() {
        let mut fields = Array2::zeros((3, 2));
        fields[[2, 0]] = Complex64::new(1.0, 0.0);
        fields[[0, 1]] = Complex64::new(0.0, 1.0);
        let coloring = Coloring::field_driven(fields.view());
        let white = Rgba::opaque(1.0, 1.0, 1.0);

        // Path 0 renders field row 2
        assert_eq!(coloring.color_of(3, 0, 0), white);
        // Path 2 reads row 0; sub-layer 1 and everything past it clamps to column 1
        assert_eq!(coloring.color_of(3, 2, 4), white);
        assert_eq!(coloring.color_of(3, 2, 200), white);
        assert_ne!(coloring.color_of(3, 2, 0), white);
    }

    #[test]
    fn test_waveguide_patches_enumerate_input_first() {
        let layout = layout(3, 2);
        let points = rectangular_mesh_points(3, 2);
        let builder = PatchBuilder::new(&layout, &points, None);
        let patches = builder.waveguide_patches(&Coloring::RoleDriven).unwrap();
        let per_path = layout.path_polygon_counts()[0];

        assert_eq!(patches.len(), 3 * per_path);
        let first = patches[0].polygon.bounds().unwrap();
        let last = patches[per_path - 1].polygon.bounds().unwrap();
        assert!((first.0 + layout.dim.0 / 2.0).abs() < 1e-9);
        assert!((last.2 - layout.dim.0 / 2.0).abs() < 1e-9);
        assert_eq!(patches[0].color, role_color_of(0));
        assert_eq!(patches[6].color, role_color_of(6));
    }

    #[test]
    fn test_collection_recolor_requires_matching_length() {
        let layout = layout(3, 2);
        let points = rectangular_mesh_points(3, 2);
        let builder = PatchBuilder::new(&layout, &points, None);
        let mut collection =
            PatchCollection::new(builder.waveguide_patches(&Coloring::RoleDriven).unwrap());
        let n = collection.len();

        assert_eq!(collection.count(PatchKind::Waveguide), n);
        assert!(collection.set_face_colors(vec![GAMMA_COLOR; n - 1]).is_err());
        collection.set_face_colors(vec![GAMMA_COLOR; n]).unwrap();
        assert!(collection.colors().iter().all(|c| *c == GAMMA_COLOR));
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let layout = layout(4, 4);
        let points = rectangular_mesh_points(4, 4);
        let builder = PatchBuilder::new(&layout, &points, None);

        let gamma = Array1::zeros(3);
        assert!(matches!(
            builder.gamma_patches(gamma.view()),
            Err(MeshError::ShapeMismatch { .. })
        ));
        let theta = Array2::zeros((3, 2));
        assert!(builder.theta_patches(theta.view()).is_err());
        let fields: Array2<Complex64> = Array2::zeros((4, 0));
        assert!(builder
            .waveguide_patches(&Coloring::field_driven(fields.view()))
            .is_err());
    }
}
