//! Frame Renderer
//!
//! Builds the simulation patch collection once, then only recolors it on
//! later frames. Geometry is static across an animation; field magnitudes
//! and phase colors are not.

use ndarray::{ArrayView1, ArrayView2};
use num_complex::Complex64;

use crate::canvas::{Canvas, Viewport};
use crate::color::{HotColormap, Rgba, BACKGROUND_COLOR, MAX_PHI, MAX_THETA, PHI_COLOR, THETA_COLOR};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::geometry::MeshLayout;
use crate::labels::{demo_labels, shifter_labels, Label, ShifterGroups};
use crate::patch::{
    checkerboard_colors, gamma_colors, validate_checkerboard, validate_fields, validate_gamma,
    waveguide_colors, Coloring, PatchBuilder, PatchCollection,
};
use crate::topology::{rectangular_mesh_points, MeshPosition};

/// Phase arrays for one frame. Absent arrays produce no shifter patches.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhaseArrays<'a> {
    /// Internal phases, indexed [port][layer].
    pub theta: Option<ArrayView2<'a, f64>>,
    /// External phases, indexed [port][layer].
    pub phi: Option<ArrayView2<'a, f64>>,
    /// Input phases, one per port.
    pub gamma: Option<ArrayView1<'a, f64>>,
}

impl PhaseArrays<'_> {
    /// Same arrays, borrowed for a shorter lifetime.
    pub fn reborrow(&self) -> PhaseArrays<'_> {
        PhaseArrays {
            theta: self.theta.as_ref().map(|v| v.view()),
            phi: self.phi.as_ref().map(|v| v.view()),
            gamma: self.gamma.as_ref().map(|v| v.view()),
        }
    }

    pub fn groups(&self) -> ShifterGroups {
        ShifterGroups {
            gamma: self.gamma.is_some(),
            theta: self.theta.is_some(),
            phi: self.phi.is_some(),
        }
    }
}

/// Everything that colors one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs<'a> {
    /// Field amplitudes indexed [port][sub_layer].
    pub fields: ArrayView2<'a, Complex64>,
    pub phases: PhaseArrays<'a>,
}

/// Work done by one `render_frame` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPass {
    FullBuild,
    Recolor,
}

struct BuiltMesh {
    collection: PatchCollection,
    groups: ShifterGroups,
    labels: Vec<Label>,
}

enum RenderState {
    Uninitialized,
    Built(BuiltMesh),
}

/// Renderer for one rectangular mesh.
pub struct MeshRenderer {
    layout: MeshLayout,
    positions: Vec<MeshPosition>,
    config: RenderConfig,
    colormap: HotColormap,
    state: RenderState,
    demo: Option<PatchCollection>,
}

impl MeshRenderer {
    /// Create a renderer; the layout and configuration are validated here.
    pub fn new(layout: MeshLayout, config: RenderConfig) -> Result<Self> {
        layout.validate()?;
        config.validate()?;
        let positions = rectangular_mesh_points(layout.num_ports, layout.depth);
        log::debug!(
            "mesh renderer: {} ports, depth {}, {} MZIs",
            layout.num_ports,
            layout.depth,
            positions.len()
        );
        Ok(Self {
            layout,
            positions,
            config,
            colormap: HotColormap::default(),
            state: RenderState::Uninitialized,
            demo: None,
        })
    }

    pub fn layout(&self) -> &MeshLayout {
        &self.layout
    }

    pub fn positions(&self) -> &[MeshPosition] {
        &self.positions
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, RenderState::Built(_))
    }

    /// Current simulation collection, once built.
    pub fn collection(&self) -> Option<&PatchCollection> {
        match &self.state {
            RenderState::Built(built) => Some(&built.collection),
            RenderState::Uninitialized => None,
        }
    }

    /// Current simulation color sequence, once built.
    pub fn colors(&self) -> Option<&[Rgba]> {
        self.collection().map(PatchCollection::colors)
    }

    pub fn demo_collection(&self) -> Option<&PatchCollection> {
        self.demo.as_ref()
    }

    fn builder(&self) -> PatchBuilder<'_> {
        PatchBuilder::new(
            &self.layout,
            &self.positions,
            self.config.phase_shifter_thickness,
        )
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::around_mesh(
            self.layout.dim,
            self.config.x_padding_factor,
            self.config.y_padding_factor,
        )
    }

    /// Render one frame of simulated fields.
    ///
    /// The first call, or any call with `replot`, builds every patch. Later
    /// calls only recompute colors, unless the set of phase arrays changed
    /// since the build.
    pub fn render_frame(
        &mut self,
        canvas: &mut dyn Canvas,
        frame: &FrameInputs,
        replot: bool,
    ) -> Result<RenderPass> {
        let groups = frame.phases.groups();
        let built_groups = match &self.state {
            RenderState::Built(built) => Some(built.groups),
            RenderState::Uninitialized => None,
        };

        if !replot && built_groups == Some(groups) {
            let colors = self.frame_colors(frame)?;
            if let RenderState::Built(built) = &mut self.state {
                built.collection.set_face_colors(colors)?;
                canvas.draw(&built.collection, &built.labels)?;
            }
            return Ok(RenderPass::Recolor);
        }

        if !replot && built_groups.is_some() {
            log::debug!("phase arrays changed since last build; rebuilding patches");
        }

        let built = self.build(frame)?;
        canvas.configure(self.viewport(), BACKGROUND_COLOR);
        canvas.draw(&built.collection, &built.labels)?;
        log::debug!("built {} simulation patches", built.collection.len());
        self.state = RenderState::Built(built);
        Ok(RenderPass::FullBuild)
    }

    fn build(&self, frame: &FrameInputs) -> Result<BuiltMesh> {
        let builder = self.builder();
        let phases = &frame.phases;
        let mut patches = Vec::new();

        if let Some(gamma) = phases.gamma {
            patches.extend(builder.gamma_patches(gamma)?);
        }
        if let Some(theta) = phases.theta {
            patches.extend(builder.theta_patches(theta)?);
        }
        if let Some(phi) = phases.phi {
            patches.extend(builder.phi_patches(phi)?);
        }
        let coloring = Coloring::FieldDriven {
            fields: frame.fields,
            colormap: self.colormap,
        };
        patches.extend(builder.waveguide_patches(&coloring)?);

        let groups = phases.groups();
        Ok(BuiltMesh {
            collection: PatchCollection::new(patches),
            groups,
            labels: shifter_labels(&builder, groups, self.config.label_size),
        })
    }

    /// Colors of every simulation patch, in build order.
    fn frame_colors(&self, frame: &FrameInputs) -> Result<Vec<Rgba>> {
        let num_ports = self.layout.num_ports;
        let depth = self.layout.depth;
        let phases = &frame.phases;
        let mut colors = Vec::new();

        if let Some(gamma) = phases.gamma {
            validate_gamma(gamma, num_ports)?;
            colors.extend(gamma_colors(gamma));
        }
        if let Some(theta) = phases.theta {
            validate_checkerboard("theta_checkerboard", theta, num_ports, depth)?;
            colors.extend(checkerboard_colors(&self.positions, theta, THETA_COLOR, MAX_THETA));
        }
        if let Some(phi) = phases.phi {
            validate_checkerboard("phi_checkerboard", phi, num_ports, depth)?;
            colors.extend(checkerboard_colors(&self.positions, phi, PHI_COLOR, MAX_PHI));
        }
        validate_fields(frame.fields, num_ports)?;
        let coloring = Coloring::FieldDriven {
            fields: frame.fields,
            colormap: self.colormap,
        };
        colors.extend(waveguide_colors(&coloring, &self.layout.path_polygon_counts()));
        Ok(colors)
    }

    /// Render the static role-colored diagram of the mesh.
    pub fn render_demo(&mut self, canvas: &mut dyn Canvas) -> Result<()> {
        if self.demo.is_none() {
            let patches = self.builder().waveguide_patches(&Coloring::RoleDriven)?;
            self.demo = Some(PatchCollection::new(patches));
        }
        let labels = demo_labels(
            &self.builder(),
            self.config.label_size,
            self.config.label_distance,
        );
        canvas.configure(self.viewport(), BACKGROUND_COLOR);
        if let Some(demo) = &self.demo {
            canvas.draw(demo, &labels)?;
        }
        Ok(())
    }
}
