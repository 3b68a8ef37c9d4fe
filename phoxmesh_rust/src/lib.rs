//! PhoxMesh Rectangular MZI Mesh Renderer
//!
//! Draws rectangular Mach-Zehnder interferometer meshes as 2D geometry and
//! animates optical field propagation through their layers.

pub mod topology;
pub mod layer_map;
pub mod color;
pub mod geometry;
pub mod patch;
pub mod labels;
pub mod canvas;
pub mod config;
pub mod render;
pub mod animate;
pub mod scene;
pub mod error;

pub use topology::{rectangular_mesh_points, triangular_mesh_points, MeshPosition};
pub use layer_map::{clamp_sub_layer, role_color_of, sub_layer_of, PatchRole};
pub use geometry::{MeshLayout, MziGeometry, Polygon};
pub use patch::{Coloring, PatchCollection, PatchKind, RenderedPatch};
pub use canvas::{register_label_font, BitmapCanvas, Canvas, RgbFrame};
pub use config::RenderConfig;
pub use render::{FrameInputs, MeshRenderer, PhaseArrays, RenderPass};
pub use animate::{animate_field_propagation, AnimationConfig, MovieFormat};
pub use scene::MeshScene;
pub use error::{MeshError, Result};
