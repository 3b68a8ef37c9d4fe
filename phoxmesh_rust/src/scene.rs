//! Scene files
//!
//! A scene bundles the mesh shape, its phase settings and the simulated field
//! snapshots, as produced by an external decomposition and simulation step.

use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{MeshError, Result};
use crate::geometry::{MeshLayout, MziGeometry};
use crate::render::PhaseArrays;

fn default_end_length() -> f64 {
    10.0
}

/// Serialized mesh scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshScene {
    pub num_ports: usize,
    pub depth: usize,
    #[serde(default)]
    pub mzi: MziGeometry,
    #[serde(default = "default_end_length")]
    pub end_length: f64,
    /// Full layout from a component generator; the schematic layout is used when absent.
    #[serde(default)]
    pub layout: Option<MeshLayout>,
    #[serde(default)]
    pub theta: Option<Array2<f64>>,
    #[serde(default)]
    pub phi: Option<Array2<f64>>,
    #[serde(default)]
    pub gamma: Option<Array1<f64>>,
    /// Field snapshots indexed [layer][port][input].
    pub field_snapshots: Array3<Complex64>,
}

impl MeshScene {
    pub fn layout(&self) -> MeshLayout {
        match &self.layout {
            Some(layout) => layout.clone(),
            None => MeshLayout::rectangular(self.mzi.clone(), self.num_ports, self.depth, self.end_length),
        }
    }

    pub fn phases(&self) -> PhaseArrays<'_> {
        PhaseArrays {
            theta: self.theta.as_ref().map(|a| a.view()),
            phi: self.phi.as_ref().map(|a| a.view()),
            gamma: self.gamma.as_ref().map(|a| a.view()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(layout) = &self.layout {
            if (layout.num_ports, layout.depth) != (self.num_ports, self.depth) {
                return Err(MeshError::InvalidConfig(format!(
                    "layout is {}x{}, scene is {}x{}",
                    layout.num_ports, layout.depth, self.num_ports, self.depth
                )));
            }
        }
        let (_, ports, _) = self.field_snapshots.dim();
        if ports != self.num_ports {
            return Err(MeshError::ShapeMismatch {
                name: "field_snapshots",
                expected: vec![self.depth, self.num_ports, self.num_ports],
                actual: self.field_snapshots.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// Save scene to file.
    pub fn save(&self, filepath: &str) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(filepath, json)?;
        Ok(())
    }

    /// Load scene from file.
    pub fn load(filepath: &str) -> Result<Self> {
        let json = fs::read_to_string(filepath)?;
        let scene: Self = serde_json::from_str(&json)?;
        scene.validate()?;
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> MeshScene {
        MeshScene {
            num_ports: 4,
            depth: 4,
            mzi: MziGeometry::default(),
            end_length: 10.0,
            layout: None,
            theta: Some(Array2::zeros((3, 4))),
            phi: None,
            gamma: Some(Array1::from_elem(4, 1.0)),
            field_snapshots: Array3::from_elem((4, 4, 4), Complex64::new(0.5, -0.5)),
        }
    }

    #[test]
    fn test_scene_save_load() {
        let scene = scene();
        let path = std::env::temp_dir().join("phoxmesh_test_scene.json");
        let path = path.to_str().unwrap();

        scene.save(path).unwrap();
        let loaded = MeshScene::load(path).unwrap();

        assert_eq!(scene, loaded);
    }

    #[test]
    fn test_phases_reflect_present_arrays() {
        let scene = scene();
        let groups = scene.phases().groups();
        assert!(groups.gamma && groups.theta && !groups.phi);
    }

    #[test]
    fn test_schematic_layout_when_absent() {
        let layout = scene().layout();
        assert_eq!(layout.num_ports, 4);
        assert_eq!(layout.waveguide_paths.len(), 4);
    }

    #[test]
    fn test_port_mismatch_rejected() {
        let mut scene = scene();
        scene.field_snapshots = Array3::zeros((4, 3, 4));
        assert!(scene.validate().is_err());
    }
}
