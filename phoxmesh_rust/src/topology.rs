//! Mesh Topology
//!
//! Enumerates the (port, layer) cells of a mesh that hold an active MZI.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Position of one MZI unit cell in the mesh.
///
/// The MZI couples ports `port` and `port + 1` in column `layer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshPosition {
    pub port: usize,
    pub layer: usize,
}

impl MeshPosition {
    pub fn new(port: usize, layer: usize) -> Self {
        Self { port, layer }
    }
}

/// Checkerboard activity grid of shape (num_ports - 1, depth).
///
/// Cell (p, l) is active iff p and l have the same parity, so every pair of
/// adjacent ports is coupled exactly once every two layers.
pub fn checkerboard(num_ports: usize, depth: usize) -> Array2<bool> {
    let rows = num_ports.saturating_sub(1);
    Array2::from_shape_fn((rows, depth), |(p, l)| p % 2 == l % 2)
}

/// Valid MZI positions of a rectangular (Clements-style) mesh.
///
/// Positions are returned in row-major order: by port, then by layer.
pub fn rectangular_mesh_points(num_ports: usize, depth: usize) -> Vec<MeshPosition> {
    if num_ports < 2 || depth < 1 {
        return Vec::new();
    }

    checkerboard(num_ports, depth)
        .indexed_iter()
        .filter(|(_, &active)| active)
        .map(|((port, layer), _)| MeshPosition::new(port, layer))
        .collect()
}

/// Valid MZI positions of a triangular (Reck-style) mesh.
///
/// Uses the same checkerboard over a (num_ports - 1, 2 * num_ports) grid,
/// masked to the triangle that a Reck mesh occupies.
pub fn triangular_mesh_points(num_ports: usize) -> Vec<MeshPosition> {
    if num_ports < 2 {
        return Vec::new();
    }

    let n = num_ports;
    let grid = checkerboard(n, 2 * n);
    grid.indexed_iter()
        .filter(|&((p, l), &active)| {
            let in_triangle = if l < n { l + 1 + p >= n } else { l - n <= p };
            active && in_triangle
        })
        .map(|((port, layer), _)| MeshPosition::new(port, layer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same_parity_count(num_ports: usize, depth: usize) -> usize {
        let mut count = 0;
        for p in 0..num_ports - 1 {
            for l in 0..depth {
                if p % 2 == l % 2 {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_four_by_four_has_six_mzis() {
        let points = rectangular_mesh_points(4, 4);
        assert_eq!(points.len(), 6);
        assert_eq!(
            points,
            vec![
                MeshPosition::new(0, 0),
                MeshPosition::new(0, 2),
                MeshPosition::new(1, 1),
                MeshPosition::new(1, 3),
                MeshPosition::new(2, 0),
                MeshPosition::new(2, 2),
            ]
        );
    }

    #[test]
    fn test_count_matches_parity_predicate() {
        for num_ports in 2..12 {
            for depth in 1..12 {
                let points = rectangular_mesh_points(num_ports, depth);
                assert_eq!(points.len(), same_parity_count(num_ports, depth));
                assert!(points.iter().all(|pt| pt.port % 2 == pt.layer % 2));
                assert!(points.iter().all(|pt| pt.port < num_ports - 1 && pt.layer < depth));
            }
        }
    }

    #[test]
    fn test_full_depth_mesh_has_clements_count() {
        // A square rectangular mesh holds N(N-1)/2 MZIs
        for n in 2..10 {
            assert_eq!(rectangular_mesh_points(n, n).len(), n * (n - 1) / 2);
        }
    }

    #[test]
    fn test_degenerate_inputs_are_empty() {
        assert!(rectangular_mesh_points(0, 4).is_empty());
        assert!(rectangular_mesh_points(1, 4).is_empty());
        assert!(rectangular_mesh_points(4, 0).is_empty());
        assert!(triangular_mesh_points(1).is_empty());
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        assert_eq!(rectangular_mesh_points(7, 5), rectangular_mesh_points(7, 5));
    }

    #[test]
    fn test_triangular_mesh_has_reck_count() {
        for n in 2..10 {
            let points = triangular_mesh_points(n);
            assert_eq!(points.len(), n * (n - 1) / 2, "n = {}", n);
        }
    }
}
