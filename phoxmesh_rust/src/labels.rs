//! Label Annotator
//!
//! Text overlays naming ports, layers and phase shifters. Positions use the
//! same mesh-centered coordinates as the patches.

use crate::color::{Rgba, BEAMSPLITTER_COLOR, GAMMA_COLOR, LABEL_COLOR, PHI_COLOR, THETA_COLOR};
use crate::patch::PatchBuilder;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// Text anchored at a mesh-centered position.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub position: [f64; 2],
    pub color: Rgba,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub size: f64,
}

impl Label {
    fn new(text: impl Into<String>, position: [f64; 2], color: Rgba, size: f64) -> Self {
        Self {
            text: text.into(),
            position,
            color,
            h_align: HAlign::Center,
            v_align: VAlign::Bottom,
            size,
        }
    }

    fn aligned(mut self, h_align: HAlign, v_align: VAlign) -> Self {
        self.h_align = h_align;
        self.v_align = v_align;
        self
    }
}

/// Which phase shifter groups exist in the current patch set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShifterGroups {
    pub gamma: bool,
    pub theta: bool,
    pub phi: bool,
}

/// Labels above each phase shifter: gamma by port, theta and phi by (port, layer).
pub fn shifter_labels(builder: &PatchBuilder, groups: ShifterGroups, size: Option<f64>) -> Vec<Label> {
    let Some(size) = size else {
        return Vec::new();
    };
    let lift = builder.thickness() * 0.75;
    let above = |center: [f64; 2]| {
        let c = builder.to_centered(center);
        [c[0], c[1] - lift]
    };

    let mut labels = Vec::new();
    if groups.gamma {
        for port in 0..builder.layout().num_ports {
            labels.push(Label::new(
                format!("γ{}", port + 1),
                above(builder.gamma_center(port)),
                GAMMA_COLOR,
                size,
            ));
        }
    }
    if groups.theta {
        for &pt in builder.positions() {
            labels.push(Label::new(
                format!("θ{}{}", pt.port + 1, pt.layer + 1),
                above(builder.theta_center(pt)),
                THETA_COLOR,
                size,
            ));
        }
    }
    if groups.phi {
        for &pt in builder.positions() {
            labels.push(Label::new(
                format!("φ{}{}", pt.port + 1, pt.layer + 1),
                above(builder.phi_center(pt)),
                PHI_COLOR,
                size,
            ));
        }
    }
    labels
}

/// Diagram labels: gamma column, port numbers on both sides, and the
/// beam splitter / theta / phi groups of each layer column.
pub fn demo_labels(builder: &PatchBuilder, size: Option<f64>, distance: Option<f64>) -> Vec<Label> {
    let Some(size) = size else {
        return Vec::new();
    };
    let distance = distance.unwrap_or(size / 2.0);
    let layout = builder.layout();
    let mzi = &layout.mzi;
    let (half_w, half_h) = (layout.dim.0 / 2.0, layout.dim.1 / 2.0);
    let shift = mzi.phase_shifter_length / 2.0 * (layout.num_ports % 2) as f64;
    let top = -half_h - distance;
    let bottom = half_h + distance;

    let mut labels = vec![Label::new(
        "Dγ",
        [-half_w + layout.end_length * 0.75 - shift, top],
        GAMMA_COLOR,
        size,
    )];

    for port in 0..layout.num_ports {
        let y = -half_h + port as f64 * layout.interport_distance;
        let text = (port + 1).to_string();
        labels.push(
            Label::new(text.clone(), [-half_w - 1.0 - shift, y], LABEL_COLOR, size)
                .aligned(HAlign::Right, VAlign::Center),
        );
        labels.push(
            Label::new(text, [half_w + 1.0, y], LABEL_COLOR, size)
                .aligned(HAlign::Left, VAlign::Center),
        );
    }

    let bs_distance = mzi.phase_shifter_length / 2.0 + mzi.bend_dim.0 + mzi.interaction_length;
    let phi_distance = bs_distance + mzi.bend_dim.0 + mzi.end_bend_dim.0 * 1.5;
    for layer in 0..layout.depth {
        let center_x = layer as f64 * mzi.layer_pitch() - shift
            + layout.end_length
            + mzi.end_bend_dim.0 / 2.0
            + mzi.mzi_x_span / 2.0
            - half_w;
        let k = layer + 1;
        let groups = [
            (format!("BL({})", k), center_x - bs_distance, BEAMSPLITTER_COLOR),
            (format!("BR({})", k), center_x + bs_distance, BEAMSPLITTER_COLOR),
            (format!("Rθ({})", k), center_x, THETA_COLOR),
            (format!("Rφ({})", k), center_x + phi_distance, PHI_COLOR),
        ];
        for (heading, x, color) in groups {
            labels.push(Label::new(heading, [x, top], color, size));
            labels.push(
                Label::new(k.to_string(), [x, bottom], color, size)
                    .aligned(HAlign::Center, VAlign::Top),
            );
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MeshLayout, MziGeometry};
    use crate::topology::rectangular_mesh_points;

    #[test]
    fn test_no_size_means_no_labels() {
        let layout = MeshLayout::rectangular(MziGeometry::default(), 4, 4, 10.0);
        let points = rectangular_mesh_points(4, 4);
        let builder = PatchBuilder::new(&layout, &points, None);
        let groups = ShifterGroups {
            gamma: true,
            theta: true,
            phi: true,
        };
        assert!(shifter_labels(&builder, groups, None).is_empty());
        assert!(demo_labels(&builder, None, Some(3.0)).is_empty());
    }

    #[test]
    fn test_shifter_labels_cover_present_groups() {
        let layout = MeshLayout::rectangular(MziGeometry::default(), 4, 4, 10.0);
        let points = rectangular_mesh_points(4, 4);
        let builder = PatchBuilder::new(&layout, &points, None);
        let groups = ShifterGroups {
            gamma: true,
            theta: true,
            phi: false,
        };
        let labels = shifter_labels(&builder, groups, Some(12.0));

        assert_eq!(labels.len(), 4 + points.len());
        assert_eq!(labels[0].text, "γ1");
        assert_eq!(labels[4].text, "θ11");
        assert!(labels.iter().all(|l| l.size == 12.0));
    }

    #[test]
    fn test_demo_labels_count() {
        let layout = MeshLayout::rectangular(MziGeometry::default(), 4, 3, 10.0);
        let points = rectangular_mesh_points(4, 3);
        let builder = PatchBuilder::new(&layout, &points, None);
        let labels = demo_labels(&builder, Some(10.0), None);

        // gamma heading + 2 per port + 8 per layer column
        assert_eq!(labels.len(), 1 + 2 * 4 + 8 * 3);
        assert_eq!(labels[0].position[1], -layout.dim.1 / 2.0 - 5.0);
    }
}
