//! PhoxMesh Benchmark Suite

use phoxmesh::canvas::{BitmapCanvas, Canvas, RgbFrame, Viewport};
use phoxmesh::color::{Rgba, MAX_PHI, MAX_THETA};
use phoxmesh::config::RenderConfig;
use phoxmesh::geometry::{MeshLayout, MziGeometry};
use phoxmesh::labels::Label;
use phoxmesh::patch::PatchCollection;
use phoxmesh::render::{FrameInputs, MeshRenderer, PhaseArrays};
use phoxmesh::topology::rectangular_mesh_points;

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use std::time::Instant;

/// Canvas that discards every draw, isolating patch work from rasterization.
struct NullCanvas;

impl Canvas for NullCanvas {
    fn configure(&mut self, _viewport: Viewport, _background: Rgba) {}

    fn set_title(&mut self, _title: Option<&str>) {}

    fn draw(&mut self, _collection: &PatchCollection, _labels: &[Label]) -> phoxmesh::Result<()> {
        Ok(())
    }

    fn frame(&self) -> RgbFrame {
        RgbFrame {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    fn size(&self) -> (u32, u32) {
        (0, 0)
    }
}

fn phases(n: usize) -> (Array2<f64>, Array2<f64>, Array1<f64>) {
    let theta = Array2::from_shape_fn((n - 1, n), |(p, l)| (p + l) as f64 * 0.1 % MAX_THETA);
    let phi = Array2::from_shape_fn((n - 1, n), |(p, l)| (p * l) as f64 * 0.1 % MAX_PHI);
    let gamma = Array1::from_shape_fn(n, |p| p as f64 * 0.3 % MAX_PHI);
    (theta, phi, gamma)
}

fn fields(n: usize, scale: f64) -> Array2<Complex64> {
    Array2::from_shape_fn((n, 4 * n + 1), |(p, s)| {
        Complex64::from_polar(scale / (1.0 + p as f64), s as f64 * 0.2)
    })
}

fn benchmark_topology() {
    println!("\n{}", "=".repeat(60));
    println!("BENCHMARK: Mesh Topology");
    println!("{}", "=".repeat(60));

    for &n in &[8, 16, 32, 64, 128] {
        let n_iters = 1000;
        let start = Instant::now();
        let mut count = 0;
        for _ in 0..n_iters {
            count = rectangular_mesh_points(n, n).len();
        }
        let elapsed = start.elapsed().as_secs_f64() / n_iters as f64;
        println!("  {}x{}: {:.1} μs ({} MZIs)", n, n, elapsed * 1e6, count);
    }
}

fn benchmark_build_vs_recolor() {
    println!("\n{}", "=".repeat(60));
    println!("BENCHMARK: Full Build vs Recolor");
    println!("{}", "=".repeat(60));

    for &n in &[8, 16, 32, 64] {
        let layout = MeshLayout::rectangular(MziGeometry::default(), n, n, 10.0);
        let mut renderer = match MeshRenderer::new(layout, RenderConfig::default()) {
            Ok(renderer) => renderer,
            Err(err) => {
                println!("  {}x{}: {}", n, n, err);
                continue;
            }
        };
        let (theta, phi, gamma) = phases(n);
        let phases = PhaseArrays {
            theta: Some(theta.view()),
            phi: Some(phi.view()),
            gamma: Some(gamma.view()),
        };
        let dim = fields(n, 0.5);
        let bright = fields(n, 1.0);
        let mut canvas = NullCanvas;

        let n_iters = if n <= 16 { 100 } else { 10 };

        let start = Instant::now();
        for _ in 0..n_iters {
            let frame = FrameInputs {
                fields: dim.view(),
                phases,
            };
            let _ = renderer.render_frame(&mut canvas, &frame, true);
        }
        let build = start.elapsed().as_secs_f64() / n_iters as f64;

        let start = Instant::now();
        for i in 0..n_iters {
            let fields = if i % 2 == 0 { &bright } else { &dim };
            let frame = FrameInputs {
                fields: fields.view(),
                phases,
            };
            let _ = renderer.render_frame(&mut canvas, &frame, false);
        }
        let recolor = start.elapsed().as_secs_f64() / n_iters as f64;

        let patches = renderer.collection().map_or(0, |c| c.len());
        println!(
            "  {}x{}: {:.1} μs build, {:.1} μs recolor ({:.1}x, {} patches)",
            n,
            n,
            build * 1e6,
            recolor * 1e6,
            build / recolor.max(f64::EPSILON),
            patches
        );
    }
}

fn benchmark_raster() {
    println!("\n{}", "=".repeat(60));
    println!("BENCHMARK: Bitmap Rasterization");
    println!("{}", "=".repeat(60));

    let config = RenderConfig::default();
    for &n in &[8, 16, 32] {
        let layout = MeshLayout::rectangular(MziGeometry::default(), n, n, 10.0);
        let mut renderer = match MeshRenderer::new(layout, config.clone()) {
            Ok(renderer) => renderer,
            Err(err) => {
                println!("  {}x{}: {}", n, n, err);
                continue;
            }
        };
        let mut canvas = BitmapCanvas::new(config.width_px, config.height_px);
        let fields = fields(n, 1.0);
        let frame = FrameInputs {
            fields: fields.view(),
            phases: PhaseArrays::default(),
        };

        let n_iters = 10;
        let start = Instant::now();
        for i in 0..n_iters {
            let _ = renderer.render_frame(&mut canvas, &frame, i == 0);
        }
        let elapsed = start.elapsed().as_secs_f64() / n_iters as f64;
        println!(
            "  {}x{} at {}x{}: {:.2} ms/frame",
            n,
            n,
            config.width_px,
            config.height_px,
            elapsed * 1e3
        );
    }
}

fn main() {
    println!("\n{}", "#".repeat(60));
    println!("#  PhoxMesh Rust Benchmark Suite");
    println!("{}", "#".repeat(60));

    benchmark_topology();
    benchmark_build_vs_recolor();
    benchmark_raster();

    println!("\n{}", "=".repeat(60));
    println!("BENCHMARK COMPLETE");
    println!("{}", "=".repeat(60));
}
