//! PhoxMesh command line renderer

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use phoxmesh::animate::{animate_field_propagation, propagated_to_layer, AnimationConfig};
use phoxmesh::canvas::{register_label_font, BitmapCanvas, Canvas};
use phoxmesh::config::RenderConfig;
use phoxmesh::geometry::{MeshLayout, MziGeometry};
use phoxmesh::render::{FrameInputs, MeshRenderer};
use phoxmesh::scene::MeshScene;
use phoxmesh::{MeshError, Result};

const USAGE: &str = "\
Usage: mesh_render <COMMAND> [OPTIONS]

Commands:
  demo      Role-colored diagram of a rectangular mesh
  frame     Single frame of a scene's field propagation
  animate   Movie of a scene's field propagation

Options:
  --config <path>        Load render configuration JSON
  --font <path>          TTF/OTF font used for labels and titles
  --label-size <px>      Label font size (labels are off when unset)
  --output <path>        PNG output (demo, frame)
  --ports <n>            Port count (demo, default: 8)
  --depth <n>            Layer count (demo, default: ports)
  --scene <path>         Scene JSON (frame, animate)
  --layer <n>            Last propagated layer (frame, default: last)
  --input <n>            Input port (frame, animate, default: ports / 2)
  --save-path <dir>      Output directory (animate, default: .)
  --name <movie>         Movie name (animate, default: propagation)
  --format <ext>         gif or mp4 (animate, default: mp4)
  --title <text>         Title drawn on every frame (animate)";

#[derive(Debug, Default)]
struct Args {
    command: String,
    config: Option<String>,
    font: Option<PathBuf>,
    label_size: Option<f64>,
    output: Option<PathBuf>,
    ports: usize,
    depth: Option<usize>,
    scene: Option<String>,
    layer: Option<usize>,
    input: Option<usize>,
    save_path: PathBuf,
    name: String,
    format: String,
    title: Option<String>,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| MeshError::InvalidConfig(format!("missing value for {}", flag)))
}

fn parse<T: FromStr>(args: &[String], i: usize, flag: &str) -> Result<T> {
    let raw = value(args, i, flag)?;
    raw.parse()
        .map_err(|_| MeshError::InvalidConfig(format!("invalid {} value '{}'", flag, raw)))
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args {
        ports: 8,
        save_path: PathBuf::from("."),
        name: "propagation".into(),
        format: "mp4".into(),
        ..Args::default()
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" => {
                i += 1;
                parsed.config = Some(value(args, i, flag)?.to_string());
            }
            "--font" => {
                i += 1;
                parsed.font = Some(PathBuf::from(value(args, i, flag)?));
            }
            "--label-size" => {
                i += 1;
                parsed.label_size = Some(parse(args, i, flag)?);
            }
            "--output" => {
                i += 1;
                parsed.output = Some(PathBuf::from(value(args, i, flag)?));
            }
            "--ports" => {
                i += 1;
                parsed.ports = parse(args, i, flag)?;
            }
            "--depth" => {
                i += 1;
                parsed.depth = Some(parse(args, i, flag)?);
            }
            "--scene" => {
                i += 1;
                parsed.scene = Some(value(args, i, flag)?.to_string());
            }
            "--layer" => {
                i += 1;
                parsed.layer = Some(parse(args, i, flag)?);
            }
            "--input" => {
                i += 1;
                parsed.input = Some(parse(args, i, flag)?);
            }
            "--save-path" => {
                i += 1;
                parsed.save_path = PathBuf::from(value(args, i, flag)?);
            }
            "--name" => {
                i += 1;
                parsed.name = value(args, i, flag)?.to_string();
            }
            "--format" => {
                i += 1;
                parsed.format = value(args, i, flag)?.to_string();
            }
            "--title" => {
                i += 1;
                parsed.title = Some(value(args, i, flag)?.to_string());
            }
            "--help" | "-h" => {
                eprintln!("{}", USAGE);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(MeshError::InvalidConfig(format!("unknown argument: {}", other)));
            }
            other if parsed.command.is_empty() => parsed.command = other.to_string(),
            other => {
                return Err(MeshError::InvalidConfig(format!("unexpected argument: {}", other)));
            }
        }
        i += 1;
    }
    Ok(parsed)
}

fn render_config(args: &Args, base: RenderConfig) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => base,
    };
    if args.label_size.is_some() {
        config.label_size = args.label_size;
    }
    Ok(config)
}

fn load_font(args: &Args) -> Result<()> {
    let Some(path) = &args.font else {
        return Ok(());
    };
    let bytes = std::fs::read(path)?;
    register_label_font(Box::leak(bytes.into_boxed_slice()))?;
    log::info!("Registered label font {}", path.display());
    Ok(())
}

fn required<'a, T>(opt: &'a Option<T>, flag: &str) -> Result<&'a T> {
    opt.as_ref()
        .ok_or_else(|| MeshError::InvalidConfig(format!("{} is required", flag)))
}

fn run_demo(args: &Args) -> Result<()> {
    let output = required(&args.output, "--output")?;
    let config = render_config(args, RenderConfig::demo())?;
    let depth = args.depth.unwrap_or(args.ports);
    let layout = MeshLayout::rectangular(MziGeometry::default(), args.ports, depth, 10.0);

    let mut canvas = BitmapCanvas::new(config.width_px, config.height_px);
    let mut renderer = MeshRenderer::new(layout, config)?;
    renderer.render_demo(&mut canvas)?;
    canvas.frame().save_png(output)?;
    log::info!("Saved {}x{} mesh diagram to {}", args.ports, depth, output.display());
    Ok(())
}

fn run_frame(args: &Args) -> Result<()> {
    let output = required(&args.output, "--output")?;
    let scene = MeshScene::load(required(&args.scene, "--scene")?)?;
    let config = render_config(args, RenderConfig::default())?;

    let layers = scene.field_snapshots.dim().0;
    let layer = args.layer.unwrap_or(layers.saturating_sub(1));
    let input = args.input.unwrap_or(scene.num_ports / 2);
    let fields = propagated_to_layer(scene.field_snapshots.view(), input, layer)?;

    let mut canvas = BitmapCanvas::new(config.width_px, config.height_px);
    let mut renderer = MeshRenderer::new(scene.layout(), config)?;
    let frame = FrameInputs {
        fields: fields.view(),
        phases: scene.phases(),
    };
    renderer.render_frame(&mut canvas, &frame, true)?;
    canvas.frame().save_png(output)?;
    log::info!("Saved layer {} of input {} to {}", layer, input, output.display());
    Ok(())
}

fn run_animate(args: &Args) -> Result<()> {
    let mut animation = AnimationConfig::new(&args.save_path, args.name.as_str(), &args.format)?;
    let scene = MeshScene::load(required(&args.scene, "--scene")?)?;
    let config = render_config(args, RenderConfig::default())?;
    if let Some(title) = &args.title {
        animation = animation.with_title(title.as_str());
    }
    if let Some(input) = args.input {
        animation = animation.with_input(input);
    }
    animation = animation.with_fps(config.fps);

    let mut canvas = BitmapCanvas::new(config.width_px, config.height_px);
    let mut renderer = MeshRenderer::new(scene.layout(), config)?;
    animate_field_propagation(
        &mut renderer,
        &mut canvas,
        scene.field_snapshots.view(),
        scene.phases(),
        &animation,
    )?;
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    load_font(args)?;
    match args.command.as_str() {
        "demo" => run_demo(args),
        "frame" => run_frame(args),
        "animate" => run_animate(args),
        "" => Err(MeshError::InvalidConfig("no command given".into())),
        other => Err(MeshError::InvalidConfig(format!("unknown command: {}", other))),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = std::env::args().collect();
    let result = parse_args(&argv).and_then(|args| run(&args));
    if let Err(err) = result {
        eprintln!("Error: {}", err);
        eprintln!("{}", USAGE);
        process::exit(1);
    }
}
