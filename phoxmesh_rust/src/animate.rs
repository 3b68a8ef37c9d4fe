//! Field Propagation Animation
//!
//! Renders one frame per mesh layer, each exposing the propagated field of a
//! single input up to that layer, and streams the frames into a GIF or MP4
//! writer.

use ndarray::{s, Array2, ArrayView3};
use num_complex::Complex64;
use std::env;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::str::FromStr;

use crate::canvas::{Canvas, RgbFrame};
use crate::config::MOVIE_FPS;
use crate::error::{MeshError, Result};
use crate::render::{FrameInputs, MeshRenderer, PhaseArrays};

/// Authorship tag written into movie metadata.
pub const MOVIE_ARTIST: &str = "phoxmesh";

/// Environment variable overriding the ffmpeg executable.
pub const FFMPEG_ENV: &str = "PHOXMESH_FFMPEG";

/// Supported movie containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovieFormat {
    Gif,
    Mp4,
}

/// Encoder used for a movie format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderBackend {
    /// In-process GIF encoding.
    InProcessGif,
    /// Raw RGB frames piped into an ffmpeg child process.
    Ffmpeg,
}

impl MovieFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        ext.parse()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MovieFormat::Gif => "gif",
            MovieFormat::Mp4 => "mp4",
        }
    }

    pub fn encoder(&self) -> EncoderBackend {
        match self {
            MovieFormat::Gif => EncoderBackend::InProcessGif,
            MovieFormat::Mp4 => EncoderBackend::Ffmpeg,
        }
    }
}

impl FromStr for MovieFormat {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "gif" => Ok(MovieFormat::Gif),
            "mp4" => Ok(MovieFormat::Mp4),
            _ => Err(MeshError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for MovieFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovieMetadata {
    pub title: String,
    pub artist: String,
}

/// Where and how an animation is written.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationConfig {
    pub save_path: PathBuf,
    pub movie_name: String,
    pub format: MovieFormat,
    /// Figure title drawn on every frame.
    pub title: Option<String>,
    /// Input port whose propagation is shown; `num_ports / 2` when unset.
    pub input: Option<usize>,
    pub fps: u32,
}

impl AnimationConfig {
    /// Fails with `UnsupportedFormat` for anything but gif or mp4.
    pub fn new(save_path: impl Into<PathBuf>, movie_name: impl Into<String>, ext: &str) -> Result<Self> {
        Ok(Self {
            save_path: save_path.into(),
            movie_name: movie_name.into(),
            format: MovieFormat::from_extension(ext)?,
            title: None,
            input: None,
            fps: MOVIE_FPS,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_input(mut self, input: usize) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.save_path
            .join(format!("{}.{}", self.movie_name, self.format.extension()))
    }

    pub fn metadata(&self) -> MovieMetadata {
        MovieMetadata {
            title: self.movie_name.clone(),
            artist: MOVIE_ARTIST.to_string(),
        }
    }
}

/// Sink for rendered frames.
pub trait FrameWriter {
    fn write_frame(&mut self, frame: &RgbFrame) -> Result<()>;

    /// Flush and close the output. Further writes fail.
    fn finish(&mut self) -> Result<()>;

    fn frames_written(&self) -> usize;
}

fn check_frame_size(frame: &RgbFrame, width: u32, height: u32) -> Result<()> {
    if (frame.width, frame.height) != (width, height) {
        return Err(MeshError::ShapeMismatch {
            name: "frame",
            expected: vec![width as usize, height as usize],
            actual: vec![frame.width as usize, frame.height as usize],
        });
    }
    Ok(())
}

/// Animated GIF writer looping forever.
pub struct GifWriter {
    encoder: Option<gif::Encoder<BufWriter<File>>>,
    width: u16,
    height: u16,
    /// Frame delay in hundredths of a second.
    delay: u16,
    frames: usize,
}

fn gif_error(err: gif::EncodingError) -> MeshError {
    MeshError::Encoder(err.to_string())
}

impl GifWriter {
    pub fn create<P: AsRef<Path>>(path: P, width: u32, height: u32, fps: u32) -> Result<Self> {
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(MeshError::InvalidConfig(format!(
                "gif frames are limited to 65535x65535, got {}x{}",
                width, height
            )));
        };
        let file = File::create(path.as_ref())?;
        let mut encoder = gif::Encoder::new(BufWriter::new(file), w, h, &[]).map_err(gif_error)?;
        encoder.set_repeat(gif::Repeat::Infinite).map_err(gif_error)?;
        Ok(Self {
            encoder: Some(encoder),
            width: w,
            height: h,
            delay: (100 / fps.max(1)).clamp(1, u16::MAX as u32) as u16,
            frames: 0,
        })
    }
}

impl FrameWriter for GifWriter {
    fn write_frame(&mut self, frame: &RgbFrame) -> Result<()> {
        check_frame_size(frame, self.width as u32, self.height as u32)?;
        if frame.data.len() != frame.width as usize * frame.height as usize * 3 {
            return Err(MeshError::Encoder("frame buffer size mismatch".into()));
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| MeshError::Encoder("gif writer already finished".into()))?;
        let mut gif_frame = gif::Frame::from_rgb_speed(self.width, self.height, &frame.data, 10);
        gif_frame.delay = self.delay;
        encoder.write_frame(&gif_frame).map_err(gif_error)?;
        self.frames += 1;
        Ok(())
    }

    /// Write the trailer and flush, reporting any I/O failure.
    fn finish(&mut self) -> Result<()> {
        let Some(encoder) = self.encoder.take() else {
            return Ok(());
        };
        let mut sink = encoder.into_inner()?;
        sink.flush()?;
        Ok(())
    }

    fn frames_written(&self) -> usize {
        self.frames
    }
}

/// MP4 writer piping raw RGB frames into ffmpeg.
pub struct FfmpegWriter {
    child: Option<Child>,
    width: u32,
    height: u32,
    frames: usize,
}

impl FfmpegWriter {
    /// Spawn ffmpeg reading rgb24 frames on stdin. Odd frame sizes are padded
    /// to even ones for the yuv420p encoder.
    pub fn spawn<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        fps: u32,
        metadata: &MovieMetadata,
    ) -> Result<Self> {
        let ffmpeg_bin = env::var(FFMPEG_ENV).unwrap_or_else(|_| "ffmpeg".into());
        let mut cmd = Command::new(&ffmpeg_bin);
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-s")
            .arg(format!("{}x{}", width, height))
            .arg("-r")
            .arg(fps.to_string())
            .arg("-i")
            .arg("-")
            .arg("-vf")
            .arg("pad=ceil(iw/2)*2:ceil(ih/2)*2")
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg("-metadata")
            .arg(format!("title={}", metadata.title))
            .arg("-metadata")
            .arg(format!("artist={}", metadata.artist))
            .arg(path.as_ref().as_os_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|err| MeshError::Encoder(format!("failed to start {}: {}", ffmpeg_bin, err)))?;
        log::debug!("spawned {} for {}", ffmpeg_bin, path.as_ref().display());
        Ok(Self {
            child: Some(child),
            width,
            height,
            frames: 0,
        })
    }
}

impl FrameWriter for FfmpegWriter {
    fn write_frame(&mut self, frame: &RgbFrame) -> Result<()> {
        check_frame_size(frame, self.width, self.height)?;
        let stdin = self
            .child
            .as_mut()
            .and_then(|child| child.stdin.as_mut())
            .ok_or_else(|| MeshError::Encoder("ffmpeg writer already finished".into()))?;
        stdin.write_all(&frame.data)?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        drop(child.stdin.take());
        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(MeshError::Encoder(format!(
                "ffmpeg exited with {}: {}",
                output.status, stderr
            )));
        }
        Ok(())
    }

    fn frames_written(&self) -> usize {
        self.frames
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            drop(child.stdin.take());
            // Read stderr to the end before reaping
            if let Err(err) = child.wait_with_output() {
                log::warn!("ffmpeg did not exit cleanly: {}", err);
            }
        }
    }
}

/// Open the writer for `config`, creating the output directory if needed.
pub fn open_writer(config: &AnimationConfig, width: u32, height: u32) -> Result<Box<dyn FrameWriter>> {
    fs::create_dir_all(&config.save_path)?;
    let path = config.output_path();
    let writer: Box<dyn FrameWriter> = match config.format.encoder() {
        EncoderBackend::InProcessGif => Box::new(GifWriter::create(&path, width, height, config.fps)?),
        EncoderBackend::Ffmpeg => Box::new(FfmpegWriter::spawn(
            &path,
            width,
            height,
            config.fps,
            &config.metadata(),
        )?),
    };
    Ok(writer)
}

/// Field of `input` after propagating through layers `0..=layer`.
///
/// `snapshots` is indexed [layer][port][input]. The result is indexed
/// [port][sub_layer], one column per snapshot, with columns past `layer`
/// left at zero.
pub fn propagated_to_layer(
    snapshots: ArrayView3<Complex64>,
    input: usize,
    layer: usize,
) -> Result<Array2<Complex64>> {
    let (layers, ports, inputs) = snapshots.dim();
    if input >= inputs || layer >= layers {
        return Err(MeshError::ShapeMismatch {
            name: "field_snapshots",
            expected: vec![layer + 1, ports, input + 1],
            actual: vec![layers, ports, inputs],
        });
    }
    let mut fields = Array2::zeros((ports, layers));
    for col in 0..=layer {
        fields
            .column_mut(col)
            .assign(&snapshots.slice(s![col, .., input]));
    }
    Ok(fields)
}

/// Render every layer into `writer`, first frame with a full build.
///
/// Returns the number of frames written.
pub fn animate_with_writer(
    renderer: &mut MeshRenderer,
    canvas: &mut dyn Canvas,
    snapshots: ArrayView3<Complex64>,
    phases: PhaseArrays,
    input: usize,
    writer: &mut dyn FrameWriter,
) -> Result<usize> {
    let layers = snapshots.dim().0;
    for layer in 0..layers {
        let fields = propagated_to_layer(snapshots, input, layer)?;
        let frame = FrameInputs {
            fields: fields.view(),
            phases: phases.reborrow(),
        };
        let pass = renderer.render_frame(canvas, &frame, layer == 0)?;
        writer.write_frame(&canvas.frame())?;
        log::debug!("frame {}/{} ({:?})", layer + 1, layers, pass);
    }
    Ok(writer.frames_written())
}

fn validate_snapshots(snapshots: ArrayView3<Complex64>, num_ports: usize, input: usize) -> Result<()> {
    let (layers, ports, inputs) = snapshots.dim();
    if layers == 0 || ports != num_ports || input >= inputs {
        return Err(MeshError::ShapeMismatch {
            name: "field_snapshots",
            expected: vec![1, num_ports, input + 1],
            actual: vec![layers, ports, inputs],
        });
    }
    Ok(())
}

/// Animate the propagation of one input through the mesh.
///
/// Input shapes are checked before the output file is opened. Returns the
/// path of the written movie.
pub fn animate_field_propagation(
    renderer: &mut MeshRenderer,
    canvas: &mut dyn Canvas,
    snapshots: ArrayView3<Complex64>,
    phases: PhaseArrays,
    config: &AnimationConfig,
) -> Result<PathBuf> {
    let num_ports = renderer.layout().num_ports;
    let input = config.input.unwrap_or(num_ports / 2);
    validate_snapshots(snapshots, num_ports, input)?;

    let (width, height) = canvas.size();
    let mut writer = open_writer(config, width, height)?;
    canvas.set_title(config.title.as_deref());

    let frames = animate_with_writer(renderer, canvas, snapshots, phases, input, writer.as_mut())?;
    writer.finish()?;

    let path = config.output_path();
    log::info!("wrote {} frames to {}", frames, path.display());
    Ok(path)
}
