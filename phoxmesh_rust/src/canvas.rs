//! Drawing Canvas
//!
//! The renderer draws onto a `Canvas`. `BitmapCanvas` rasterizes patch
//! collections into an RGB buffer through the plotters bitmap backend.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use crate::color::{Rgba, BACKGROUND_COLOR, LABEL_COLOR};
use crate::error::{MeshError, Result};
use crate::labels::{HAlign, Label, VAlign};
use crate::patch::PatchCollection;

const FONT_FAMILY: &str = "sans-serif";

/// Register the font used for labels and titles.
///
/// Without a registered font, text overlays are skipped.
pub fn register_label_font(bytes: &'static [u8]) -> Result<()> {
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| MeshError::Raster("invalid label font data".into()))
}

/// Visible region in mesh-centered coordinates.
///
/// `y_top` maps to the first pixel row, so y grows downward when
/// `y_top < y_bottom`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_top: f64,
    pub y_bottom: f64,
}

impl Viewport {
    /// View of a mesh with bounding box `dim`, padded by the given factors.
    pub fn around_mesh(dim: (f64, f64), x_padding: f64, y_padding: f64) -> Self {
        Self {
            x_min: -x_padding * dim.0 / 2.0,
            x_max: x_padding * dim.0 / 2.0,
            y_top: -y_padding * dim.1 / 2.0,
            y_bottom: y_padding * dim.1 / 2.0,
        }
    }

    pub fn to_pixel(&self, p: [f64; 2], width: u32, height: u32) -> (i32, i32) {
        let span = |a: f64, b: f64| if (b - a).abs() > f64::EPSILON { b - a } else { 1.0 };
        let fx = (p[0] - self.x_min) / span(self.x_min, self.x_max);
        let fy = (p[1] - self.y_top) / span(self.y_top, self.y_bottom);
        (
            (fx * width as f64).round() as i32,
            (fy * height as f64).round() as i32,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x_min: -1.0,
            x_max: 1.0,
            y_top: -1.0,
            y_bottom: 1.0,
        }
    }
}

/// One captured RGB frame, row-major, 3 bytes per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbFrame {
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| MeshError::Raster("frame buffer size mismatch".into()))?;
        image.save(path)?;
        Ok(())
    }
}

/// Drawing surface for patch collections.
pub trait Canvas {
    /// Reset the view and background before a full redraw.
    fn configure(&mut self, viewport: Viewport, background: Rgba);

    /// Title drawn above the mesh on every redraw.
    fn set_title(&mut self, title: Option<&str>);

    /// Draw the collection, then the labels on top.
    fn draw(&mut self, collection: &PatchCollection, labels: &[Label]) -> Result<()>;

    /// Snapshot of the current drawing.
    fn frame(&self) -> RgbFrame;

    fn size(&self) -> (u32, u32);
}

/// Canvas rendering into an in-memory RGB bitmap.
pub struct BitmapCanvas {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
    viewport: Viewport,
    background: Rgba,
    title: Option<String>,
    title_size: f64,
}

impl BitmapCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![0u8; width as usize * height as usize * 3],
            viewport: Viewport::default(),
            background: BACKGROUND_COLOR,
            title: None,
            title_size: (height as f64 / 30.0).max(8.0),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn raster_error<E: std::fmt::Display>(err: E) -> MeshError {
    MeshError::Raster(err.to_string())
}

fn text_anchor(label: &Label) -> Pos {
    let h = match label.h_align {
        HAlign::Left => HPos::Left,
        HAlign::Center => HPos::Center,
        HAlign::Right => HPos::Right,
    };
    let v = match label.v_align {
        VAlign::Top => VPos::Top,
        VAlign::Center => VPos::Center,
        VAlign::Bottom => VPos::Bottom,
    };
    Pos::new(h, v)
}

fn draw_text(area: &Area<'_>, text: &str, at: (i32, i32), size: f64, color: Rgba, pos: Pos) -> Result<()> {
    let style = (FONT_FAMILY, size)
        .into_font()
        .color(&color.to_plotters())
        .pos(pos);
    area.draw(&Text::new(text, at, style))
        .map_err(raster_error)
}

impl Canvas for BitmapCanvas {
    fn configure(&mut self, viewport: Viewport, background: Rgba) {
        self.viewport = viewport;
        self.background = background;
    }

    fn set_title(&mut self, title: Option<&str>) {
        self.title = title.map(str::to_owned);
    }

    fn draw(&mut self, collection: &PatchCollection, labels: &[Label]) -> Result<()> {
        let (width, height) = (self.width, self.height);
        let viewport = self.viewport;
        let background = self.background;
        let title = self.title.clone();
        let title_size = self.title_size;

        let area = BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        area.fill(&background.to_plotters()).map_err(raster_error)?;

        for (polygon, color) in collection.iter() {
            if color.a <= 0.0 {
                continue;
            }
            let points: Vec<(i32, i32)> = polygon
                .points
                .iter()
                .map(|&p| viewport.to_pixel(p, width, height))
                .collect();
            area.draw(&Polygon::new(points, color.to_plotters().filled()))
                .map_err(raster_error)?;
        }

        for label in labels {
            let at = viewport.to_pixel(label.position, width, height);
            if let Err(err) = draw_text(&area, &label.text, at, label.size, label.color, text_anchor(label)) {
                log::warn!("skipping labels: {}", err);
                break;
            }
        }

        if let Some(title) = title {
            let at = ((width / 2) as i32, (title_size / 2.0) as i32);
            let pos = Pos::new(HPos::Center, VPos::Top);
            if let Err(err) = draw_text(&area, &title, at, title_size, LABEL_COLOR, pos) {
                log::warn!("skipping title: {}", err);
            }
        }

        area.present().map_err(raster_error)
    }

    fn frame(&self) -> RgbFrame {
        RgbFrame {
            width: self.width,
            height: self.height,
            data: self.buffer.clone(),
        }
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
