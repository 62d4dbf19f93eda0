//! Raster ticket renderer backed by `image`, `imageproc` and `qrcode`.
//!
//! The ticket is drawn back to front: canvas, border, stripes, logo, the
//! control number glyphs and finally the QR code in the corner opposite the
//! logo. The PNG is returned base64 encoded.

use std::io::Cursor;

use ab_glyph::{FontVec, PxScale};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use qrcode::{Color, EcLevel, QrCode};
use tracing::warn;

use super::config::{ControlNumberImageConfig, fill_template};
use crate::domain::ControlNumber;
use crate::domain::ports::{ControlNumberRenderer, RenderError};
use crate::files::read_file;

/// Modules of blank margin drawn around the QR symbol on each side.
const QR_QUIET_ZONE: usize = 2;

/// Renders control-number tickets from a fixed configuration.
///
/// Assets are loaded once at construction. A missing font or unreadable logo
/// does not prevent start-up; every render reports the failure instead.
pub struct ImageControlNumberRenderer {
    config: ControlNumberImageConfig,
    font: Result<FontVec, String>,
    logo: Option<Result<RgbaImage, String>>,
}

impl ImageControlNumberRenderer {
    pub fn new(config: ControlNumberImageConfig) -> Self {
        let font = load_font(&config);
        let logo = config.logo_path.as_deref().map(|path| {
            read_file(path)
                .map_err(|err| format!("{}: {err}", path.display()))
                .and_then(|bytes| {
                    image::load_from_memory(&bytes)
                        .map(|decoded| decoded.to_rgba8())
                        .map_err(|err| format!("{}: {err}", path.display()))
                })
        });
        if let Err(message) = &font {
            warn!(%message, "control number font could not be loaded");
        }
        if let Some(Err(message)) = &logo {
            warn!(%message, "control number logo could not be loaded");
        }
        Self { config, font, logo }
    }

    pub fn config(&self) -> &ControlNumberImageConfig {
        &self.config
    }

    fn draw(
        &self,
        control_number: ControlNumber,
        cr: &str,
        verification_code: &str,
    ) -> Result<RgbaImage, RenderError> {
        let font = self
            .font
            .as_ref()
            .map_err(|message| RenderError::font_missing(message.clone()))?;
        let config = &self.config;
        if config.width == 0 || config.height == 0 {
            return Err(RenderError::failed(
                "allocate canvas",
                format!("invalid size {}x{}", config.width, config.height),
            ));
        }

        let mut canvas = RgbaImage::from_pixel(config.width, config.height, config.canvas_color);
        draw_border(&mut canvas, config);
        draw_stripes(&mut canvas, config);

        match &self.logo {
            Some(Ok(logo)) => {
                let inset = i64::from(config.corner_inset());
                imageops::overlay(&mut canvas, logo, inset, inset);
            }
            Some(Err(message)) => return Err(RenderError::failed("load logo", message)),
            None => {}
        }

        let text = control_number.to_string();
        draw_centered_text(&mut canvas, config, font, &text);

        let payload = fill_template(
            &config.qr_url_template,
            &[cr, text.as_str(), verification_code],
        );
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::Q)
            .map_err(|err| RenderError::failed("encode QR code", err))?;
        draw_qr(&mut canvas, config, &code);
        Ok(canvas)
    }
}

impl ControlNumberRenderer for ImageControlNumberRenderer {
    fn render(
        &self,
        control_number: ControlNumber,
        cr: &str,
        verification_code: &str,
    ) -> Result<String, RenderError> {
        let canvas = self.draw(control_number, cr, verification_code)?;
        let mut png = Cursor::new(Vec::new());
        canvas
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|err| RenderError::failed("encode PNG", err))?;
        Ok(STANDARD.encode(png.into_inner()))
    }
}

fn load_font(config: &ControlNumberImageConfig) -> Result<FontVec, String> {
    let path = &config.font_path;
    let bytes = read_file(path).map_err(|err| format!("{}: {err}", path.display()))?;
    FontVec::try_from_vec(bytes).map_err(|err| format!("{}: {err}", path.display()))
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Fill a rectangle, ignoring empty ones.
fn fill(canvas: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    if width == 0 || height == 0 {
        return;
    }
    let rect = Rect::at(to_i32(x), to_i32(y)).of_size(width, height);
    draw_filled_rect_mut(canvas, rect, color);
}

/// Inner drawing area as `(left, top, width, height)`.
fn inner_area(config: &ControlNumberImageConfig) -> (u32, u32, u32, u32) {
    let inset = config.border_pad.saturating_add(config.border_thickness);
    (
        inset,
        inset,
        config.width.saturating_sub(inset.saturating_mul(2)),
        config.height.saturating_sub(inset.saturating_mul(2)),
    )
}

fn draw_border(canvas: &mut RgbaImage, config: &ControlNumberImageConfig) {
    if config.border_thickness == 0 {
        return;
    }
    let pad = config.border_pad;
    fill(
        canvas,
        pad,
        pad,
        config.width.saturating_sub(pad.saturating_mul(2)),
        config.height.saturating_sub(pad.saturating_mul(2)),
        config.border_color,
    );
    let (left, top, width, height) = inner_area(config);
    fill(canvas, left, top, width, height, config.canvas_color);
}

fn draw_stripes(canvas: &mut RgbaImage, config: &ControlNumberImageConfig) {
    if config.line_spacing == 0 || config.line_thickness == 0 {
        return;
    }
    let (left, top, width, height) = inner_area(config);
    let bottom = top.saturating_add(height);
    let mut y = top;
    while y < bottom {
        let thickness = config.line_thickness.min(bottom - y);
        fill(canvas, left, y, width, thickness, config.line_color);
        y = y.saturating_add(config.line_spacing);
    }
}

fn draw_centered_text(
    canvas: &mut RgbaImage,
    config: &ControlNumberImageConfig,
    font: &FontVec,
    text: &str,
) {
    let scale = PxScale::from(config.font_size);
    let (text_width, text_height) = text_size(scale, font, text);
    let x = (i64::from(config.width) - i64::from(text_width)) / 2;
    let y = (i64::from(config.height) - i64::from(text_height)) / 2;
    let x = i32::try_from(x).unwrap_or(0);
    let y = i32::try_from(y).unwrap_or(0);
    draw_text_mut(canvas, config.font_color, x, y, scale, font, text);
}

fn draw_qr(canvas: &mut RgbaImage, config: &ControlNumberImageConfig, code: &QrCode) {
    let size = config.qr_size;
    if size == 0 {
        return;
    }
    let modules = code.width();
    let colors = code.to_colors();
    let span = modules + QR_QUIET_ZONE * 2;
    let inset = config.corner_inset().saturating_add(size);
    let origin_x = config.width.saturating_sub(inset);
    let origin_y = config.height.saturating_sub(inset);

    let module_at = |pixel: u32| -> Option<usize> {
        let scaled = usize::try_from(pixel).ok()? * span / usize::try_from(size).ok()?;
        scaled
            .checked_sub(QR_QUIET_ZONE)
            .filter(|module| *module < modules)
    };

    for py in 0..size {
        let row = module_at(py);
        for px in 0..size {
            let (x, y) = (origin_x + px, origin_y + py);
            if x >= canvas.width() || y >= canvas.height() {
                continue;
            }
            let dark = match (module_at(px), row) {
                (Some(column), Some(row)) => {
                    matches!(colors.get(row * modules + column), Some(Color::Dark))
                }
                _ => false,
            };
            let color = if dark {
                config.font_color
            } else {
                config.canvas_color
            };
            canvas.put_pixel(x, y, color);
        }
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
