//! Image drawing with Unicode `▀` half-blocks (2 pixels per cell).
//!
//! Terminal cells are ~2× taller than wide, so each cell represents 1 pixel
//! wide × 2 pixels tall.

use image::imageops::FilterType;
use image::RgbaImage;
use ratatui::{buffer::Buffer, layout::Position, layout::Rect, style::Color};

use crate::core::viewport::{Rotation, ViewportState};

/// Draw `img` fitted inside `area`, aspect preserved and centred
/// horizontally.  Never upscales.
pub fn render_fit(img: &RgbaImage, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 || img.width() == 0 || img.height() == 0 {
        return;
    }

    let max_px_w = area.width as f64;
    let max_px_h = (area.height as f64) * 2.0;
    let src_w = img.width() as f64;
    let src_h = img.height() as f64;

    let scale = (max_px_w / src_w).min(max_px_h / src_h).min(1.0);
    let fit_w = (src_w * scale).round().max(1.0) as u32;
    let fit_h = (src_h * scale).round().max(1.0) as u32;

    let rgba = image::imageops::resize(img, fit_w, fit_h, FilterType::Triangle);
    let (iw, ih) = (rgba.width(), rgba.height());
    let col_offset = (area.width.saturating_sub(iw as u16)) / 2;

    for row in 0..area.height {
        let yt = (row as u32) * 2;
        let yb = yt + 1;
        if yt >= ih {
            break;
        }
        for col in 0..iw.min(area.width as u32) {
            let fg = rgb(rgba.get_pixel(col, yt));
            let bg = if yb < ih {
                rgb(rgba.get_pixel(col, yb))
            } else {
                Color::Reset
            };
            put(buf, area.x + col_offset + col as u16, area.y + row, fg, bg);
        }
    }
}

/// Draw `img` under the viewer transform: fitted to `area`, then scaled by
/// `zoom`, rotated clockwise and shifted by the rendered offset (in
/// half-block pixels).  Sampling is nearest-neighbour.
pub fn render_transformed(img: &RgbaImage, area: Rect, view: &ViewportState, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 || img.width() == 0 || img.height() == 0 {
        return;
    }

    let screen_w = area.width as f64;
    let screen_h = area.height as f64 * 2.0;
    let (src_w, src_h) = (img.width() as f64, img.height() as f64);
    let (fit_w, fit_h) = if view.rotation.is_sideways() {
        (src_h, src_w)
    } else {
        (src_w, src_h)
    };
    let scale = (screen_w / fit_w).min(screen_h / fit_h).min(1.0) * view.zoom;
    if scale <= 0.0 || !scale.is_finite() {
        return;
    }
    let offset = view.rendered_offset();

    let sample = |px: u32, py: u32| -> Option<Color> {
        let u = (px as f64 + 0.5 - screen_w / 2.0 - offset.x) / scale;
        let v = (py as f64 + 0.5 - screen_h / 2.0 - offset.y) / scale;
        let (x, y) = unrotate(u, v, view.rotation);
        let sx = x + src_w / 2.0;
        let sy = y + src_h / 2.0;
        if sx < 0.0 || sy < 0.0 || sx >= src_w || sy >= src_h {
            return None;
        }
        Some(rgb(img.get_pixel(sx as u32, sy as u32)))
    };

    for row in 0..area.height {
        for col in 0..area.width {
            let top = sample(col as u32, row as u32 * 2);
            let bottom = sample(col as u32, row as u32 * 2 + 1);
            if top.is_none() && bottom.is_none() {
                continue;
            }
            put(
                buf,
                area.x + col,
                area.y + row,
                top.unwrap_or(Color::Reset),
                bottom.unwrap_or(Color::Reset),
            );
        }
    }
}

/// Map a point of the clockwise-rotated picture back onto the source.
fn unrotate(u: f64, v: f64, rotation: Rotation) -> (f64, f64) {
    match rotation {
        Rotation::Deg0 => (u, v),
        Rotation::Deg90 => (v, -u),
        Rotation::Deg180 => (-u, -v),
        Rotation::Deg270 => (-v, u),
    }
}

fn rgb(p: &image::Rgba<u8>) -> Color {
    Color::Rgb(p[0], p[1], p[2])
}

fn put(buf: &mut Buffer, x: u16, y: u16, fg: Color, bg: Color) {
    if let Some(cell) = buf.cell_mut(Position::new(x, y)) {
        cell.set_char('▀').set_fg(fg).set_bg(bg);
    }
}
