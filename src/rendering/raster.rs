/// Rasterizer: paints a command list onto a tiny-skia pixmap and encodes PNG
use tiny_skia::{
    Color, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap, Point, Rect, SpreadMode, Stroke,
    Transform,
};

use crate::rendering::paint::{PaintCommand, Rgba};
use crate::rendering::qr::CodeMatrix;
use crate::rendering::text::TextEngine;
use crate::{Error, Result};

fn color(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba.0, rgba.1, rgba.2, rgba.3)
}

fn solid(rgba: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.0, rgba.1, rgba.2, rgba.3);
    paint.anti_alias = true;
    paint
}

fn rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<tiny_skia::Path> {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

fn paint_code(pixmap: &mut Pixmap, x: f32, y: f32, size: f32, quiet_zone: usize, matrix: &CodeMatrix, dark: Rgba, light: Rgba) {
    if let Some(rect) = Rect::from_xywh(x, y, size, size) {
        pixmap.fill_rect(rect, &solid(light), Transform::identity(), None);
    }
    let modules = matrix.width() + quiet_zone * 2;
    // Whole pixels per module keep the edges crisp for scanners.
    let module = (size / modules as f32).floor().max(1.0);
    let offset = ((size - module * modules as f32) / 2.0).floor();
    let origin_x = x + offset + module * quiet_zone as f32;
    let origin_y = y + offset + module * quiet_zone as f32;
    let mut paint = solid(dark);
    paint.anti_alias = false;
    for my in 0..matrix.width() {
        for mx in 0..matrix.width() {
            if !matrix.is_dark(mx, my) {
                continue;
            }
            if let Some(rect) = Rect::from_xywh(origin_x + module * mx as f32, origin_y + module * my as f32, module, module) {
                pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
    }
}

/// Paint `commands` in order onto a fresh `width`×`height` pixmap.
pub fn rasterize<E: TextEngine + ?Sized>(commands: &[PaintCommand], width: u32, height: u32, engine: &mut E) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::RenderError(format!("cannot allocate {}x{} surface", width, height)))?;

    for cmd in commands {
        match cmd {
            PaintCommand::VerticalGradient { top, bottom } => {
                let shader = LinearGradient::new(
                    Point::from_xy(0.0, 0.0),
                    Point::from_xy(0.0, height as f32),
                    vec![GradientStop::new(0.0, color(*top)), GradientStop::new(1.0, color(*bottom))],
                    SpreadMode::Pad,
                    Transform::identity(),
                )
                .ok_or_else(|| Error::RenderError("invalid gradient".into()))?;
                let paint = Paint { shader, ..Paint::default() };
                if let Some(rect) = Rect::from_xywh(0.0, 0.0, width as f32, height as f32) {
                    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
            PaintCommand::RoundedBorder { x, y, width, height, radius, stroke_width, rgba } => {
                if let Some(path) = rounded_rect(*x, *y, *width, *height, *radius) {
                    let stroke = Stroke { width: *stroke_width, ..Stroke::default() };
                    pixmap.stroke_path(&path, &solid(*rgba), &stroke, Transform::identity(), None);
                }
            }
            PaintCommand::Line { x1, y1, x2, y2, stroke_width, rgba } => {
                let mut pb = PathBuilder::new();
                pb.move_to(*x1, *y1);
                pb.line_to(*x2, *y2);
                if let Some(path) = pb.finish() {
                    let stroke = Stroke { width: *stroke_width, ..Stroke::default() };
                    pixmap.stroke_path(&path, &solid(*rgba), &stroke, Transform::identity(), None);
                }
            }
            PaintCommand::Text { x, y, text, style, rgba } => {
                engine.draw(&mut pixmap, text, style, *x, *y, *rgba);
            }
            PaintCommand::Code { x, y, size, quiet_zone, matrix, dark, light } => {
                paint_code(&mut pixmap, *x, *y, *size, *quiet_zone, matrix, *dark, *light);
            }
        }
    }

    Ok(pixmap)
}

pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| Error::RenderError(format!("PNG encoding failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::qr::{CodeEncoder, QrEncoder};
    use crate::rendering::text::BlockGlyphs;

    #[test]
    fn gradient_runs_top_to_bottom() {
        let cmds = vec![PaintCommand::VerticalGradient { top: (0, 0, 0, 255), bottom: (200, 200, 200, 255) }];
        let pixmap = rasterize(&cmds, 16, 100, &mut BlockGlyphs::new()).unwrap();
        let top = pixmap.pixel(8, 0).unwrap();
        let bottom = pixmap.pixel(8, 99).unwrap();
        assert!(top.red() < bottom.red());
        assert_eq!(top.alpha(), 255);
    }

    #[test]
    fn code_has_light_quiet_zone_and_dark_finder() {
        let matrix = QrEncoder::new().encode("https://example.app").unwrap();
        let cmds = vec![PaintCommand::Code {
            x: 0.0,
            y: 0.0,
            size: 100.0,
            quiet_zone: 2,
            matrix: matrix.clone(),
            dark: (0, 0, 0, 255),
            light: (255, 255, 255, 255),
        }];
        let pixmap = rasterize(&cmds, 100, 100, &mut BlockGlyphs::new()).unwrap();
        let corner = pixmap.pixel(0, 0).unwrap();
        assert_eq!((corner.red(), corner.alpha()), (255, 255));

        let modules = (matrix.width() + 4) as u32;
        let module = 100 / modules;
        let offset = (100 - module * modules) / 2;
        let first = offset + module * 2;
        let finder = pixmap.pixel(first, first).unwrap();
        assert_eq!((finder.red(), finder.alpha()), (0, 255));
    }

    #[test]
    fn encoded_png_has_signature() {
        let pixmap = rasterize(&[], 8, 8, &mut BlockGlyphs::new()).unwrap();
        let png = encode_png(&pixmap).unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn zero_sized_surface_is_an_error() {
        let err = rasterize(&[], 0, 10, &mut BlockGlyphs::new()).unwrap_err();
        assert_eq!(err.reason(), "render_error");
    }
}
