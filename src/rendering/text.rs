//! Text measurement and glyph drawing backends.
//!
//! Layout only needs [`TextMeasure`]; the rasterizer needs the full
//! [`TextEngine`]. Two engines ship with the crate:
//! - [`FontEngine`] shapes and rasterizes real fonts through cosmic-text.
//! - [`BlockGlyphs`] needs no fonts at all: every character has a fixed
//!   advance and is painted as a solid block. Output is identical on every
//!   host, which makes it the engine of choice for goldens and benches.

use std::path::PathBuf;

use cosmic_text::{
    fontdb, Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight,
};
use tiny_skia::{Paint, Pixmap, Rect, Transform};

use crate::rendering::paint::{Rgba, TextStyle};
use crate::{Error, Result};

/// Width of a single line of text in pixels.
pub trait TextMeasure {
    fn measure(&mut self, text: &str, style: &TextStyle) -> f32;
}

/// A measurer that can also paint text onto a pixmap.
pub trait TextEngine: TextMeasure {
    /// Draw `text` with its baseline at `y`, starting at `x`.
    fn draw(&mut self, pixmap: &mut Pixmap, text: &str, style: &TextStyle, x: f32, y: f32, rgba: Rgba);
}

/// Where [`FontEngine`] finds its fonts.
#[derive(Debug, Clone)]
pub struct FontSources {
    /// Extra font files (TTF/OTF/TTC) loaded before anything else
    pub paths: Vec<PathBuf>,
    /// Whether to also scan the host's installed fonts
    pub system_fonts: bool,
    /// Locale used for fallback font selection
    pub locale: String,
}

impl Default for FontSources {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            system_fonts: true,
            locale: "zh-CN".to_string(),
        }
    }
}

/// cosmic-text backed engine.
pub struct FontEngine {
    font_system: FontSystem,
    cache: SwashCache,
}

impl FontEngine {
    pub fn new(sources: &FontSources) -> Result<Self> {
        let mut db = fontdb::Database::new();
        for path in &sources.paths {
            db.load_font_file(path).map_err(|e| {
                Error::ConfigError(format!("cannot load font {}: {}", path.display(), e))
            })?;
        }
        if sources.system_fonts {
            db.load_system_fonts();
        }
        if db.is_empty() {
            log::warn!("no fonts available; card text will not be visible");
        } else {
            log::debug!("font database holds {} faces", db.len());
        }
        Ok(Self {
            font_system: FontSystem::new_with_locale_and_db(sources.locale.clone(), db),
            cache: SwashCache::new(),
        })
    }

    fn shape(&mut self, text: &str, style: &TextStyle) -> Buffer {
        let metrics = Metrics::new(style.size, style.size * 1.25);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);
        let attrs = Attrs::new()
            .family(Family::SansSerif)
            .weight(Weight(style.weight.value()));
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }
}

impl TextMeasure for FontEngine {
    fn measure(&mut self, text: &str, style: &TextStyle) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let buffer = self.shape(text, style);
        buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0, f32::max)
    }
}

impl TextEngine for FontEngine {
    fn draw(&mut self, pixmap: &mut Pixmap, text: &str, style: &TextStyle, x: f32, y: f32, rgba: Rgba) {
        if text.is_empty() {
            return;
        }
        let buffer = self.shape(text, style);
        let ascent = buffer
            .layout_runs()
            .next()
            .map(|run| run.line_y)
            .unwrap_or(style.size);
        let top = y - ascent;
        let color = Color::rgba(rgba.0, rgba.1, rgba.2, rgba.3);
        let mut paint = Paint::default();
        buffer.draw(&mut self.font_system, &mut self.cache, color, |gx, gy, w, h, c| {
            if c.a() == 0 {
                return;
            }
            let Some(rect) = Rect::from_xywh(x + gx as f32, top + gy as f32, w as f32, h as f32)
            else {
                return;
            };
            paint.set_color_rgba8(c.r(), c.g(), c.b(), c.a());
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        });
    }
}

/// Font-free engine with fixed advances.
///
/// ASCII characters advance by `narrow * size`, everything else (CJK,
/// symbols) by `wide * size`.
#[derive(Debug, Clone, Copy)]
pub struct BlockGlyphs {
    pub narrow: f32,
    pub wide: f32,
}

impl BlockGlyphs {
    pub fn new() -> Self {
        Self { narrow: 0.5, wide: 1.0 }
    }

    fn advance(&self, c: char, size: f32) -> f32 {
        if c.is_ascii() {
            self.narrow * size
        } else {
            self.wide * size
        }
    }
}

impl Default for BlockGlyphs {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for BlockGlyphs {
    fn measure(&mut self, text: &str, style: &TextStyle) -> f32 {
        text.chars().map(|c| self.advance(c, style.size)).sum()
    }
}

impl TextEngine for BlockGlyphs {
    fn draw(&mut self, pixmap: &mut Pixmap, text: &str, style: &TextStyle, x: f32, y: f32, rgba: Rgba) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba.0, rgba.1, rgba.2, rgba.3);
        let height = style.size * 0.7;
        let mut pen = x;
        for c in text.chars() {
            let adv = self.advance(c, style.size);
            if !c.is_whitespace() {
                if let Some(rect) = Rect::from_xywh(pen + adv * 0.1, y - height, adv * 0.8, height) {
                    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
            pen += adv;
        }
    }
}
