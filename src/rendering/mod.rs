//! Share card rendering
//!
//! [`CardRenderer::render`] turns a [`DailySummary`] into a 1080×1440 PNG in
//! two passes: [`layout::compose`] produces paint commands, then
//! [`raster::rasterize`] paints them and the pixmap is PNG-encoded.

pub mod layout;
pub mod paint;
pub mod qr;
pub mod raster;
pub mod text;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::summary::DailySummary;
use crate::{Error, Result};

pub use layout::{compose, wrap_text, CardCanvas, Composition, Cursor, Wrapped};
pub use paint::{FontWeight, PaintCommand, Rgba, TextStyle};
pub use qr::{CodeEncoder, CodeMatrix, QrEncoder};
pub use text::{BlockGlyphs, FontEngine, FontSources, TextEngine, TextMeasure};

pub const CARD_WIDTH: u32 = 1080;
pub const CARD_HEIGHT: u32 = 1440;

/// Pixel geometry and per-section caps of the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardLayout {
    /// Safe margin between the canvas edge and any content
    pub margin: f32,
    pub border_inset: f32,
    pub border_radius: f32,
    pub border_width: f32,
    pub header_baseline: f32,
    pub divider_gap: f32,
    pub section_gap: f32,
    pub title_size: f32,
    pub date_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
    pub item_size: f32,
    pub caption_size: f32,
    pub attribution_size: f32,
    pub heading_line_height: f32,
    pub body_line_height: f32,
    pub item_line_height: f32,
    pub item_gap: f32,
    pub max_todos: usize,
    pub max_notes: usize,
    /// Wrapped lines allowed per todo/note item
    pub item_max_lines: usize,
    /// Wrapped lines allowed per weather/calendar line
    pub context_max_lines: usize,
    pub code_size: f32,
    /// Light border around the code, in modules
    pub code_quiet_zone: usize,
    pub caption_gap: f32,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            margin: 60.0,
            border_inset: 24.0,
            border_radius: 28.0,
            border_width: 2.0,
            header_baseline: 120.0,
            divider_gap: 36.0,
            section_gap: 64.0,
            title_size: 64.0,
            date_size: 32.0,
            heading_size: 36.0,
            body_size: 30.0,
            item_size: 30.0,
            caption_size: 26.0,
            attribution_size: 28.0,
            heading_line_height: 50.0,
            body_line_height: 46.0,
            item_line_height: 44.0,
            item_gap: 10.0,
            max_todos: 4,
            max_notes: 3,
            item_max_lines: 1,
            context_max_lines: 1,
            code_size: 220.0,
            code_quiet_zone: 2,
            caption_gap: 18.0,
        }
    }
}

/// Card colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardTheme {
    pub gradient_top: Rgba,
    pub gradient_bottom: Rgba,
    pub border: Rgba,
    pub divider: Rgba,
    pub text: Rgba,
    pub accent: Rgba,
    pub muted: Rgba,
    /// Opacity applied to completed todos (0..=255)
    pub done_alpha: u8,
    pub code_dark: Rgba,
    pub code_light: Rgba,
}

impl CardTheme {
    pub fn done(&self) -> Rgba {
        let (r, g, b, a) = self.text;
        (r, g, b, ((a as u16 * self.done_alpha as u16) / 255) as u8)
    }
}

impl Default for CardTheme {
    fn default() -> Self {
        Self {
            gradient_top: (0x11, 0x18, 0x27, 255),
            gradient_bottom: (0x1f, 0x29, 0x37, 255),
            border: (255, 255, 255, 40),
            divider: (0x37, 0x41, 0x51, 255),
            text: (255, 255, 255, 255),
            accent: (0x93, 0xc5, 0xfd, 255),
            muted: (0x9c, 0xa3, 0xaf, 255),
            done_alpha: 153,
            code_dark: (0x11, 0x18, 0x27, 255),
            code_light: (255, 255, 255, 255),
        }
    }
}

/// Renderer configuration: geometry, colors and font sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub layout: CardLayout,
    pub theme: CardTheme,
    /// Extra font files for the cosmic-text engine
    pub font_paths: Vec<std::path::PathBuf>,
    /// Skip scanning installed fonts (only `font_paths` are used)
    pub no_system_fonts: bool,
}

impl CardConfig {
    pub fn font_sources(&self) -> FontSources {
        FontSources {
            paths: self.font_paths.clone(),
            system_fonts: !self.no_system_fonts,
            ..FontSources::default()
        }
    }
}

/// A rendered share card.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub image_bytes: Vec<u8>,
    /// Set when part of the card (the code) had to be left out
    pub notice: Option<String>,
}

impl RenderedCard {
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.image_bytes))
    }

    /// Hex SHA-256 of the PNG bytes.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.image_bytes))
    }
}

/// Single-use renderer. Owns its text engine and code encoder.
pub struct CardRenderer<E: TextEngine = FontEngine> {
    layout: CardLayout,
    theme: CardTheme,
    engine: E,
    encoder: Box<dyn CodeEncoder>,
}

impl CardRenderer<FontEngine> {
    /// Renderer backed by real fonts.
    pub fn new(config: &CardConfig) -> Result<Self> {
        let engine = FontEngine::new(&config.font_sources())?;
        Ok(CardRenderer::with_engine(engine)
            .layout(config.layout.clone())
            .theme(config.theme.clone()))
    }
}

impl<E: TextEngine> CardRenderer<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            layout: CardLayout::default(),
            theme: CardTheme::default(),
            engine,
            encoder: Box::new(QrEncoder::new()),
        }
    }

    pub fn layout(mut self, layout: CardLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn theme(mut self, theme: CardTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn encoder(mut self, encoder: Box<dyn CodeEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Layout pass only.
    pub fn compose(&mut self, summary: &DailySummary) -> Composition {
        layout::compose(summary, &self.layout, &self.theme, &mut self.engine, self.encoder.as_ref())
    }

    pub fn render(&mut self, summary: &DailySummary) -> Result<RenderedCard> {
        let composition = self.compose(summary);
        log::debug!(
            "composed card: {} commands, {} todos, {} notes",
            composition.commands.len(),
            composition.drawn_todos,
            composition.drawn_notes
        );
        let pixmap = raster::rasterize(&composition.commands, CARD_WIDTH, CARD_HEIGHT, &mut self.engine)?;
        let image_bytes = raster::encode_png(&pixmap)?;
        Ok(RenderedCard {
            pixel_width: CARD_WIDTH,
            pixel_height: CARD_HEIGHT,
            image_bytes,
            notice: composition.notice,
        })
    }
}

/// Render on tokio's blocking pool so async callers are not stalled.
pub async fn render_blocking<E>(mut renderer: CardRenderer<E>, summary: DailySummary) -> Result<RenderedCard>
where
    E: TextEngine + Send + 'static,
{
    tokio::task::spawn_blocking(move || renderer.render(&summary))
        .await
        .map_err(|e| Error::RenderError(format!("render task failed: {}", e)))?
}
