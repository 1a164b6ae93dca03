/// Paint command set produced by the card layout and consumed by the rasterizer
use serde::{Deserialize, Serialize};

use crate::rendering::qr::CodeMatrix;

/// Straight (non-premultiplied) RGBA color.
pub type Rgba = (u8, u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Regular,
    Medium,
    Bold,
}

impl FontWeight {
    /// CSS-style numeric weight.
    pub fn value(self) -> u16 {
        match self {
            FontWeight::Regular => 400,
            FontWeight::Medium => 500,
            FontWeight::Bold => 700,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size: f32,
    pub weight: FontWeight,
}

impl TextStyle {
    pub const fn new(size: f32, weight: FontWeight) -> Self {
        Self { size, weight }
    }
}

/// One drawing step. Coordinates are in card pixels; text `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Fill the whole surface with a two-stop top-to-bottom gradient
    VerticalGradient { top: Rgba, bottom: Rgba },
    RoundedBorder {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        stroke_width: f32,
        rgba: Rgba,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke_width: f32,
        rgba: Rgba,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
        rgba: Rgba,
    },
    /// Scannable code drawn as a light square (quiet zone included) with dark modules
    Code {
        x: f32,
        y: f32,
        size: f32,
        quiet_zone: usize,
        matrix: CodeMatrix,
        dark: Rgba,
        light: Rgba,
    },
}

impl PaintCommand {
    /// Text payload if this is a text command.
    pub fn text(&self) -> Option<&str> {
        match self {
            PaintCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_accessor_only_matches_text() {
        let cmd = PaintCommand::Text {
            x: 0.0,
            y: 10.0,
            text: "待办".into(),
            style: TextStyle::new(36.0, FontWeight::Medium),
            rgba: (255, 255, 255, 255),
        };
        assert_eq!(cmd.text(), Some("待办"));

        let line = PaintCommand::Line {
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 0.0,
            stroke_width: 2.0,
            rgba: (55, 65, 81, 255),
        };
        assert!(line.text().is_none());
    }

    #[test]
    fn weights_map_to_css_values() {
        assert_eq!(FontWeight::Regular.value(), 400);
        assert_eq!(FontWeight::Bold.value(), 700);
    }
}
