//! Scannable code generation for the share card.

use qrcode::{Color, EcLevel, QrCode};

use crate::{Error, Result};

/// Square grid of code modules, row-major, `true` = dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl CodeMatrix {
    pub fn new(width: usize, modules: Vec<bool>) -> Result<Self> {
        if width == 0 || modules.len() != width * width {
            return Err(Error::CodeError(format!(
                "matrix of {} modules is not {}x{}",
                modules.len(),
                width,
                width
            )));
        }
        Ok(Self { width, modules })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|m| **m).count()
    }
}

/// Encodes a URL into a module matrix.
pub trait CodeEncoder: Send + Sync {
    fn encode(&self, data: &str) -> Result<CodeMatrix>;
}

/// QR encoder with fixed parameters so output is stable for a given input.
#[derive(Debug, Clone, Copy)]
pub struct QrEncoder {
    level: EcLevel,
}

impl QrEncoder {
    pub fn new() -> Self {
        Self { level: EcLevel::M }
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeEncoder for QrEncoder {
    fn encode(&self, data: &str) -> Result<CodeMatrix> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), self.level)
            .map_err(|e| Error::CodeError(e.to_string()))?;
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        CodeMatrix::new(code.width(), modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_encoding_is_stable() {
        let enc = QrEncoder::new();
        let a = enc.encode("https://example.app/share/abc").unwrap();
        let b = enc.encode("https://example.app/share/abc").unwrap();
        assert_eq!(a, b);
        // version 2 or 3 for a short URL at level M
        assert!(a.width() >= 21 && a.width() <= 29, "width {}", a.width());
        assert!(a.dark_count() > 0);
    }

    #[test]
    fn finder_pattern_corner_is_dark() {
        let m = QrEncoder::new().encode("zhaomu").unwrap();
        assert!(m.is_dark(0, 0));
        assert!(m.is_dark(m.width() - 1, 0));
        assert!(!m.is_dark(m.width(), 0));
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let data = "x".repeat(5000);
        let err = QrEncoder::new().encode(&data).unwrap_err();
        assert_eq!(err.reason(), "code_error");
    }

    #[test]
    fn matrix_rejects_bad_shape() {
        assert!(CodeMatrix::new(3, vec![true; 8]).is_err());
        assert!(CodeMatrix::new(0, vec![]).is_err());
    }
}
