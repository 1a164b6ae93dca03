/// Card delivery: download file, clipboard and platform share ports
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::rendering::RenderedCard;
use crate::{Error, Result};

pub const SHARE_TITLE: &str = "今朝 · 今日进度";
pub const CLIPBOARD_FAILED: &str = "复制到剪贴板失败，请尝试下载后手动分享";
pub const SHARE_UNSUPPORTED: &str = "当前设备不支持图片分享，请下载图片后手动分享";

/// `今朝进度_YYYY-MM-DD.png`
pub fn download_filename(date: NaiveDate) -> String {
    format!("今朝进度_{}.png", date.format("%Y-%m-%d"))
}

/// Write the card into `dir` under its download name, creating `dir` if needed.
pub fn save_card(card: &RenderedCard, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(download_filename(date));
    std::fs::write(&path, &card.image_bytes)?;
    log::info!("saved card to {}", path.display());
    Ok(path)
}

pub trait ClipboardPort: Send + Sync {
    /// Whether PNG images can be placed on this clipboard at all.
    fn supports_images(&self) -> bool;
    fn write_png(&self, bytes: &[u8]) -> Result<()>;
}

/// File attachment handed to the platform share sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRequest {
    pub title: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ShareRequest {
    pub fn for_card(card: &RenderedCard, date: NaiveDate) -> Self {
        Self {
            title: SHARE_TITLE.to_string(),
            file_name: download_filename(date),
            mime_type: "image/png".to_string(),
            bytes: card.image_bytes.clone(),
        }
    }
}

pub trait SharePort: Send + Sync {
    fn can_share(&self, request: &ShareRequest) -> bool;
    /// Present the share sheet. An `Err` here is usually the user cancelling.
    fn share(&self, request: ShareRequest) -> Result<()>;
}

/// In-memory clipboard double: accepts images and keeps the last one written.
///
/// Hosts with a real clipboard implement [`ClipboardPort`] themselves.
pub struct MemoryClipboard {
    contents: Mutex<Option<Vec<u8>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        MemoryClipboard { contents: Mutex::new(None) }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl Default for MemoryClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardPort for MemoryClipboard {
    fn supports_images(&self) -> bool {
        true
    }

    fn write_png(&self, bytes: &[u8]) -> Result<()> {
        let mut c = self
            .contents
            .lock()
            .map_err(|_| Error::Other("clipboard lock poisoned".into()))?;
        *c = Some(bytes.to_vec());
        Ok(())
    }
}

/// Host without an image clipboard
pub struct NoClipboard;

impl ClipboardPort for NoClipboard {
    fn supports_images(&self) -> bool {
        false
    }

    fn write_png(&self, _bytes: &[u8]) -> Result<()> {
        Err(Error::Unsupported(CLIPBOARD_FAILED.into()))
    }
}

/// Share double that accepts and records every request.
///
/// Hosts with a real share sheet implement [`SharePort`] themselves.
pub struct RecordingShare {
    shared: Mutex<Vec<ShareRequest>>,
}

impl RecordingShare {
    pub fn new() -> Self {
        RecordingShare { shared: Mutex::new(Vec::new()) }
    }

    pub fn shared(&self) -> Vec<ShareRequest> {
        self.shared.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for RecordingShare {
    fn default() -> Self {
        Self::new()
    }
}

impl SharePort for RecordingShare {
    fn can_share(&self, _request: &ShareRequest) -> bool {
        true
    }

    fn share(&self, request: ShareRequest) -> Result<()> {
        let mut s = self
            .shared
            .lock()
            .map_err(|_| Error::Other("share lock poisoned".into()))?;
        s.push(request);
        Ok(())
    }
}

/// Host without a share sheet
pub struct NoShare;

impl SharePort for NoShare {
    fn can_share(&self, _request: &ShareRequest) -> bool {
        false
    }

    fn share(&self, _request: ShareRequest) -> Result<()> {
        Err(Error::Unsupported(SHARE_UNSUPPORTED.into()))
    }
}

/// Runs the delivery actions against the host's ports.
///
/// Each action returns `Ok(())` or the message to show the user.
pub struct Delivery<'a> {
    clipboard: &'a dyn ClipboardPort,
    share: &'a dyn SharePort,
}

impl<'a> Delivery<'a> {
    pub fn new(clipboard: &'a dyn ClipboardPort, share: &'a dyn SharePort) -> Self {
        Self { clipboard, share }
    }

    pub fn copy(&self, card: &RenderedCard) -> std::result::Result<(), String> {
        if !self.clipboard.supports_images() {
            return Err(CLIPBOARD_FAILED.to_string());
        }
        self.clipboard.write_png(&card.image_bytes).map_err(|e| {
            log::warn!("clipboard write failed: {}", e);
            CLIPBOARD_FAILED.to_string()
        })
    }

    pub fn share(&self, card: &RenderedCard, date: NaiveDate) -> std::result::Result<(), String> {
        let request = ShareRequest::for_card(card, date);
        if !self.share.can_share(&request) {
            return Err(SHARE_UNSUPPORTED.to_string());
        }
        if let Err(e) = self.share.share(request) {
            // cancelled or dismissed
            log::debug!("share not completed: {}", e);
        }
        Ok(())
    }
}
