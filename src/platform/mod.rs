//! Host capability ports: clipboard, platform share and geolocation
//!
//! Every capability is optional. Hosts that lack one supply the matching
//! "unsupported" implementation; callers get a user-facing message or `None`
//! instead of an error.

pub mod delivery;
pub mod geolocation;

pub use delivery::{
    download_filename, save_card, ClipboardPort, Delivery, MemoryClipboard, NoClipboard, NoShare,
    RecordingShare, SharePort, ShareRequest,
};
pub use geolocation::{locate, Coords, FixedLocation, GeolocationPort, DEFAULT_LOCATE_TIMEOUT};

/// Composite view of what a host can do.
pub trait Platform: Send + Sync {
    fn clipboard(&self) -> Box<dyn ClipboardPort>;
    fn share(&self) -> Box<dyn SharePort>;
    fn geolocation(&self) -> Option<Box<dyn GeolocationPort>>;
}

/// Terminal host: no clipboard image support, no share sheet, position only
/// if one was configured.
pub struct HeadlessPlatform {
    position: Option<Coords>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        HeadlessPlatform { position: None }
    }

    pub fn with_position(position: Coords) -> Self {
        HeadlessPlatform { position: Some(position) }
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for HeadlessPlatform {
    fn clipboard(&self) -> Box<dyn ClipboardPort> {
        Box::new(NoClipboard)
    }

    fn share(&self) -> Box<dyn SharePort> {
        Box::new(NoShare)
    }

    fn geolocation(&self) -> Option<Box<dyn GeolocationPort>> {
        self.position.map(|c| Box::new(FixedLocation::new(Some(c))) as Box<dyn GeolocationPort>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_platform_has_no_image_capabilities() {
        let p = HeadlessPlatform::new();
        assert!(!p.clipboard().supports_images());
        assert!(p.geolocation().is_none());
    }

    #[test]
    fn headless_delivery_explains_missing_capabilities() {
        let p = HeadlessPlatform::new();
        let (clipboard, share) = (p.clipboard(), p.share());
        let d = Delivery::new(clipboard.as_ref(), share.as_ref());
        let card = crate::RenderedCard {
            pixel_width: 1080,
            pixel_height: 1440,
            image_bytes: vec![0x89, b'P', b'N', b'G'],
            notice: None,
        };
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(d.copy(&card).unwrap_err(), delivery::CLIPBOARD_FAILED);
        assert_eq!(d.share(&card, date).unwrap_err(), delivery::SHARE_UNSUPPORTED);
    }

    #[tokio::test]
    async fn headless_platform_reports_configured_position() {
        let p = HeadlessPlatform::with_position(Coords { lat: 31.23, lon: 121.47 });
        let port = p.geolocation();
        let got = locate(port.as_deref(), DEFAULT_LOCATE_TIMEOUT).await;
        assert_eq!(got, Some(Coords { lat: 31.23, lon: 121.47 }));
    }
}
