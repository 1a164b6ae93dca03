//! 朝暮记 (Zhaomu) daily share cards
//!
//! Builds the "今朝 · 今日进度" share image for a day of todos and notes, and
//! talks to the services around it: the hosted todo/note tables and the
//! weather, lunar calendar, movie, music and quote APIs.
//!
//! # Features
//!
//! - **Card rendering** (always on): deterministic 1080×1440 PNG with an
//!   embedded QR code, see [`rendering`]
//! - **net** (default): async proxy clients ([`proxy`]) and the hosted-table
//!   client ([`store`])
//!
//! # Example
//!
//! ```no_run
//! use zhaomu::rendering::{BlockGlyphs, CardRenderer};
//! use zhaomu::summary::{DailySummary, TodoLine, TodoStats};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = DailySummary {
//!     date_label: "2024年05月01日 星期三".to_string(),
//!     todos: vec![TodoLine { title: "买牛奶".to_string(), done: true }],
//!     notes: vec![],
//!     todo_stats: TodoStats { completed: 1, total: 1 },
//!     note_count: 0,
//!     share_target_url: "https://example.app/share/abc".to_string(),
//!     enrichment: Default::default(),
//! };
//!
//! let mut renderer = CardRenderer::with_engine(BlockGlyphs::new());
//! let card = renderer.render(&summary)?;
//! std::fs::write("card.png", &card.image_bytes)?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod platform;
pub mod rendering;
pub mod summary;
pub mod time_filter;

#[cfg(feature = "net")]
pub mod proxy;

#[cfg(feature = "net")]
pub mod store;

pub use rendering::{CardConfig, CardRenderer, RenderedCard};
pub use summary::DailySummary;

/// Application configuration
///
/// Defaults point at the public upstream endpoints; keys and the hosted
/// backend are unset. [`ZhaomuConfig::from_env`] reads the same environment
/// variables the web app used.
///
/// # Examples
///
/// ```
/// let cfg = zhaomu::ZhaomuConfig::default();
/// assert_eq!(cfg.music_region, "cn");
/// assert!(cfg.qweather_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZhaomuConfig {
    /// Hosted backend project URL (`SUPABASE_URL`)
    pub supabase_url: Option<String>,
    /// Hosted backend anonymous key (`SUPABASE_ANON_KEY`)
    pub supabase_anon_key: Option<String>,
    /// QWeather API key (`QWEATHER_KEY`)
    pub qweather_key: Option<String>,
    pub qweather_base: String,
    /// Default QWeather location id when no coordinates are known
    pub default_location: String,
    pub calendar_base: String,
    /// TMDB API key (`TMDB_API_KEY`)
    pub tmdb_api_key: Option<String>,
    pub tmdb_base: String,
    /// Apple Music chart region (`MUSIC_REGION`)
    pub music_region: String,
    pub music_base: String,
    pub quote_url: String,
    /// Proxy for TMDB only (`TMDB_HTTP_PROXY`)
    pub tmdb_proxy: Option<String>,
    /// Proxy for Apple Music only (`MUSIC_HTTP_PROXY`)
    pub music_proxy: Option<String>,
    /// Fallback proxy (`HTTP_PROXY` / `HTTPS_PROXY`)
    pub http_proxy: Option<String>,
    /// Per-request timeout for upstream calls in milliseconds
    pub timeout_ms: u64,
    /// Page the share card's code points to
    pub share_url: String,
    pub card: CardConfig,
}

impl Default for ZhaomuConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            qweather_key: None,
            qweather_base: "https://mb3yfr58p2.re.qweatherapi.com".to_string(),
            default_location: "101010100".to_string(),
            calendar_base: "https://api.timelessq.com".to_string(),
            tmdb_api_key: None,
            tmdb_base: "https://api.themoviedb.org".to_string(),
            music_region: "cn".to_string(),
            music_base: "https://rss.applemarketingtools.com".to_string(),
            quote_url: "https://v1.hitokoto.cn/?encode=json".to_string(),
            tmdb_proxy: None,
            music_proxy: None,
            http_proxy: None,
            timeout_ms: 12000,
            share_url: "https://zhaomu.app/zhaomu".to_string(),
            card: CardConfig::default(),
        }
    }
}

impl ZhaomuConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env(|name| std::env::var(name).ok())
    }

    /// Read a JSON config file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Overlay values from `lookup` (usually the environment). Empty values
    /// are treated as unset.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let url = get("SUPABASE_URL").or_else(|| get("NEXT_PUBLIC_SUPABASE_URL"));
        if url.is_some() {
            self.supabase_url = url;
        }
        let key = get("SUPABASE_ANON_KEY").or_else(|| get("NEXT_PUBLIC_SUPABASE_ANON_KEY"));
        if key.is_some() {
            self.supabase_anon_key = key;
        }
        if let Some(v) = get("QWEATHER_KEY") {
            self.qweather_key = Some(v);
        }
        if let Some(v) = get("TMDB_API_KEY") {
            self.tmdb_api_key = Some(v);
        }
        if let Some(v) = get("MUSIC_REGION") {
            self.music_region = v;
        }
        if let Some(v) = get("TMDB_HTTP_PROXY") {
            self.tmdb_proxy = Some(v);
        }
        if let Some(v) = get("MUSIC_HTTP_PROXY") {
            self.music_proxy = Some(v);
        }
        if let Some(v) = get("HTTP_PROXY").or_else(|| get("HTTPS_PROXY")) {
            self.http_proxy = Some(v);
        }
        if let Some(v) = get("ZHAOMU_SHARE_URL") {
            self.share_url = v;
        }
        self
    }

    /// Whether the hosted backend can be reached at all.
    pub fn store_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }
}
