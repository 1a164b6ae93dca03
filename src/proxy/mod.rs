//! Upstream content proxies
//!
//! Async clients for the weather, lunar calendar, trending movie, trending
//! music and daily quote services. Each call returns a typed value or an
//! [`Error`] whose [`Error::reason`] is the stable failure code; use
//! [`outcome_json`] for the `{ ok, item }` / `{ ok, reason, message }` view.

mod calendar;
mod discover;
mod weather;

pub use discover::{Movie, Quote, Song};
pub use weather::WeatherLocation;

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::{Error, Result, ZhaomuConfig};

const USER_AGENT: &str = concat!("zhaomu/", env!("CARGO_PKG_VERSION"));

/// Client for every content proxy. Cheap to clone.
#[derive(Clone)]
pub struct ProxyClient {
    config: ZhaomuConfig,
    direct: Client,
    movie: Client,
    music: Client,
}

impl ProxyClient {
    pub fn new(config: &ZhaomuConfig) -> Result<Self> {
        let fallback = config.http_proxy.as_deref();
        let direct = build_client(config.timeout_ms, None)?;
        let movie = build_client(config.timeout_ms, config.tmdb_proxy.as_deref().or(fallback))?;
        let music = build_client(config.timeout_ms, config.music_proxy.as_deref().or(fallback))?;
        Ok(Self { config: config.clone(), direct, movie, music })
    }

    pub fn config(&self) -> &ZhaomuConfig {
        &self.config
    }

    /// GET `url` and hand back status plus body text.
    async fn get(&self, client: &Client, url: Url) -> Result<(StatusCode, String)> {
        log::debug!("GET {}{}", url.host_str().unwrap_or_default(), url.path());
        let resp = client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| classify(&e, self.config.timeout_ms))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| classify(&e, self.config.timeout_ms))?;
        if !status.is_success() {
            log::warn!("upstream answered {}", status);
        }
        Ok((status, body))
    }
}

/// Build a client with the per-request timeout and an optional proxy.
///
/// Proxies come only from configuration; an unparsable proxy URL is logged
/// and ignored.
pub fn build_client(timeout_ms: u64, proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .user_agent(USER_AGENT)
        .no_proxy();
    if let Some(proxy_url) = proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(p) => builder = builder.proxy(p),
            Err(e) => log::warn!("ignoring proxy {}: {}", proxy_url, e),
        }
    }
    builder
        .build()
        .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport error onto the stable reason codes.
pub fn classify(err: &reqwest::Error, timeout_ms: u64) -> Error {
    if err.is_timeout() {
        Error::Timeout(timeout_ms)
    } else if err.is_decode() {
        Error::ParseError(err.to_string())
    } else {
        Error::NetworkError(err.to_string())
    }
}

/// `base` joined with `path`, e.g. `https://api.example.com` + `v7/weather/now`.
pub(crate) fn endpoint(base: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base).map_err(|e| Error::ConfigError(format!("bad base URL {}: {}", base, e)))?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| Error::ConfigError(format!("bad endpoint {}: {}", path, e)))
}

pub(crate) fn parse<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::ParseError(e.to_string()))
}

/// Error text an upstream put under `field`, if the body is JSON at all.
pub(crate) fn upstream_message(body: &str, field: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get(field)?.as_str().map(str::to_string)
}

pub(crate) fn pick<T>(mut items: Vec<T>) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    let idx = rand::thread_rng().gen_range(0..items.len());
    Some(items.swap_remove(idx))
}

/// `{ "ok": true, "item": … }` or `{ "ok": false, "reason": …, "message": … }`.
pub fn outcome_json<T: Serialize>(result: &Result<T>) -> serde_json::Value {
    match result {
        Ok(item) => serde_json::json!({ "ok": true, "item": item }),
        Err(e) => serde_json::json!({
            "ok": false,
            "reason": e.reason(),
            "message": e.user_message(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_origin_and_nested_base() {
        let u = endpoint("https://api.example.com", "v7/weather/now").unwrap();
        assert_eq!(u.as_str(), "https://api.example.com/v7/weather/now");
        let u = endpoint("http://127.0.0.1:9/mock", "time").unwrap();
        assert_eq!(u.as_str(), "http://127.0.0.1:9/mock/time");
    }

    #[test]
    fn bad_base_url_is_config_error() {
        assert_eq!(endpoint("not a url", "x").unwrap_err().reason(), "config_error");
    }

    #[test]
    fn upstream_message_reads_named_field() {
        let body = r#"{"status_code":7,"status_message":"Invalid API key"}"#;
        assert_eq!(upstream_message(body, "status_message").as_deref(), Some("Invalid API key"));
        assert_eq!(upstream_message("<html>", "status_message"), None);
    }

    #[test]
    fn pick_returns_member_or_none() {
        assert_eq!(pick(Vec::<u8>::new()), None);
        assert_eq!(pick(vec![7]), Some(7));
        let got = pick(vec![1, 2, 3]).unwrap();
        assert!((1..=3).contains(&got));
    }

    #[test]
    fn outcome_json_shapes() {
        let ok: Result<&str> = Ok("x");
        assert_eq!(outcome_json(&ok), serde_json::json!({ "ok": true, "item": "x" }));
        let err: Result<&str> = Err(Error::NoData("暂无热门歌曲".into()));
        let v = outcome_json(&err);
        assert_eq!(v["ok"], false);
        assert_eq!(v["reason"], "no_data");
        assert_eq!(v["message"], "暂无热门歌曲");
    }

    #[test]
    fn bad_proxy_is_ignored() {
        assert!(build_client(1000, Some("http://[::1")).is_ok());
    }
}
