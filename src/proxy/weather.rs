//! QWeather "now" conditions.

use serde::Deserialize;

use super::{endpoint, parse, ProxyClient};
use crate::platform::Coords;
use crate::summary::WeatherSnapshot;
use crate::{Error, Result};

/// Where to ask for weather.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherLocation {
    Coords(Coords),
    /// QWeather location id, e.g. `101010100`
    Id(String),
}

impl WeatherLocation {
    /// `lon,lat` with two decimals, or the id as given.
    pub fn query_value(&self) -> String {
        match self {
            WeatherLocation::Coords(c) => format!("{:.2},{:.2}", c.lon, c.lat),
            WeatherLocation::Id(id) => id.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NowResponse {
    code: Option<String>,
    update_time: Option<String>,
    fx_link: Option<String>,
    #[serde(default)]
    now: NowFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NowFields {
    obs_time: Option<String>,
    temp: Option<String>,
    feels_like: Option<String>,
    text: Option<String>,
    wind_dir: Option<String>,
    wind_scale: Option<String>,
    wind_speed: Option<String>,
    humidity: Option<String>,
    precip: Option<String>,
    pressure: Option<String>,
    vis: Option<String>,
    cloud: Option<String>,
    dew: Option<String>,
}

impl From<NowResponse> for WeatherSnapshot {
    fn from(r: NowResponse) -> Self {
        let n = r.now;
        WeatherSnapshot {
            temp: n.temp,
            feels_like: n.feels_like,
            text: n.text,
            wind_dir: n.wind_dir,
            wind_scale: n.wind_scale,
            wind_speed: n.wind_speed,
            humidity: n.humidity,
            precip: n.precip,
            pressure: n.pressure,
            vis: n.vis,
            cloud: n.cloud,
            dew: n.dew,
            obs_time: n.obs_time,
            update_time: r.update_time,
            fx_link: r.fx_link,
        }
    }
}

impl ProxyClient {
    /// Current conditions at `location`, or the configured default location.
    pub async fn weather_now(&self, location: Option<&WeatherLocation>) -> Result<WeatherSnapshot> {
        let key = self
            .config
            .qweather_key
            .as_deref()
            .ok_or_else(|| Error::MissingKey("QWEATHER_KEY".into()))?;
        let location = location
            .map(WeatherLocation::query_value)
            .unwrap_or_else(|| self.config.default_location.clone());

        let mut url = endpoint(&self.config.qweather_base, "v7/weather/now")?;
        url.query_pairs_mut()
            .append_pair("key", key)
            .append_pair("location", &location);

        let (_status, body) = self.get(&self.direct, url).await?;
        let resp: NowResponse = parse(&body)?;
        match resp.code.as_deref() {
            Some("200") => Ok(resp.into()),
            code => Err(Error::UpstreamError(format!(
                "QWeather 返回错误 (code {})",
                code.unwrap_or("-")
            ))),
        }
    }
}
