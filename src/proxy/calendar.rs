//! Lunar calendar and almanac (timelessq `/time`).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use super::{endpoint, parse, ProxyClient};
use crate::summary::{AlmanacSummary, CalendarSnapshot, Cyclical};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct TimeResponse {
    errno: Option<i64>,
    errmsg: Option<String>,
    data: Option<TimeData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TimeData {
    year: Option<u32>,
    month: Option<u32>,
    day: Option<u32>,
    cn_week: Option<String>,
    lunar: Option<LunarData>,
    almanac: Option<AlmanacData>,
    festivals: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LunarData {
    cn_year: Option<String>,
    cn_month: Option<String>,
    cn_day: Option<String>,
    zodiac: Option<String>,
    cyclical_year: Option<String>,
    cyclical_month: Option<String>,
    cyclical_day: Option<String>,
    solar_terms: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlmanacData {
    yi: Option<Value>,
    ji: Option<Value>,
    chong: Option<Value>,
    sha: Option<Value>,
}

/// Flatten a loosely typed upstream value into display text.
fn text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(text).collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        other => Some(other.to_string()),
    }
}

impl From<TimeData> for CalendarSnapshot {
    fn from(d: TimeData) -> Self {
        let date = match (d.year, d.month, d.day) {
            (Some(y), Some(m), Some(day)) => Some(format!("{}-{:02}-{:02}", y, m, day)),
            _ => None,
        };
        let lunar_text = d.lunar.as_ref().map(|l| {
            let part = |v: &Option<String>| v.clone().unwrap_or_default();
            format!("{}年 {}{}", part(&l.cn_year), part(&l.cn_month), part(&l.cn_day))
        });
        let lunar = d.lunar.unwrap_or_default();
        let cyclical = Cyclical {
            year: lunar.cyclical_year,
            month: lunar.cyclical_month,
            day: lunar.cyclical_day,
        };
        let almanac = d.almanac.map(|a| AlmanacSummary {
            yi: a.yi.as_ref().and_then(text),
            ji: a.ji.as_ref().and_then(text),
            chong: a.chong.as_ref().and_then(text),
            sha: a.sha.as_ref().and_then(text),
        });
        CalendarSnapshot {
            date,
            week: d.cn_week,
            lunar: lunar_text,
            zodiac: lunar.zodiac,
            cyclical: (!cyclical.is_empty()).then_some(cyclical),
            solar_terms: lunar
                .solar_terms
                .iter()
                .filter_map(|(k, v)| text(v).map(|t| (k.clone(), t)))
                .collect(),
            almanac,
            festivals: d.festivals.iter().filter_map(text).collect(),
        }
    }
}

impl ProxyClient {
    /// Calendar for `date`, or for the upstream's today when `None`.
    pub async fn calendar(&self, date: Option<NaiveDate>) -> Result<CalendarSnapshot> {
        let mut url = endpoint(&self.config.calendar_base, "time")?;
        if let Some(d) = date {
            url.query_pairs_mut()
                .append_pair("datetime", &d.format("%Y-%m-%d").to_string());
        }

        let (_status, body) = self.get(&self.direct, url).await?;
        let resp: TimeResponse = parse(&body)?;
        if resp.errno != Some(0) {
            return Err(Error::UpstreamError(format!(
                "Calendar API 返回错误: {}",
                resp.errmsg.unwrap_or_else(|| format!("errno {:?}", resp.errno))
            )));
        }
        Ok(resp.data.unwrap_or_default().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "errno": 0,
        "errmsg": "",
        "data": {
            "year": 2024, "month": 5, "day": 1, "cnWeek": "星期三",
            "lunar": {
                "cnYear": "甲辰", "cnMonth": "三月", "cnDay": "廿三", "zodiac": "龙",
                "cyclicalYear": "甲辰", "cyclicalMonth": "戊辰", "cyclicalDay": "壬戌",
                "solarTerms": { "立夏": "2024-05-05" }
            },
            "almanac": { "yi": "出行 祭祀", "ji": ["动土", "破土"], "chong": "冲狗", "sha": "煞南" },
            "festivals": ["劳动节"]
        }
    }"#;

    #[test]
    fn payload_maps_to_snapshot() {
        let resp: TimeResponse = parse(SAMPLE).unwrap();
        let snap: CalendarSnapshot = resp.data.unwrap().into();
        assert_eq!(snap.date.as_deref(), Some("2024-05-01"));
        assert_eq!(snap.lunar.as_deref(), Some("甲辰年 三月廿三"));
        assert_eq!(snap.zodiac.as_deref(), Some("龙"));
        assert_eq!(snap.solar_terms.get("立夏").map(String::as_str), Some("2024-05-05"));
        let almanac = snap.almanac.unwrap();
        assert_eq!(almanac.ji.as_deref(), Some("动土 破土"));
        assert_eq!(snap.festivals, vec!["劳动节"]);
    }

    #[test]
    fn sparse_payload_leaves_fields_empty() {
        let snap: CalendarSnapshot = parse::<TimeData>(r#"{ "year": 2024 }"#).unwrap().into();
        assert!(snap.date.is_none());
        assert!(snap.lunar.is_none());
        assert!(snap.cyclical.is_none());
        assert_eq!(snap.card_lines(), vec!["农历：-"]);
    }

    #[test]
    fn partial_lunar_still_builds_text() {
        let raw = r#"{ "year": 2024, "lunar": { "cnMonth": "三月", "cnDay": "廿三" } }"#;
        let snap: CalendarSnapshot = parse::<TimeData>(raw).unwrap().into();
        assert_eq!(snap.lunar.as_deref(), Some("年 三月廿三"));
    }
}
