//! Daily summary model and aggregation.
//!
//! A [`DailySummary`] is the plain-data input of the share card. It is
//! assembled from the raw [`Todo`] / [`Note`] rows of the hosted tables plus
//! whatever weather / calendar context could be fetched. Every upstream field
//! that may be missing is an `Option`.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Row of the `todos` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
}

/// Row of the `daily_notes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoLine {
    pub title: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteLine {
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoStats {
    pub completed: usize,
    pub total: usize,
}

/// Current conditions as reported by the weather proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSnapshot {
    pub temp: Option<String>,
    pub feels_like: Option<String>,
    pub text: Option<String>,
    pub wind_dir: Option<String>,
    pub wind_scale: Option<String>,
    pub wind_speed: Option<String>,
    pub humidity: Option<String>,
    pub precip: Option<String>,
    pub pressure: Option<String>,
    pub vis: Option<String>,
    pub cloud: Option<String>,
    pub dew: Option<String>,
    pub obs_time: Option<String>,
    pub update_time: Option<String>,
    pub fx_link: Option<String>,
}

pub const NO_WEATHER: &str = "暂无天气信息";

fn or_dash(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("-")
}

impl WeatherSnapshot {
    pub fn card_line(&self) -> String {
        format!(
            "{} {}℃ 体感 {}℃ 风向 {} 风力 {}",
            or_dash(&self.text),
            or_dash(&self.temp),
            or_dash(&self.feels_like),
            or_dash(&self.wind_dir),
            or_dash(&self.wind_scale)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cyclical {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
}

impl Cyclical {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlmanacSummary {
    pub yi: Option<String>,
    pub ji: Option<String>,
    pub chong: Option<String>,
    pub sha: Option<String>,
}

/// Lunar calendar / almanac for one day, as reported by the calendar proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSnapshot {
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    pub week: Option<String>,
    /// e.g. `甲辰年 三月廿三`
    pub lunar: Option<String>,
    pub zodiac: Option<String>,
    pub cyclical: Option<Cyclical>,
    pub solar_terms: BTreeMap<String, String>,
    pub almanac: Option<AlmanacSummary>,
    pub festivals: Vec<String>,
}

impl CalendarSnapshot {
    pub fn card_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match &self.lunar {
            Some(lunar) => lines.push(format!("农历：{lunar}")),
            None => lines.push("农历：-".to_string()),
        }
        if let Some(c) = self.cyclical.as_ref().filter(|c| !c.is_empty()) {
            lines.push(format!("干支：{}年 {}月 {}日", or_dash(&c.year), or_dash(&c.month), or_dash(&c.day)));
        }
        if let Some(a) = self.almanac.as_ref().filter(|a| a.yi.is_some() || a.ji.is_some()) {
            lines.push(format!("宜：{}；忌：{}", or_dash(&a.yi), or_dash(&a.ji)));
        }
        lines
    }
}

/// Optional context drawn above the todo section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enrichment {
    pub weather: Option<WeatherSnapshot>,
    pub calendar: Option<CalendarSnapshot>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.weather.is_none() && self.calendar.is_none()
    }

    /// Context lines for the card; empty when nothing was fetched.
    pub fn card_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.is_empty() {
            return lines;
        }
        match &self.weather {
            Some(w) => lines.push(w.card_line()),
            None => lines.push(NO_WEATHER.to_string()),
        }
        if let Some(c) = &self.calendar {
            lines.extend(c.card_lines());
        }
        lines
    }
}

/// Everything the share card shows for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date_label: String,
    /// Most recent first
    #[serde(default)]
    pub todos: Vec<TodoLine>,
    /// Most recent first
    #[serde(default)]
    pub notes: Vec<NoteLine>,
    pub todo_stats: TodoStats,
    pub note_count: usize,
    pub share_target_url: String,
    #[serde(default)]
    pub enrichment: Enrichment,
}

impl DailySummary {
    /// Build a summary from full (untruncated) day lists.
    ///
    /// Rows are re-sorted newest first; counts always cover every row.
    pub fn from_records(
        date: NaiveDate,
        todos: &[Todo],
        notes: &[Note],
        share_target_url: impl Into<String>,
        enrichment: Enrichment,
    ) -> Self {
        let mut todos: Vec<&Todo> = todos.iter().collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut notes: Vec<&Note> = notes.iter().collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let todo_stats = TodoStats {
            completed: todos.iter().filter(|t| t.is_complete).count(),
            total: todos.len(),
        };
        Self {
            date_label: format_date_label(date),
            todo_stats,
            note_count: notes.len(),
            todos: todos
                .into_iter()
                .map(|t| TodoLine { title: t.title.clone(), done: t.is_complete })
                .collect(),
            notes: notes.into_iter().map(|n| NoteLine { text: n.content.clone() }).collect(),
            share_target_url: share_target_url.into(),
            enrichment,
        }
    }
}

pub fn weekday_cn(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "星期一",
        Weekday::Tue => "星期二",
        Weekday::Wed => "星期三",
        Weekday::Thu => "星期四",
        Weekday::Fri => "星期五",
        Weekday::Sat => "星期六",
        Weekday::Sun => "星期日",
    }
}

/// `2024年05月01日 星期三`
pub fn format_date_label(date: NaiveDate) -> String {
    format!(
        "{}年{:02}月{:02}日 {}",
        date.year(),
        date.month(),
        date.day(),
        weekday_cn(date.weekday())
    )
}
