//! Date-range presets used when listing todos and notes.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Inclusive UTC range covering whole local days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        *at >= self.start && *at <= self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TimeFilter {
    All,
    #[default]
    Today,
    Last7,
    Last30,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl TimeFilter {
    /// First and last local day covered, or `None` for [`TimeFilter::All`].
    pub fn days(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            TimeFilter::All => None,
            TimeFilter::Today => Some((today, today)),
            TimeFilter::Last7 => Some((today - Duration::days(7), today)),
            TimeFilter::Last30 => Some((today - Duration::days(30), today)),
            TimeFilter::Custom { start, end } => Some((start, end)),
        }
    }

    /// Resolve to `[start 00:00:00.000, end 23:59:59.999]` in `tz`.
    pub fn range<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz) -> Result<Option<TimeRange>> {
        let Some((first, last)) = self.days(today) else {
            return Ok(None);
        };
        if first > last {
            return Err(Error::InvalidInput(format!("start {} is after end {}", first, last)));
        }
        let (Some(start_of_day), Some(end_of_day)) = (
            NaiveTime::from_hms_opt(0, 0, 0),
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999),
        ) else {
            return Err(Error::Other("invalid day bounds".into()));
        };
        let start = local_instant(tz, first, start_of_day)?;
        let end = local_instant(tz, last, end_of_day)?;
        Ok(Some(TimeRange { start, end }))
    }
}

fn local_instant<Tz: TimeZone>(tz: &Tz, day: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&day.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidInput(format!("{} {} does not exist locally", day, time)))
}
