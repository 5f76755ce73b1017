//! Cron expression parsing and clock math
//!
//! Supports standard 5-field expressions (minute hour day-of-month month
//! day-of-week) and the 6-field variant with a leading seconds field.
//! Terms per field: `*`, `*/step`, `a`, `a-b`, `a-b/step`, and comma
//! lists. When both day-of-month and day-of-week are restricted, a date
//! matches if either does, as in classic cron.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CronError(String);

/// A parsed, validated cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    /// Present only for 6-field expressions.
    seconds: Option<BTreeSet<u32>>,
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    days_of_month: BTreeSet<u32>,
    months: BTreeSet<u32>,
    days_of_week: BTreeSet<u32>,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl FromStr for CronExpr {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        let (seconds, rest): (Option<&str>, &[&str]) = match fields.len() {
            5 => (None, &fields[..]),
            6 => (Some(fields[0]), &fields[1..]),
            n => {
                return Err(CronError(format!(
                    "expected 5 or 6 fields, found {n}"
                )))
            }
        };

        let seconds = seconds
            .map(|field| parse_field(field, 0, 59, "seconds"))
            .transpose()?;
        let minutes = parse_field(rest[0], 0, 59, "minutes")?;
        let hours = parse_field(rest[1], 0, 23, "hours")?;
        let days_of_month = parse_field(rest[2], 1, 31, "day of month")?;
        let months = parse_field(rest[3], 1, 12, "month")?;
        let mut days_of_week = parse_field(rest[4], 0, 7, "day of week")?;
        // Both 0 and 7 mean Sunday.
        if days_of_week.remove(&7) {
            days_of_week.insert(0);
        }

        Ok(Self {
            seconds,
            minutes,
            hours,
            days_of_month,
            months,
            days_of_week,
            dom_restricted: rest[2] != "*",
            dow_restricted: rest[4] != "*",
        })
    }
}

impl CronExpr {
    /// Whether the expression carries a seconds field.
    pub fn has_seconds(&self) -> bool {
        self.seconds.is_some()
    }

    fn date_matches(&self, date: NaiveDate) -> bool {
        if !self.months.contains(&date.month()) {
            return false;
        }
        let dom = self.days_of_month.contains(&date.day());
        let dow = self
            .days_of_week
            .contains(&date.weekday().num_days_from_sunday());
        match (self.dom_restricted, self.dow_restricted) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }

    /// Whether a timestamp satisfies the expression. Five-field
    /// expressions ignore the seconds component.
    pub fn matches(&self, t: NaiveDateTime) -> bool {
        if let Some(seconds) = &self.seconds {
            if !seconds.contains(&t.second()) {
                return false;
            }
        }
        self.minutes.contains(&t.minute())
            && self.hours.contains(&t.hour())
            && self.date_matches(t.date())
    }

    /// The first matching timestamp strictly after `after`, within one
    /// year. `None` means the expression can never fire (e.g. Feb 30).
    pub fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let step = if self.has_seconds() {
            Duration::seconds(1)
        } else {
            Duration::minutes(1)
        };

        let mut t = if self.has_seconds() {
            after.with_nanosecond(0)? + step
        } else {
            after.with_nanosecond(0)?.with_second(0)? + step
        };
        let limit = after + Duration::days(366);

        while t <= limit {
            if !self.date_matches(t.date()) {
                t = t.date().succ_opt()?.and_hms_opt(0, 0, 0)?;
                continue;
            }
            if !self.hours.contains(&t.hour()) {
                t = t.with_minute(0)?.with_second(0)? + Duration::hours(1);
                continue;
            }
            if !self.minutes.contains(&t.minute()) {
                t = t.with_second(0)? + Duration::minutes(1);
                continue;
            }
            if let Some(seconds) = &self.seconds {
                if !seconds.contains(&t.second()) {
                    t = t + Duration::seconds(1);
                    continue;
                }
            }
            return Some(t);
        }
        None
    }
}

fn parse_field(
    field: &str,
    min: u32,
    max: u32,
    label: &str,
) -> Result<BTreeSet<u32>, CronError> {
    let mut values = BTreeSet::new();

    for term in field.split(',') {
        if term.is_empty() {
            return Err(CronError(format!("empty term in {label} field")));
        }

        let (range, step) = match term.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| CronError(format!("invalid step \"{step}\" in {label} field")))?;
                if step == 0 {
                    return Err(CronError(format!("step cannot be 0 in {label} field")));
                }
                (range, step)
            }
            None => (term, 1),
        };

        let (start, end) = if range == "*" {
            (min, max)
        } else if let Some((a, b)) = range.split_once('-') {
            let a: u32 = a
                .parse()
                .map_err(|_| CronError(format!("invalid value \"{a}\" in {label} field")))?;
            let b: u32 = b
                .parse()
                .map_err(|_| CronError(format!("invalid value \"{b}\" in {label} field")))?;
            if a > b {
                return Err(CronError(format!(
                    "inverted range {a}-{b} in {label} field"
                )));
            }
            (a, b)
        } else {
            let v: u32 = range
                .parse()
                .map_err(|_| CronError(format!("invalid value \"{range}\" in {label} field")))?;
            (v, v)
        };

        if start < min || end > max {
            return Err(CronError(format!(
                "{label} field value out of range {min}-{max}: {term}"
            )));
        }

        values.extend((start..=end).step_by(step as usize));
    }

    Ok(values)
}

/// Days of the week as cron encodes them; Sunday is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekDay {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

/// Constructors for readable cron pattern strings.
pub struct Cron;

impl Cron {
    /// Every `s` seconds.
    pub fn seconds(s: u32) -> String {
        format!("*/{s} * * * * *")
    }

    /// Every `m` minutes.
    pub fn minutes(m: u32) -> String {
        format!("*/{m} * * * *")
    }

    /// Every `h` hours.
    pub fn hours(h: u32) -> String {
        format!("0 */{h} * * *")
    }

    /// Daily at a specific time.
    pub fn daily_at(hour: u32, minute: u32) -> String {
        format!("{minute} {hour} * * *")
    }

    /// Weekly on a specific day and time.
    pub fn weekly_at(day: WeekDay, hour: u32, minute: u32) -> String {
        format!("{minute} {hour} * * {}", day as u32)
    }
}
