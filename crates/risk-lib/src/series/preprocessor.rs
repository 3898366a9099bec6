//! Historical record preprocessing
//!
//! Turns arbitrary vendor history records into daily, gap-filled series,
//! one per numeric column.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::models::{MetricSeries, Record};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Converts raw records into regularly indexed metric series
#[derive(Debug, Clone)]
pub struct SeriesPreprocessor {
    min_records: usize,
    date_fields: Vec<String>,
    ignored_fields: Vec<String>,
    max_span_days: usize,
    anchor: Option<DateTime<Utc>>,
}

impl SeriesPreprocessor {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_records: config.min_records,
            date_fields: config.date_fields.clone(),
            ignored_fields: config.ignored_fields.clone(),
            max_span_days: config.max_span_days.max(1),
            anchor: None,
        }
    }

    /// Fix the day that synthesized timestamps end on (defaults to today)
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Build one series per numeric column, sorted by column name
    pub fn process(&self, records: &[Record]) -> Result<Vec<MetricSeries>> {
        if records.len() < self.min_records {
            return Err(AnalysisError::insufficient(self.min_records, records.len()));
        }

        let date_key = self
            .date_fields
            .iter()
            .find(|key| records.iter().any(|r| r.contains_key(key.as_str())))
            .cloned();

        let dated = match &date_key {
            Some(key) => self.dated_records(records, key),
            None => self.synthesize_dates(records),
        };
        if dated.is_empty() {
            return Err(AnalysisError::NoUsableData);
        }

        let (first_day, last_day) = dated
            .iter()
            .fold((dated[0].0, dated[0].0), |(lo, hi), (d, _)| {
                (lo.min(*d), hi.max(*d))
            });
        let span = (last_day - first_day).num_days() as usize + 1;
        let first_day = if span > self.max_span_days {
            debug!(
                span_days = span,
                max_span_days = self.max_span_days,
                "History longer than max span, keeping most recent days"
            );
            last_day - Duration::days(self.max_span_days as i64 - 1)
        } else {
            first_day
        };
        let days = (last_day - first_day).num_days() as usize + 1;

        // column -> day offset -> (sum, count)
        let mut columns: BTreeMap<&str, BTreeMap<usize, (f64, usize)>> = BTreeMap::new();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for (day, record) in &dated {
            if *day < first_day {
                continue;
            }
            let offset = (*day - first_day).num_days() as usize;
            for (field, value) in record.iter() {
                if Some(field) == date_key.as_ref() || self.ignored_fields.contains(field) {
                    continue;
                }
                seen.insert(field.as_str());
                if let Some(v) = numeric_value(value) {
                    let slot = columns
                        .entry(field.as_str())
                        .or_default()
                        .entry(offset)
                        .or_insert((0.0, 0));
                    slot.0 += v;
                    slot.1 += 1;
                }
            }
        }

        for dropped in seen.iter().filter(|c| !columns.contains_key(*c)) {
            debug!(column = %dropped, "Dropping non-numeric column");
        }

        let series: Vec<MetricSeries> = columns
            .into_iter()
            .map(|(name, by_day)| {
                let mut slots: Vec<Option<f64>> = vec![None; days];
                for (offset, (sum, count)) in by_day {
                    slots[offset] = Some(sum / count as f64);
                }
                let values = fill_gaps(&slots);
                MetricSeries::daily(name, midnight(first_day), values)
            })
            .collect();

        if series.is_empty() {
            return Err(AnalysisError::NoUsableData);
        }
        Ok(series)
    }

    fn dated_records<'a>(&self, records: &'a [Record], key: &str) -> Vec<(NaiveDate, &'a Record)> {
        let mut dated = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match record.get(key).and_then(parse_timestamp) {
                Some(ts) => dated.push((ts.date_naive(), record)),
                None => {
                    let err = AnalysisError::MalformedRecord {
                        index,
                        reason: format!("missing or unparseable '{key}'"),
                    };
                    warn!(error = %err, "Dropping record");
                }
            }
        }
        dated
    }

    fn synthesize_dates<'a>(&self, records: &'a [Record]) -> Vec<(NaiveDate, &'a Record)> {
        let end = self.anchor.unwrap_or_else(Utc::now).date_naive();
        let n = records.len();
        debug!(records = n, end = %end, "No date field found, synthesizing daily timestamps");
        records
            .iter()
            .enumerate()
            .map(|(i, r)| (end - Duration::days((n - 1 - i) as i64), r))
            .collect()
    }
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Forward fill, then backward fill the leading gap
fn fill_gaps(slots: &[Option<f64>]) -> Vec<f64> {
    let mut filled: Vec<Option<f64>> = Vec::with_capacity(slots.len());
    let mut last = None;
    for slot in slots {
        if slot.is_some() {
            last = *slot;
        }
        filled.push(last);
    }
    let first_known = filled.iter().flatten().next().copied().unwrap_or(0.0);
    filled.into_iter().map(|v| v.unwrap_or(first_known)).collect()
}

/// JSON numbers and numeric strings; anything else counts as missing
fn numeric_value(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    v.is_finite().then_some(v)
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(dt.and_utc());
                }
            }
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(midnight)
        }
        _ => None,
    }
}
