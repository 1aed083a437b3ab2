//! Attribute filters applied when selecting tracks for a tile.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{HeatmapError, HeatmapResult};

/// Date format accepted for `start_date`/`end_date` filters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Attribute filters for track selection.
///
/// Date bounds are inclusive and compare against the track's start date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackFilters {
    pub activity_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TrackFilters {
    /// Build filters from raw request parameters.
    ///
    /// Empty strings count as absent.
    pub fn parse(
        activity_type: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> HeatmapResult<Self> {
        Ok(Self {
            activity_type: non_empty(activity_type).map(str::to_string),
            start_date: parse_date("start_date", start_date)?,
            end_date: parse_date("end_date", end_date)?,
        })
    }

    /// Check a track's attributes against the filters.
    ///
    /// A track missing an attribute never matches an active filter on it.
    pub fn matches(&self, activity_type: Option<&str>, start_date: Option<NaiveDate>) -> bool {
        if let Some(wanted) = &self.activity_type {
            if activity_type != Some(wanted.as_str()) {
                return false;
            }
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(date) = start_date else {
                return false;
            };
            if self.start_date.is_some_and(|from| date < from) {
                return false;
            }
            if self.end_date.is_some_and(|to| date > to) {
                return false;
            }
        }

        true
    }

    /// Canonical cache key fragment: `type,start,end` with empty slots for
    /// absent filters.
    pub fn cache_key(&self) -> String {
        format!(
            "{},{},{}",
            self.activity_type.as_deref().unwrap_or(""),
            self.start_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            self.end_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(param: &str, value: Option<&str>) -> HeatmapResult<Option<NaiveDate>> {
    non_empty(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, DATE_FORMAT).map_err(|e| {
                HeatmapError::InvalidParameter {
                    param: param.to_string(),
                    message: format!("expected YYYY-MM-DD, got '{}': {}", v, e),
                }
            })
        })
        .transpose()
}
