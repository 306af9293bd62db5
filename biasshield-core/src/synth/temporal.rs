//! Monthly fairness-metric time series per protected attribute.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::noise::Noise;
use crate::calendar::months_back;
use crate::types::{ProtectedAttribute, TemporalRecord};

/// Number of monthly entries in every series.
pub const SERIES_MONTHS: usize = 24;

/// Shape of a synthetic disparity series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Falls for most of the window, then creeps back up a little.
    ImproveThenRegress,
    /// Flat for the first half, rising through the second.
    StableThenWorsen,
    /// Falls steadily across the whole window.
    MonotonicImprove,
    /// Sinusoid with a 12-month period.
    Cyclical,
}

impl Archetype {
    pub fn for_attribute(attribute: ProtectedAttribute) -> Self {
        match attribute {
            ProtectedAttribute::Gender | ProtectedAttribute::IncomeLevel => {
                Self::ImproveThenRegress
            }
            ProtectedAttribute::Race => Self::StableThenWorsen,
            ProtectedAttribute::AgeGroup => Self::MonotonicImprove,
            ProtectedAttribute::DisabilityStatus => Self::Cyclical,
        }
    }

    /// Approval disparity at month `index` of a `len`-month series.
    pub fn base_disparity(self, index: usize, len: usize) -> f64 {
        let t = if len > 1 {
            index as f64 / (len - 1) as f64
        } else {
            0.0
        };
        match self {
            Self::ImproveThenRegress => {
                if t <= 0.7 {
                    0.15 - 0.09 * (t / 0.7)
                } else {
                    0.06 + 0.02 * ((t - 0.7) / 0.3)
                }
            }
            Self::StableThenWorsen => {
                if t <= 0.5 {
                    0.08
                } else {
                    0.08 + 0.08 * ((t - 0.5) / 0.5)
                }
            }
            Self::MonotonicImprove => 0.18 - 0.13 * t,
            Self::Cyclical => 0.10 + 0.03 * (2.0 * PI * index as f64 / 12.0).sin(),
        }
    }
}

fn record_for(date: NaiveDate, base: f64, noise: &mut Noise) -> TemporalRecord {
    let mut field = |value: f64| (value + noise.sample()).clamp(0.0, 1.0);
    TemporalRecord {
        date,
        approval_disparity: field(base),
        false_positive_disparity: field(base * 0.6),
        false_negative_disparity: field(base * 0.8),
        demographic_parity: field(base * 0.9),
        equalized_odds: field(base * 0.8),
    }
}

/// Builds one ascending 24-month series ending at the month containing `now`.
pub fn generate_series(archetype: Archetype, now: NaiveDate, noise: &mut Noise) -> Vec<TemporalRecord> {
    (0..SERIES_MONTHS)
        .map(|i| {
            let date = months_back(now, (SERIES_MONTHS - 1 - i) as u32);
            record_for(date, archetype.base_disparity(i, SERIES_MONTHS), noise)
        })
        .collect()
}

/// Builds a series for every protected attribute.
pub fn generate_temporal_data(
    now: NaiveDate,
    noise: &mut Noise,
) -> BTreeMap<ProtectedAttribute, Vec<TemporalRecord>> {
    ProtectedAttribute::ALL
        .iter()
        .map(|&attribute| {
            let archetype = Archetype::for_attribute(attribute);
            tracing::debug!(%attribute, ?archetype, "Synthesizing temporal series");
            (attribute, generate_series(archetype, now, noise))
        })
        .collect()
}
