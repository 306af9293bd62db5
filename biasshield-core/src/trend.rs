//! Trend analysis over monthly fairness-metric series.
//!
//! All metrics in a [`TemporalRecord`] are disparities, so a falling series
//! counts as improving.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::months_back;
use crate::error::BiasShieldError;
use crate::types::TemporalRecord;

/// Percent change beyond which a series is no longer stable.
pub const TREND_THRESHOLD_PERCENT: f64 = 10.0;

const HIGH_VOLATILITY: f64 = 0.2;
const LOW_VOLATILITY: f64 = 0.05;

/// How much history to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    All,
    Year,
    Quarter,
    Month,
}

impl TimeRange {
    /// Number of calendar months covered, `None` for `All`.
    pub fn months(self) -> Option<u32> {
        match self {
            Self::All => None,
            Self::Year => Some(12),
            Self::Quarter => Some(3),
            Self::Month => Some(1),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Year => "year",
            Self::Quarter => "quarter",
            Self::Month => "month",
        })
    }
}

impl FromStr for TimeRange {
    type Err = BiasShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "year" => Ok(Self::Year),
            "quarter" => Ok(Self::Quarter),
            "month" => Ok(Self::Month),
            other => Err(BiasShieldError::invalid_input(format!(
                "unknown time range '{}'",
                other
            ))),
        }
    }
}

/// Keeps the records that fall within the last `range` calendar months,
/// counting the month containing `now`.
pub fn filter_by_time_range(
    series: &[TemporalRecord],
    range: TimeRange,
    now: NaiveDate,
) -> Vec<TemporalRecord> {
    match range.months() {
        None => series.to_vec(),
        Some(months) => {
            let cutoff = months_back(now, months.saturating_sub(1));
            series
                .iter()
                .filter(|r| r.date >= cutoff)
                .cloned()
                .collect()
        }
    }
}

/// Centred moving average.
///
/// The output has the same length as `values` with `window / 2` `None`
/// entries at each end. If the series is shorter than the window, or the
/// window is zero, the values are returned unchanged.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || values.len() < window {
        return values.iter().copied().map(Some).collect();
    }

    let half = window / 2;
    let n = values.len();
    (0..n)
        .map(|i| {
            if i < half || i + half >= n {
                return None;
            }
            let start = i - half;
            let slice = &values[start..start + window];
            Some(slice.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Direction of a disparity series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Improving => "improving",
            Self::Worsening => "worsening",
            Self::Stable => "stable",
        })
    }
}

/// Result of comparing the start and end of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub trend: Trend,
    pub percent_change: f64,
    /// False when fewer than two points were available.
    pub sufficient_data: bool,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compares the mean of the first and last `clamp(n / 3, 1, 3)` points.
///
/// Below -10% the series is improving, above +10% worsening. A zero starting
/// mean yields a 0% change.
pub fn analyze_trend(values: &[f64]) -> TrendAnalysis {
    let n = values.len();
    if n < 2 {
        return TrendAnalysis {
            trend: Trend::Stable,
            percent_change: 0.0,
            sufficient_data: false,
        };
    }

    let window = (n / 3).clamp(1, 3);
    let start_avg = mean(&values[..window]);
    let end_avg = mean(&values[n - window..]);
    let percent_change = if start_avg == 0.0 {
        0.0
    } else {
        (end_avg - start_avg) / start_avg * 100.0
    };

    let trend = if percent_change < -TREND_THRESHOLD_PERCENT {
        Trend::Improving
    } else if percent_change > TREND_THRESHOLD_PERCENT {
        Trend::Worsening
    } else {
        Trend::Stable
    };

    TrendAnalysis {
        trend,
        percent_change,
        sufficient_data: true,
    }
}

/// Coefficient of variation (population standard deviation over mean).
/// `None` for an empty series or a zero mean.
pub fn volatility(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = mean(values);
    if m == 0.0 {
        return None;
    }
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt() / m)
}

/// Volatility band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityLevel {
    Low,
    Moderate,
    High,
}

impl VolatilityLevel {
    pub fn classify(coefficient: f64) -> Self {
        if coefficient > HIGH_VOLATILITY {
            Self::High
        } else if coefficient < LOW_VOLATILITY {
            Self::Low
        } else {
            Self::Moderate
        }
    }
}

impl fmt::Display for VolatilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        })
    }
}

/// Field of a [`TemporalRecord`] to analyze.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    #[default]
    ApprovalDisparity,
    FalsePositiveDisparity,
    FalseNegativeDisparity,
    DemographicParity,
    EqualizedOdds,
}

impl MetricField {
    pub const ALL: [MetricField; 5] = [
        MetricField::ApprovalDisparity,
        MetricField::FalsePositiveDisparity,
        MetricField::FalseNegativeDisparity,
        MetricField::DemographicParity,
        MetricField::EqualizedOdds,
    ];

    pub fn get(self, record: &TemporalRecord) -> f64 {
        match self {
            Self::ApprovalDisparity => record.approval_disparity,
            Self::FalsePositiveDisparity => record.false_positive_disparity,
            Self::FalseNegativeDisparity => record.false_negative_disparity,
            Self::DemographicParity => record.demographic_parity,
            Self::EqualizedOdds => record.equalized_odds,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApprovalDisparity => "approval_disparity",
            Self::FalsePositiveDisparity => "false_positive_disparity",
            Self::FalseNegativeDisparity => "false_negative_disparity",
            Self::DemographicParity => "demographic_parity",
            Self::EqualizedOdds => "equalized_odds",
        }
    }

    pub fn values(self, series: &[TemporalRecord]) -> Vec<f64> {
        series.iter().map(|r| self.get(r)).collect()
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricField {
    type Err = BiasShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| BiasShieldError::invalid_input(format!("unknown metric '{}'", s)))
    }
}

/// Trend, volatility and smoothed line for one metric of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub metric: MetricField,
    pub points: usize,
    pub trend: TrendAnalysis,
    pub volatility: Option<f64>,
    pub volatility_level: Option<VolatilityLevel>,
    pub moving_average: Vec<Option<f64>>,
}

pub fn summarize_series(
    series: &[TemporalRecord],
    metric: MetricField,
    window: usize,
) -> SeriesSummary {
    let values = metric.values(series);
    let volatility = volatility(&values);
    SeriesSummary {
        metric,
        points: values.len(),
        trend: analyze_trend(&values),
        volatility,
        volatility_level: volatility.map(VolatilityLevel::classify),
        moving_average: moving_average(&values, window),
    }
}
