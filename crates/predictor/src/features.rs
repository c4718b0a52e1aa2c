//! Daily feature engineering.
//!
//! All indicators are computed at daily granularity before the weekly
//! resample. Rows inside the indicator warm-up window carry NaN features
//! and are dropped; the ternary target is only defined where the 5-step
//! forward return exists.

use advisor_data::models::PriceRecord;
use chrono::NaiveDate;
use serde::Serialize;

/// Ternary target threshold on the 5-step forward return.
pub const TARGET_THRESHOLD: f64 = 0.00267;

/// Steps ahead for the forward return.
pub const FORWARD_STEPS: usize = 5;

/// Feature columns, in model order.
pub const FEATURE_NAMES: [&str; 10] = [
    "SMA_5",
    "SMA_20",
    "SMA_diff",
    "RSI_14",
    "Momentum_10",
    "ROC_10",
    "price_to_peak",
    "price_to_trough",
    "consecutive_up_days",
    "consecutive_down_days",
];

/// A daily close used by the feature pipeline.
#[derive(Debug, Clone, Copy)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl From<&PriceRecord> for DailyBar {
    fn from(record: &PriceRecord) -> Self {
        Self {
            date: record.date,
            close: record.adj_close_f64(),
        }
    }
}

/// One engineered row: complete features, target where defined.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub close: f64,
    pub features: [f64; 10],
    /// 1, 0, or -1; `None` where the forward window is incomplete.
    pub target: Option<i8>,
}

/// Labels a 5-step forward return.
#[must_use]
pub fn label_return(forward_return: f64) -> i8 {
    if forward_return >= TARGET_THRESHOLD {
        1
    } else if forward_return <= -TARGET_THRESHOLD {
        -1
    } else {
        0
    }
}

/// Engineers feature rows from daily bars.
///
/// Bars must be sorted by date ascending. Rows with any NaN feature are
/// dropped; the warm-up window (first 19 bars) never survives.
#[must_use]
pub fn engineer(bars: &[DailyBar]) -> Vec<FeatureRow> {
    let n = bars.len();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let sma_5 = rolling_mean(&closes, 5);
    let sma_20 = rolling_mean(&closes, 20);
    let rsi_14 = rsi(&closes, 14);
    let peak_20 = rolling_max(&closes, 20);
    let trough_20 = rolling_min(&closes, 20);
    let (up_streak, down_streak) = streaks(&closes);

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let momentum = if i >= 10 { closes[i] - closes[i - 10] } else { f64::NAN };
        let roc = if i >= 10 {
            (closes[i] - closes[i - 10]) / closes[i - 10] * 100.0
        } else {
            f64::NAN
        };

        let features = [
            sma_5[i],
            sma_20[i],
            sma_5[i] - sma_20[i],
            rsi_14[i],
            momentum,
            roc,
            closes[i] / peak_20[i],
            closes[i] / trough_20[i],
            up_streak[i],
            down_streak[i],
        ];
        if features.iter().any(|v| v.is_nan()) {
            continue;
        }

        let target = if i + FORWARD_STEPS < n {
            let forward = closes[i + FORWARD_STEPS] / closes[i] - 1.0;
            Some(label_return(forward))
        } else {
            None
        };

        rows.push(FeatureRow {
            date: bars[i].date,
            close: closes[i],
            features,
            target,
        });
    }
    rows
}

fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                f64::NAN
            } else {
                values[i + 1 - window..=i].iter().sum::<f64>() / window as f64
            }
        })
        .collect()
}

fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                f64::NAN
            } else {
                values[i + 1 - window..=i].iter().copied().fold(f64::MIN, f64::max)
            }
        })
        .collect()
}

fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                f64::NAN
            } else {
                values[i + 1 - window..=i].iter().copied().fold(f64::MAX, f64::min)
            }
        })
        .collect()
}

/// Wilder RSI: simple first average, smoothed thereafter.
fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if n <= period {
        return out;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = values[i] - values[i - 1];
        avg_gain += delta.max(0.0);
        avg_loss += (-delta).max(0.0);
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = rsi_value(avg_gain, avg_loss);

    for i in period + 1..n {
        let delta = values[i] - values[i - 1];
        avg_gain = (avg_gain * (period - 1) as f64 + delta.max(0.0)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + (-delta).max(0.0)) / period as f64;
        out[i] = rsi_value(avg_gain, avg_loss);
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Running length of the current monotone run, up and down.
fn streaks(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = values.len();
    let mut up = vec![0.0; n];
    let mut down = vec![0.0; n];

    for i in 1..n {
        if values[i] > values[i - 1] {
            up[i] = up[i - 1] + 1.0;
        } else if values[i] < values[i - 1] {
            down[i] = down[i - 1] + 1.0;
        }
    }
    (up, down)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration};

    /// Business-day bars from a closing-price series.
    fn bars_from(closes: &[f64]) -> Vec<DailyBar> {
        let mut date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(); // a Monday
        let mut bars = Vec::with_capacity(closes.len());
        for &close in closes {
            bars.push(DailyBar { date, close });
            date += Duration::days(1);
            while matches!(
                date.weekday(),
                chrono::Weekday::Sat | chrono::Weekday::Sun
            ) {
                date += Duration::days(1);
            }
        }
        bars
    }

    // ============================================
    // Target labeling
    // ============================================

    #[test]
    fn label_thresholds_are_exact() {
        assert_eq!(label_return(0.003), 1);
        assert_eq!(label_return(0.00267), 1);
        assert_eq!(label_return(0.00266), 0);
        assert_eq!(label_return(0.0), 0);
        assert_eq!(label_return(-0.00266), 0);
        assert_eq!(label_return(-0.00267), -1);
        assert_eq!(label_return(-0.01), -1);
    }

    #[test]
    fn targets_are_ternary() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + f64::from(i % 7)).collect();
        let rows = engineer(&bars_from(&closes));

        for row in &rows {
            if let Some(target) = row.target {
                assert!([-1, 0, 1].contains(&target));
            }
        }
    }

    // ============================================
    // Indicators
    // ============================================

    #[test]
    fn warmup_rows_are_dropped() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i)).collect();
        let bars = bars_from(&closes);
        let rows = engineer(&bars);

        // First complete row is bar index 19 (SMA_20 window).
        assert_eq!(rows.len(), 30 - 19);
        assert_eq!(rows[0].date, bars[19].date);
        for row in &rows {
            assert!(row.features.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn sma_diff_is_consistent() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + f64::from(i)).collect();
        let rows = engineer(&bars_from(&closes));

        for row in &rows {
            let (sma5, sma20, diff) = (row.features[0], row.features[1], row.features[2]);
            assert!((diff - (sma5 - sma20)).abs() < 1e-9);
            // Rising series: short mean above long mean.
            assert!(diff > 0.0);
        }
    }

    #[test]
    fn rsi_is_hundred_on_monotonic_rise() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + f64::from(i)).collect();
        let rows = engineer(&bars_from(&closes));

        for row in &rows {
            assert!((row.features[3] - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn rsi_stays_in_bounds_on_mixed_series() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (f64::from(i) * 0.7).sin() * 5.0)
            .collect();
        let rows = engineer(&bars_from(&closes));

        for row in &rows {
            assert!((0.0..=100.0).contains(&row.features[3]));
        }
    }

    #[test]
    fn momentum_and_roc_agree() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + f64::from(i) * 2.0).collect();
        let rows = engineer(&bars_from(&closes));

        for row in &rows {
            // Momentum over 10 steps of +2 each is 20.
            assert!((row.features[4] - 20.0).abs() < 1e-9);
            assert!(row.features[5] > 0.0);
        }
    }

    #[test]
    fn peak_trough_ratios_bracket_one() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (f64::from(i) * 0.5).cos() * 10.0)
            .collect();
        let rows = engineer(&bars_from(&closes));

        for row in &rows {
            assert!(row.features[6] <= 1.0 + 1e-9, "price_to_peak > 1");
            assert!(row.features[7] >= 1.0 - 1e-9, "price_to_trough < 1");
        }
    }

    #[test]
    fn streaks_count_monotone_runs() {
        let (up, down) = streaks(&[1.0, 2.0, 3.0, 2.5, 2.0, 2.0, 3.0]);

        assert_eq!(up, vec![0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(down, vec![0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn last_rows_have_no_target() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i)).collect();
        let rows = engineer(&bars_from(&closes));

        let without_target = rows.iter().filter(|r| r.target.is_none()).count();
        assert_eq!(without_target, FORWARD_STEPS);
        assert!(rows.last().unwrap().target.is_none());
    }
}
