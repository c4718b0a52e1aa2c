//! Direction prediction entry point.
//!
//! Per request: LOAD daily bars, FEATURE, RESAMPLE to Friday weeks,
//! SPLIT around the reference date, then either return gracefully or
//! FIT, PREDICT, EXPLAIN, and NARRATE. The CPU stages run on the
//! blocking pool so the async request loop stays responsive.

use std::sync::Arc;

use advisor_core::{
    friday_anchor, next_friday, parse_date, week_end, week_start, AdvisorError, PredictorConfig,
};
use advisor_data::repositories::PriceRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::explain::{feature_contributions, top_contributions, FeatureContribution};
use crate::features::{engineer, DailyBar};
use crate::forest::{class_index, BalancedRandomForest, ForestConfig, N_FEATURES};
use crate::narrative::{
    build_direction_prompt, fallback_narrative, Direction, LlmClient, GRACEFUL_NO_DATA,
};
use crate::resample::resample_weekly;

/// Features surfaced in the narrative.
const TOP_FEATURES: usize = 3;

/// Prediction entry point input.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub ticker: String,
    /// Reference date, `YYYY-MM-DD`; training uses rows up to this date.
    pub date: String,
}

/// Prediction response.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub ticker: String,
    pub reference_week_end: NaiveDate,
    pub next_week_start: NaiveDate,
    pub next_week_end: NaiveDate,
    /// 1 up, 0 flat, -1 down.
    pub label: i8,
    pub summary: String,
}

/// Outcome of the CPU pipeline, before narration.
#[derive(Debug)]
pub(crate) enum PipelineOutcome {
    /// No feature rows survived resampling; the narrative stays empty.
    EmptyWindow,
    /// Rows exist but the next-Friday prediction row is absent, or the
    /// training window cannot support a fit.
    NoPredictionRow,
    Predicted {
        label: i8,
        top: Vec<FeatureContribution>,
    },
}

/// LOAD is done by the caller; this runs FEATURE through EXPLAIN.
pub(crate) fn run_pipeline(
    bars: &[DailyBar],
    end_date: NaiveDate,
    config: &ForestConfig,
) -> PipelineOutcome {
    let rows = engineer(bars);
    let weekly = resample_weekly(&rows);
    if weekly.is_empty() {
        warn!(%end_date, "no feature rows after resampling");
        return PipelineOutcome::EmptyWindow;
    }

    let target_week = next_friday(end_date);
    let Some(prediction) = weekly.iter().find(|w| w.week_end == target_week) else {
        info!(%target_week, "prediction row absent");
        return PipelineOutcome::NoPredictionRow;
    };

    let mut x: Vec<[f64; N_FEATURES]> = Vec::new();
    let mut y: Vec<i8> = Vec::new();
    for week in &weekly {
        if week.row.date <= end_date {
            if let Some(target) = week.row.target {
                x.push(week.row.features);
                y.push(target);
            }
        }
    }
    if x.is_empty() {
        warn!(%end_date, "no labeled rows in the training window");
        return PipelineOutcome::NoPredictionRow;
    }

    let forest = match BalancedRandomForest::fit(&x, &y, config) {
        Ok(forest) => forest,
        Err(err) => {
            warn!(%err, "forest fit failed");
            return PipelineOutcome::NoPredictionRow;
        }
    };

    let label = forest.predict(&prediction.row.features);
    let contributions =
        feature_contributions(&forest, &prediction.row.features, class_index(label));
    PipelineOutcome::Predicted {
        label,
        top: top_contributions(&contributions, TOP_FEATURES),
    }
}

/// The weekly direction predictor.
pub struct DirectionPredictor {
    prices: PriceRepository,
    llm: Arc<dyn LlmClient>,
    forest_config: ForestConfig,
}

impl DirectionPredictor {
    /// Creates a predictor with the configured forest seed.
    #[must_use]
    pub fn new(prices: PriceRepository, llm: Arc<dyn LlmClient>, config: &PredictorConfig) -> Self {
        Self {
            prices,
            llm,
            forest_config: ForestConfig::default().with_seed(config.seed),
        }
    }

    /// Predicts next week's direction for a ticker.
    ///
    /// # Errors
    /// Returns a client error for malformed dates, a server error when
    /// the price store stays unavailable after retry. Model and chat
    /// failures degrade the narrative instead of failing.
    pub async fn predict(
        &self,
        request: &PredictRequest,
    ) -> Result<PredictionRecord, AdvisorError> {
        let end_date = parse_date(&request.date)?;

        let records = self
            .prices
            .daily_history(&request.ticker)
            .await
            .map_err(|err| AdvisorError::StoreUnavailable(format!("{err:#}")))?;
        let bars: Vec<DailyBar> = records.iter().map(DailyBar::from).collect();

        let config = self.forest_config.clone();
        let outcome = tokio::task::spawn_blocking(move || run_pipeline(&bars, end_date, &config))
            .await
            .unwrap_or_else(|err| {
                error!(%err, "prediction pipeline task failed");
                PipelineOutcome::EmptyWindow
            });

        let target_week = next_friday(end_date);
        let mut record = PredictionRecord {
            ticker: request.ticker.clone(),
            reference_week_end: friday_anchor(end_date),
            next_week_start: week_start(target_week),
            next_week_end: week_end(target_week),
            label: 0,
            summary: String::new(),
        };

        match outcome {
            PipelineOutcome::EmptyWindow => Ok(record),
            PipelineOutcome::NoPredictionRow => {
                record.summary = GRACEFUL_NO_DATA.to_string();
                Ok(record)
            }
            PipelineOutcome::Predicted { label, top } => {
                let direction = Direction::from_label(label);
                let prompt = build_direction_prompt(end_date, direction, &top);

                record.label = label;
                record.summary = match self.llm.complete(&prompt).await {
                    Ok(narrative) if !narrative.trim().is_empty() => narrative,
                    Ok(_) => {
                        warn!("chat model returned empty narrative, using template");
                        fallback_narrative(direction)
                    }
                    Err(err) => {
                        warn!(%err, "chat model unavailable, using template narrative");
                        fallback_narrative(direction)
                    }
                };
                info!(
                    ticker = request.ticker,
                    label, "direction prediction complete"
                );
                Ok(record)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, Weekday};

    fn bars(count: usize) -> Vec<DailyBar> {
        let mut date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(); // a Monday
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            out.push(DailyBar {
                date,
                // Trendy but wiggly series: all three target classes occur.
                close: 100.0 + i as f64 * 0.2 + (i as f64 * 0.9).sin() * 2.0,
            });
            date += Duration::days(1);
            while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                date += Duration::days(1);
            }
        }
        out
    }

    #[test]
    fn short_history_is_an_empty_window() {
        let bars = bars(10);
        let end_date = bars.last().unwrap().date;
        let outcome = run_pipeline(&bars, end_date, &ForestConfig::default());

        assert!(matches!(outcome, PipelineOutcome::EmptyWindow));
    }

    #[test]
    fn missing_next_friday_returns_graceful_outcome() {
        let bars = bars(120);
        // Reference at the final bar: nothing exists past it.
        let end_date = bars.last().unwrap().date;
        let outcome = run_pipeline(&bars, end_date, &ForestConfig::default());

        assert!(matches!(outcome, PipelineOutcome::NoPredictionRow));
    }

    #[test]
    fn full_history_predicts_with_three_ranked_features() {
        let bars = bars(150);
        let end_date = bars[120].date;
        let outcome = run_pipeline(&bars, end_date, &ForestConfig::default());

        let PipelineOutcome::Predicted { label, top } = outcome else {
            panic!("expected a prediction, got {outcome:?}");
        };
        assert!([-1, 0, 1].contains(&label));
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[2].rank, 3);
    }

    #[test]
    fn pipeline_is_reproducible_with_fixed_seed() {
        let bars = bars(150);
        let end_date = bars[120].date;
        let config = ForestConfig::default().with_seed(42);

        let first = run_pipeline(&bars, end_date, &config);
        let second = run_pipeline(&bars, end_date, &config);

        let (PipelineOutcome::Predicted { label: a, .. }, PipelineOutcome::Predicted { label: b, .. }) =
            (first, second)
        else {
            panic!("expected predictions");
        };
        assert_eq!(a, b);
    }

    #[test]
    fn prediction_record_serializes_expected_shape() {
        let record = PredictionRecord {
            ticker: "AAPL".to_string(),
            reference_week_end: NaiveDate::from_ymd_opt(2025, 6, 6).unwrap(),
            next_week_start: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            next_week_end: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            label: 1,
            summary: "전망".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["ticker"], "AAPL");
        assert_eq!(json["label"], 1);
        assert_eq!(json["next_week_start"], "2025-06-08");
    }

    #[test]
    fn request_deserializes_from_wire_json() {
        let request: PredictRequest =
            serde_json::from_str(r#"{"ticker": "NVDA", "date": "2025-06-04"}"#).unwrap();
        assert_eq!(request.ticker, "NVDA");
        assert_eq!(request.date, "2025-06-04");
    }
}
