//! Narrative prompt assembly and the chat-model client.
//!
//! The prediction narrative is generated by an external language model;
//! this module owns the prompt contract: a fixed Korean opening sentence
//! with the reference date and direction word, the direction-conditioned
//! interpretation of the strongest features, and the style constraint.
//! The portfolio-comparison prompt lives here under the same contract.

use std::time::Duration;

use advisor_core::LlmConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::explain::FeatureContribution;

/// Fixed response when the prediction row is missing.
pub const GRACEFUL_NO_DATA: &str =
    "예측에 필요한 다음 주 시세 데이터가 아직 없어 전망을 제공할 수 없습니다.";

/// Predicted direction of next week's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    /// Direction word used in prompts.
    #[must_use]
    pub fn korean(self) -> &'static str {
        match self {
            Direction::Up => "상승",
            Direction::Down => "하락",
            Direction::Flat => "보합",
        }
    }

    /// Maps a ternary label to a direction.
    #[must_use]
    pub fn from_label(label: i8) -> Self {
        match label {
            1 => Direction::Up,
            -1 => Direction::Down,
            _ => Direction::Flat,
        }
    }
}

/// Direction-conditioned interpretation of one feature.
#[must_use]
pub fn interpretation(feature: &str, direction: Direction) -> &'static str {
    use Direction::{Down, Flat, Up};
    match (feature, direction) {
        ("SMA_5", Up) => "단기 이동평균이 주가를 위쪽으로 끌어올리는 흐름입니다.",
        ("SMA_5", Down) => "단기 이동평균이 주가 하락 흐름을 반영하고 있습니다.",
        ("SMA_5", Flat) => "단기 이동평균이 뚜렷한 방향 없이 횡보하고 있습니다.",
        ("SMA_20", Up) => "한 달 흐름을 담은 이동평균이 완만한 오름세를 보입니다.",
        ("SMA_20", Down) => "한 달 흐름을 담은 이동평균이 내림세로 돌아섰습니다.",
        ("SMA_20", Flat) => "한 달 흐름을 담은 이동평균이 제자리걸음입니다.",
        ("SMA_diff", Up) => "단기 평균이 장기 평균 위에 있어 상승 탄력이 살아 있습니다.",
        ("SMA_diff", Down) => "단기 평균이 장기 평균 아래로 내려가 약세 신호가 나타납니다.",
        ("SMA_diff", Flat) => "단기와 장기 평균의 간격이 좁아 방향성이 약합니다.",
        ("RSI_14", Up) => "매수세가 매도세보다 우위에 있는 구간입니다.",
        ("RSI_14", Down) => "매도세가 강해 조정 압력이 남아 있습니다.",
        ("RSI_14", Flat) => "매수와 매도의 힘이 균형을 이루고 있습니다.",
        ("Momentum_10", Up) => "최근 두 주간의 가격 탄력이 위쪽을 향하고 있습니다.",
        ("Momentum_10", Down) => "최근 두 주간의 가격 탄력이 아래쪽으로 기울었습니다.",
        ("Momentum_10", Flat) => "최근 두 주간의 가격 탄력이 거의 사라졌습니다.",
        ("ROC_10", Up) => "가격 변화 속도가 점차 빨라지며 상승을 지지합니다.",
        ("ROC_10", Down) => "가격 변화 속도가 하락 쪽으로 기울어 있습니다.",
        ("ROC_10", Flat) => "가격 변화 속도가 느려 큰 움직임이 보이지 않습니다.",
        ("price_to_peak", Up) => "최근 고점에 바짝 다가서며 돌파 시도가 이어집니다.",
        ("price_to_peak", Down) => "최근 고점과의 거리가 벌어져 부담이 남아 있습니다.",
        ("price_to_peak", Flat) => "최근 고점 아래 일정한 범위에 머물러 있습니다.",
        ("price_to_trough", Up) => "최근 저점에서 충분히 반등해 바닥을 다진 모습입니다.",
        ("price_to_trough", Down) => "최근 저점 부근까지 되밀리며 지지력이 시험받고 있습니다.",
        ("price_to_trough", Flat) => "최근 저점 위에서 안정된 범위를 유지하고 있습니다.",
        ("consecutive_up_days", Up) => "상승일이 연달아 이어지며 분위기가 달아오르고 있습니다.",
        ("consecutive_up_days", Down) => "연속 상승 뒤 숨 고르기가 나타날 수 있는 자리입니다.",
        ("consecutive_up_days", Flat) => "상승일이 길게 이어지지 못하고 끊기는 모습입니다.",
        ("consecutive_down_days", Up) => "하락 행진이 멈추며 반등 기대가 커지고 있습니다.",
        ("consecutive_down_days", Down) => "하락일이 연달아 이어지며 투자 심리가 위축됐습니다.",
        ("consecutive_down_days", Flat) => "하락세가 잦아들며 바닥 부근에서 균형을 찾고 있습니다.",
        _ => "보조 지표가 현재 흐름을 뒷받침하고 있습니다.",
    }
}

/// Builds the direction-prediction prompt.
///
/// The opening sentence is fixed; the listed interpretations follow the
/// attribution ranking; the closing constraint pins style and length.
#[must_use]
pub fn build_direction_prompt(
    reference_date: NaiveDate,
    direction: Direction,
    top: &[FeatureContribution],
) -> String {
    let mut prompt = format!(
        "{}을 기준으로, AI 모델이 다음 주 주가가 {}할 것으로 예측했습니다.\n\n주요 판단 근거:\n",
        reference_date.format("%Y-%m-%d"),
        direction.korean(),
    );
    for contribution in top {
        prompt.push_str(&format!(
            "{}. {}\n",
            contribution.rank,
            interpretation(&contribution.feature, direction)
        ));
    }
    prompt.push_str(
        "\n위 근거를 바탕으로 투자자가 이해하기 쉬운 3~4문장의 자연스러운 설명을 작성하세요. \
         숫자나 전문 용어는 사용하지 마세요.",
    );
    prompt
}

/// Builds the portfolio-comparison prompt from client and peer-average
/// sector weights.
#[must_use]
pub fn build_portfolio_prompt(
    client_weights: &[(String, f64)],
    peer_weights: &[(String, f64)],
) -> String {
    let format_weights = |weights: &[(String, f64)]| {
        weights
            .iter()
            .map(|(sector, weight)| format!("{sector} {:.1}%", weight * 100.0))
            .collect::<Vec<String>>()
            .join(", ")
    };

    format!(
        "고객 포트폴리오의 업종 비중은 {}입니다. 비슷한 고객들의 평균 비중은 {}입니다. \
         두 구성을 비교해 고객 포트폴리오의 특징과 차이를 하나의 자연스러운 문단으로 설명하세요.",
        format_weights(client_weights),
        format_weights(peer_weights),
    )
}

/// Template narrative used when the chat model is unavailable.
#[must_use]
pub fn fallback_narrative(direction: Direction) -> String {
    format!(
        "AI 모델은 다음 주 주가가 {} 흐름을 보일 것으로 전망했습니다. \
         최근 가격 흐름과 수급 지표를 종합한 결과입니다. \
         자세한 설명은 잠시 후 다시 확인해 주세요.",
        direction.korean()
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: String,
}

/// The external chat model behind the narrative step.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Completes a prompt into narrative text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// HTTP chat client.
pub struct ChatClient {
    http: Client,
    base_url: String,
    model: String,
}

impl ChatClient {
    /// Creates a client for the configured chat endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building chat HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            prompt,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .context("chat request failed")?;

        anyhow::ensure!(
            response.status().is_success(),
            "chat endpoint returned {}",
            response.status()
        );

        let body: ChatResponse = response.json().await.context("parsing chat response")?;
        Ok(body.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_NAMES;

    fn contribution(feature: &str, value: f64, rank: usize) -> FeatureContribution {
        FeatureContribution {
            feature: feature.to_string(),
            value,
            rank,
        }
    }

    #[test]
    fn direction_words() {
        assert_eq!(Direction::from_label(1).korean(), "상승");
        assert_eq!(Direction::from_label(-1).korean(), "하락");
        assert_eq!(Direction::from_label(0).korean(), "보합");
    }

    #[test]
    fn interpretation_table_covers_all_combinations() {
        let fallback = interpretation("unknown_feature", Direction::Up);

        for feature in FEATURE_NAMES {
            for direction in [Direction::Up, Direction::Down, Direction::Flat] {
                let line = interpretation(feature, direction);
                assert!(!line.is_empty());
                assert_ne!(line, fallback, "missing entry for {feature}");
            }
        }
    }

    #[test]
    fn prompt_opens_with_fixed_template() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();
        let top = vec![
            contribution("SMA_diff", 0.21, 1),
            contribution("RSI_14", 0.12, 2),
            contribution("ROC_10", -0.05, 3),
        ];

        let prompt = build_direction_prompt(date, Direction::Up, &top);

        assert!(prompt.starts_with(
            "2025-06-06을 기준으로, AI 모델이 다음 주 주가가 상승할 것으로 예측했습니다."
        ));
        assert!(prompt.contains("1. "));
        assert!(prompt.contains("3. "));
        assert!(prompt.contains("3~4문장"));
        assert!(prompt.contains(interpretation("SMA_diff", Direction::Up)));
    }

    #[test]
    fn portfolio_prompt_names_both_weightings() {
        let client = vec![
            ("Technology".to_string(), 0.62),
            ("Financials".to_string(), 0.38),
        ];
        let peers = vec![
            ("Technology".to_string(), 0.45),
            ("Financials".to_string(), 0.55),
        ];

        let prompt = build_portfolio_prompt(&client, &peers);

        assert!(prompt.contains("Technology 62.0%"));
        assert!(prompt.contains("Technology 45.0%"));
        assert!(prompt.contains("문단"));
    }

    #[test]
    fn fallback_narrative_mentions_direction() {
        for direction in [Direction::Up, Direction::Down, Direction::Flat] {
            let narrative = fallback_narrative(direction);
            assert!(narrative.contains(direction.korean()));
        }
    }

    #[test]
    fn graceful_message_is_fixed_and_nonempty() {
        assert!(!GRACEFUL_NO_DATA.is_empty());
    }
}
