pub mod explain;
pub mod features;
pub mod forest;
pub mod narrative;
pub mod predictor;
pub mod resample;

pub use explain::{feature_contributions, top_contributions, FeatureContribution};
pub use features::{engineer, label_return, DailyBar, FeatureRow, FEATURE_NAMES};
pub use forest::{BalancedRandomForest, ForestConfig, CLASSES};
pub use narrative::{
    build_direction_prompt, build_portfolio_prompt, ChatClient, Direction, LlmClient,
    GRACEFUL_NO_DATA,
};
pub use predictor::{DirectionPredictor, PredictRequest, PredictionRecord};
pub use resample::{resample_weekly, WeeklyRow};
