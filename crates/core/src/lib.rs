pub mod config;
pub mod config_loader;
pub mod error;
pub mod week;

pub use config::{
    AnalyticsConfig, AppConfig, DatabaseConfig, InferenceConfig, LexiconConfig, LlmConfig,
    PredictorConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{parse_date, AdvisorError, ErrorClass};
pub use week::{friday_anchor, next_friday, week_end, week_label, week_start};
