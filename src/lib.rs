pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

pub use commands::output::{format_record, format_unratable};
pub use commands::scoring::{rate_repository, ScoreOrchestrator};
pub use commands::settings::{load_scoring_settings, ScoringSettings};
pub use error::RatingError;
pub use models::score_card::{accepts, Metric, MetricResult, RatingOutcome, ScoreCard, ACCEPT_THRESHOLD};
pub use models::snapshot::RepositorySnapshot;
