//! Request Limits Config

use clap::Args;
use custody::items::RequestLimits;

/// Bounds applied to every new request.
#[derive(Debug, Clone, Copy, Args)]
pub struct LimitsConfig {
    /// Maximum companies (tokens) in one request
    #[arg(
        long,
        env = "MAX_COMPANIES_PER_REQUEST",
        default_value_t = 5,
        value_parser = clap::value_parser!(u16).range(1..=20)
    )]
    pub max_companies_per_request: u16,

    /// Maximum purpose length in characters
    #[arg(
        long,
        env = "MAX_PURPOSE_LENGTH",
        default_value_t = 500,
        value_parser = clap::value_parser!(u16).range(50..=2000)
    )]
    pub max_purpose_length: u16,

    /// Maximum comment length in characters
    #[arg(
        long,
        env = "MAX_COMMENT_LENGTH",
        default_value_t = 300,
        value_parser = clap::value_parser!(u16).range(0..=2000)
    )]
    pub max_comment_length: u16,
}

impl From<LimitsConfig> for RequestLimits {
    fn from(config: LimitsConfig) -> Self {
        Self {
            max_items: usize::from(config.max_companies_per_request),
            max_purpose_len: usize::from(config.max_purpose_length),
            max_comment_len: usize::from(config.max_comment_length),
        }
    }
}
