use anyhow::Result;
use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::output::format::{OutputMode, detect_output_mode};
use crate::query::dates;

pub struct RunContext {
    pub output_mode: OutputMode,
    /// The date every derived view treats as today.
    pub today: NaiveDate,
    pub config: AppConfig,
}

impl RunContext {
    /// Create context from CLI arguments
    pub fn from_args(json: bool, no_color: bool, as_of: Option<NaiveDate>, config: AppConfig) -> Result<Self> {
        if no_color {
            colored::control::set_override(false);
        }

        Ok(RunContext {
            output_mode: detect_output_mode(json),
            today: dates::today(as_of),
            config,
        })
    }
}
