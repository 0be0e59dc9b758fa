//! Minimal runtime configuration helpers.
//! Defaults match a snapshot saved next to the binary.

use crate::models::ids::HomeId;
use crate::utils::parse_reference;
use chrono::{DateTime, FixedOffset, Utc};
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const DEFAULT_HOMES_DATA: &str = "homes_data.json";
pub const DEFAULT_PERIOD_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Saved `homesdata` response (envelope or bare list of homes).
    pub homes_data: PathBuf,
    /// Saved `homestatus` response for one of the homes.
    pub home_status: Option<PathBuf>,
    /// Restrict the report to a single home.
    pub home_id: Option<HomeId>,
    /// Instant the report is computed for; the current time when unset.
    pub reference: Option<DateTime<FixedOffset>>,
    /// Upcoming transitions listed per schedule.
    pub period_count: NonZeroUsize,
    pub output: OutputFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        // Blank values count as unset.
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let homes_data = var("NETATMO_HOMES_DATA").unwrap_or_else(|| DEFAULT_HOMES_DATA.to_string());
        let home_status = var("NETATMO_HOME_STATUS").map(PathBuf::from);

        let home_id = match var("NETATMO_HOME_ID") {
            Some(s) => Some(HomeId::from_hex(&s).map_err(|e| format!("NETATMO_HOME_ID: {}", e))?),
            None => None,
        };

        let reference = match var("NETATMO_REFERENCE") {
            Some(s) => Some(parse_reference(&s).map_err(|e| format!("NETATMO_REFERENCE: {}", e))?),
            None => None,
        };

        let period_count = match var("NETATMO_PERIOD_COUNT") {
            Some(s) => s
                .parse::<NonZeroUsize>()
                .map_err(|_| "NETATMO_PERIOD_COUNT must be a positive integer".to_string())?,
            None => NonZeroUsize::new(DEFAULT_PERIOD_COUNT).ok_or("default period count is zero")?,
        };

        let output = match var("NETATMO_OUTPUT").as_deref() {
            None | Some("text") => OutputFormat::Text,
            Some("json") => OutputFormat::Json,
            Some(other) => return Err(format!("NETATMO_OUTPUT must be 'text' or 'json', got '{}'", other)),
        };

        Ok(Config {
            homes_data: PathBuf::from(homes_data),
            home_status,
            home_id,
            reference,
            period_count,
            output,
        })
    }

    /// The configured reference instant, or now.
    pub fn reference_or_now(&self) -> DateTime<FixedOffset> {
        self.reference.unwrap_or_else(|| Utc::now().fixed_offset())
    }
}
