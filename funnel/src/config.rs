//! Analysis options.
//!
//! Layers, lowest precedence first: built-in defaults, a JSON config file,
//! environment variables (a `.env` file is honoured), then CLI flags applied
//! by the binary.
//!
//! | variable                       | meaning                                   |
//! |--------------------------------|-------------------------------------------|
//! | `OFFER_FUNNEL_MIN_DIFFICULTY`  | minimum difficulty kept, or `none`        |
//! | `OFFER_FUNNEL_MIN_REWARD`      | minimum reward kept, or `none`            |
//! | `OFFER_FUNNEL_MIN_DURATION`    | minimum duration kept, or `none`          |
//! | `OFFER_FUNNEL_ORDER`           | `count_desc` or `canonical` for all queries |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::analysis::queries::Query;
use crate::error::{ConfigError, ConfigResult};
use crate::funnel::StageOrder;
use crate::models::Dimension;

pub const ENV_MIN_DIFFICULTY: &str = "OFFER_FUNNEL_MIN_DIFFICULTY";
pub const ENV_MIN_REWARD: &str = "OFFER_FUNNEL_MIN_REWARD";
pub const ENV_MIN_DURATION: &str = "OFFER_FUNNEL_MIN_DURATION";
pub const ENV_ORDER: &str = "OFFER_FUNNEL_ORDER";

/// Smallest dimension values kept in sliced funnels. `None` keeps everything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceThresholds {
    pub min_difficulty: Option<f64>,
    pub min_reward: Option<f64>,
    pub min_duration: Option<f64>,
}

impl Default for SliceThresholds {
    fn default() -> Self {
        Self {
            min_difficulty: Some(5.0),
            min_reward: Some(2.0),
            min_duration: Some(5.0),
        }
    }
}

impl SliceThresholds {
    /// No minimum on any dimension.
    pub fn none() -> Self {
        Self {
            min_difficulty: None,
            min_reward: None,
            min_duration: None,
        }
    }

    pub fn min_for(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::OfferType => None,
            Dimension::Difficulty => self.min_difficulty,
            Dimension::Reward => self.min_reward,
            Dimension::Duration => self.min_duration,
        }
    }
}

/// Options for the analysis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Queries to run, in report order
    pub queries: Vec<Query>,
    pub thresholds: SliceThresholds,
    /// Force one stage order on every query instead of each query's own
    pub order_override: Option<StageOrder>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            queries: Query::ALL.to_vec(),
            thresholds: SliceThresholds::default(),
            order_override: None,
        }
    }
}

impl AnalysisOptions {
    /// Parse options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Defaults or `config_path`, then environment overrides.
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        let options = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        options.with_env_from(|key| env::var(key).ok())
    }

    /// Apply overrides looked up through `lookup`.
    pub fn with_env_from<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MIN_DIFFICULTY) {
            self.thresholds.min_difficulty = parse_minimum(ENV_MIN_DIFFICULTY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MIN_REWARD) {
            self.thresholds.min_reward = parse_minimum(ENV_MIN_REWARD, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MIN_DURATION) {
            self.thresholds.min_duration = parse_minimum(ENV_MIN_DURATION, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ORDER) {
            let order = raw.parse::<StageOrder>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_ORDER.to_string(),
                value: raw.clone(),
            })?;
            self.order_override = Some(order);
        }
        Ok(self)
    }

    /// Stage order a query runs with under these options.
    pub fn order_for(&self, query: Query) -> StageOrder {
        self.order_override.unwrap_or_else(|| query.default_order())
    }
}

/// A number, or `none` / `off` / empty to disable the minimum.
pub fn parse_minimum(key: &str, raw: &str) -> ConfigResult<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_options() {
        let opts = AnalysisOptions::default();
        assert_eq!(opts.queries.len(), Query::ALL.len());
        assert_eq!(opts.thresholds.min_difficulty, Some(5.0));
        assert_eq!(opts.thresholds.min_reward, Some(2.0));
        assert_eq!(opts.thresholds.min_duration, Some(5.0));
        assert_eq!(opts.order_override, None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let opts = AnalysisOptions::from_json(
            r#"{ "queries": ["overall", "reward"], "thresholds": { "min_reward": null } }"#,
        )
        .unwrap();

        assert_eq!(opts.queries, vec![Query::Overall, Query::Reward]);
        assert_eq!(opts.thresholds.min_reward, None);
        assert_eq!(opts.thresholds.min_difficulty, Some(5.0));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_MIN_DIFFICULTY, "7"),
            (ENV_MIN_DURATION, "none"),
            (ENV_ORDER, "canonical"),
        ]
        .into_iter()
        .collect();

        let opts = AnalysisOptions::default()
            .with_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(opts.thresholds.min_difficulty, Some(7.0));
        assert_eq!(opts.thresholds.min_duration, None);
        assert_eq!(opts.thresholds.min_reward, Some(2.0));
        assert_eq!(opts.order_for(Query::Difficulty), StageOrder::Canonical);
    }

    #[test]
    fn test_invalid_env_value() {
        let err = AnalysisOptions::default()
            .with_env_from(|key| (key == ENV_MIN_REWARD).then(|| "plenty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MIN_REWARD));
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("funnel.json");
        std::fs::write(&path, r#"{ "order_override": "count_desc" }"#).unwrap();

        let opts = AnalysisOptions::from_file(&path).unwrap();
        assert_eq!(opts.order_for(Query::OverallStaged), StageOrder::CountDesc);
    }

    #[test]
    fn test_min_for_offer_type_is_none() {
        assert_eq!(SliceThresholds::default().min_for(Dimension::OfferType), None);
        assert_eq!(SliceThresholds::none().min_for(Dimension::Reward), None);
    }
}
