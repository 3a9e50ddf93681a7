//! Pipeline configuration, loadable from TOML.

use crate::aggregate::{ERA_GENRES, POPULAR_GENRES};
use crate::engine::EngineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::TrendConfig;
use crate::utils::cross_validation::CVConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings of one pipeline run.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw catalog CSV files, merged in order.
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    /// Genres to forecast, in processing order.
    pub genres: Vec<String>,
    /// Genres compared in the era chart.
    pub era_genres: Vec<String>,
    pub min_points: usize,
    pub horizon_years: usize,
    pub interval_width: f64,
    pub cv: CVConfig,
    pub trend: TrendConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: vec![
                PathBuf::from("datasets/high_popularity_spotify_data.csv"),
                PathBuf::from("datasets/low_popularity_spotify_data.csv"),
            ],
            output_dir: PathBuf::from("datasets"),
            genres: POPULAR_GENRES.iter().map(|g| g.to_string()).collect(),
            era_genres: ERA_GENRES.iter().map(|g| g.to_string()).collect(),
            min_points: 6,
            horizon_years: 10,
            interval_width: 0.8,
            cv: CVConfig::default(),
            trend: TrendConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> PipelineResult<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.inputs.is_empty() {
            return Err(PipelineError::Config("at least one input is required".into()));
        }
        if self.genres.is_empty() {
            return Err(PipelineError::Config("genre list is empty".into()));
        }
        if self.trend.changepoint_prior_scale <= 0.0 {
            return Err(PipelineError::Config(
                "trend.changepoint_prior_scale must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.trend.changepoint_range) {
            return Err(PipelineError::Config(
                "trend.changepoint_range must be in [0, 1]".into(),
            ));
        }
        self.engine_config()
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            min_points: self.min_points,
            horizon_years: self.horizon_years,
            cv: self.cv,
            interval_width: self.interval_width,
        }
    }
}
