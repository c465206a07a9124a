use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Engine, ForestSpec};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "RUSTY_FOREST_CONFIG";

// ---------------------------------------------------------------------------
// Workflow configuration
// ---------------------------------------------------------------------------

/// Knobs for one workflow run. Every field has a default, so a partial JSON
/// file (or none at all) is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Share of rows assigned to training.
    pub split_prop: f64,
    /// Split within each class.
    pub stratify: bool,
    /// Fixed seed for the split and the forests; `None` draws one per run.
    pub seed: Option<u64>,
    /// `step_corr` threshold on |r|.
    pub corr_threshold: f64,
    pub trees: usize,
    pub mtry: Option<usize>,
    pub min_node_size: usize,
    pub engines: Vec<Engine>,
    /// Rows shown in data previews.
    pub preview_rows: usize,
    /// Outcome column when loading files; `None` picks the only text column.
    pub label_column: Option<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            split_prop: 0.6,
            stratify: false,
            seed: None,
            corr_threshold: 0.9,
            trees: 100,
            mtry: None,
            min_node_size: 1,
            engines: Engine::ALL.to_vec(),
            preview_rows: 6,
            label_column: None,
        }
    }
}

impl WorkflowConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: WorkflowConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$RUSTY_FOREST_CONFIG` when set, otherwise defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_json_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.split_prop > 0.0 && self.split_prop < 1.0) {
            bail!("split_prop must lie strictly between 0 and 1, got {}", self.split_prop);
        }
        if !(self.corr_threshold > 0.0 && self.corr_threshold <= 1.0) {
            bail!("corr_threshold must lie in (0, 1], got {}", self.corr_threshold);
        }
        if self.trees == 0 {
            bail!("trees must be at least 1");
        }
        if self.mtry == Some(0) {
            bail!("mtry must be at least 1");
        }
        if self.engines.is_empty() {
            bail!("at least one engine is required");
        }
        Ok(())
    }

    /// The forest specification for `engine`.
    pub fn forest(&self, engine: Engine) -> ForestSpec {
        ForestSpec {
            trees: self.trees,
            mtry: self.mtry,
            min_node_size: self.min_node_size,
            max_depth: None,
            engine,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "seed": 42, "engines": ["linfa"] }}"#).unwrap();
        let config = WorkflowConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.engines, vec![Engine::Linfa]);
        assert_eq!(config.trees, 100);
        assert_eq!(config.split_prop, 0.6);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "split_prop": 1.2 }}"#).unwrap();
        let err = WorkflowConfig::from_json_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("split_prop"));

        let config = WorkflowConfig {
            engines: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn forest_spec_carries_hyperparameters() {
        let config = WorkflowConfig {
            trees: 7,
            mtry: Some(2),
            ..Default::default()
        };
        let spec = config.forest(Engine::Linfa);
        assert_eq!((spec.trees, spec.mtry, spec.engine), (7, Some(2), Engine::Linfa));
    }
}
