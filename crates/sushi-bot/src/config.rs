use crate::determinizer::BiasWeights;
use crate::ensemble::EnsembleSettings;
use crate::eval::{BlendedEvaluator, ConfiguredEvaluator, FeatureWeights, HeuristicEvaluator, HeuristicPreset};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{Level, event};

/// Agent settings loaded from YAML. Numbers out of range are clamped
/// during [`validate`](Self::validate), not rejected.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default = "default_determinizations")]
    pub determinizations: i64,
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Explicit feature weights; override the preset when present.
    #[serde(default)]
    pub weights: Option<FeatureWeights>,
    #[serde(default)]
    pub bias: BiasWeights,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub blend: Option<BlendConfig>,
}

/// Mixes a second preset into the primary evaluator.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BlendConfig {
    pub preset: String,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            determinizations: default_determinizations(),
            preset: default_preset(),
            weights: None,
            bias: BiasWeights::uniform(),
            seed: None,
            parallel: false,
            blend: None,
        }
    }
}

impl AgentConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: AgentConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let path = PathBuf::from("<inline>");
        let mut cfg: AgentConfig =
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
                source,
                path: path.clone(),
            })?;
        cfg.validate()
            .map_err(|source| ConfigError::Invalid { path, source })?;
        Ok(cfg)
    }

    /// Clamps ranges, normalizes names and rejects non-finite weights.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        let clamped = EnsembleSettings::clamp_determinizations(self.determinizations);
        if clamped as i64 != self.determinizations {
            event!(
                target: "sushi_bot::config",
                Level::WARN,
                requested = self.determinizations,
                clamped,
                "determinization count out of range"
            );
            self.determinizations = clamped as i64;
        }

        self.preset = resolve_preset("preset", &self.preset).as_str().to_string();

        if let Some(weights) = &self.weights {
            if let Some(feature) = weights.first_non_finite() {
                return Err(ValidationError::InvalidField {
                    field: format!("weights.{feature}"),
                    message: "weight must be a finite number".to_string(),
                });
            }
        }

        self.bias.sanitize();

        if let Some(blend) = &mut self.blend {
            blend.preset = resolve_preset("blend.preset", &blend.preset)
                .as_str()
                .to_string();
            if blend.alpha.is_nan() {
                return Err(ValidationError::InvalidField {
                    field: "blend.alpha".to_string(),
                    message: "alpha must be a number".to_string(),
                });
            }
            blend.alpha = blend.alpha.clamp(0.0, 1.0);
        }

        Ok(())
    }

    /// Preset named by `preset`, falling back to balanced.
    pub fn resolved_preset(&self) -> HeuristicPreset {
        HeuristicPreset::from_name(&self.preset).unwrap_or_default()
    }

    pub fn determinization_count(&self) -> usize {
        EnsembleSettings::clamp_determinizations(self.determinizations)
    }

    pub fn build_evaluator(&self) -> ConfiguredEvaluator {
        let primary = match self.weights {
            Some(weights) => HeuristicEvaluator::with_weights(weights),
            None => HeuristicEvaluator::new(self.resolved_preset()),
        };
        match &self.blend {
            Some(blend) => {
                let secondary =
                    HeuristicEvaluator::new(HeuristicPreset::from_name(&blend.preset).unwrap_or_default());
                ConfiguredEvaluator::Blended(BlendedEvaluator::new(primary, secondary, blend.alpha))
            }
            None => ConfiguredEvaluator::Single(primary),
        }
    }
}

fn resolve_preset(field: &'static str, name: &str) -> HeuristicPreset {
    HeuristicPreset::from_name(name).unwrap_or_else(|| {
        event!(
            target: "sushi_bot::config",
            Level::WARN,
            field,
            requested = name,
            "unknown heuristic preset, using balanced"
        );
        HeuristicPreset::Balanced
    })
}

fn default_determinizations() -> i64 {
    EnsembleSettings::DEFAULT_DETERMINIZATIONS as i64
}

fn default_preset() -> String {
    HeuristicPreset::Balanced.as_str().to_string()
}

fn default_alpha() -> f64 {
    0.5
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
