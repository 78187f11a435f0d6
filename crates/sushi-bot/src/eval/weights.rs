use serde::{Deserialize, Serialize};
use std::fmt;

/// The terms a heuristic score is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Immediate,
    SetProgress,
    Synergy,
    Competitive,
    FuturePotential,
    Blocking,
    Risk,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::Immediate,
        Feature::SetProgress,
        Feature::Synergy,
        Feature::Competitive,
        Feature::FuturePotential,
        Feature::Blocking,
        Feature::Risk,
    ];

    /// Every feature except the realized score itself.
    pub const AUXILIARY: [Feature; 6] = [
        Feature::SetProgress,
        Feature::Synergy,
        Feature::Competitive,
        Feature::FuturePotential,
        Feature::Blocking,
        Feature::Risk,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Feature::Immediate => "immediate",
            Feature::SetProgress => "set_progress",
            Feature::Synergy => "synergy",
            Feature::Competitive => "competitive",
            Feature::FuturePotential => "future_potential",
            Feature::Blocking => "blocking",
            Feature::Risk => "risk",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linear weights applied to each feature. Missing YAML fields default to
/// the balanced preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub immediate: f64,
    pub set_progress: f64,
    pub synergy: f64,
    pub competitive: f64,
    pub future_potential: f64,
    pub blocking: f64,
    pub risk: f64,
}

impl FeatureWeights {
    pub const fn new(
        immediate: f64,
        set_progress: f64,
        synergy: f64,
        competitive: f64,
        future_potential: f64,
    ) -> Self {
        Self {
            immediate,
            set_progress,
            synergy,
            competitive,
            future_potential,
            blocking: 0.0,
            risk: 0.0,
        }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Immediate => self.immediate,
            Feature::SetProgress => self.set_progress,
            Feature::Synergy => self.synergy,
            Feature::Competitive => self.competitive,
            Feature::FuturePotential => self.future_potential,
            Feature::Blocking => self.blocking,
            Feature::Risk => self.risk,
        }
    }

    pub fn with(mut self, feature: Feature, weight: f64) -> Self {
        let slot = match feature {
            Feature::Immediate => &mut self.immediate,
            Feature::SetProgress => &mut self.set_progress,
            Feature::Synergy => &mut self.synergy,
            Feature::Competitive => &mut self.competitive,
            Feature::FuturePotential => &mut self.future_potential,
            Feature::Blocking => &mut self.blocking,
            Feature::Risk => &mut self.risk,
        };
        *slot = weight;
        self
    }

    /// First feature whose weight is NaN or infinite.
    pub fn first_non_finite(&self) -> Option<Feature> {
        Feature::ALL
            .into_iter()
            .find(|&feature| !self.get(feature).is_finite())
    }
}

impl Default for FeatureWeights {
    fn default() -> Self {
        HeuristicPreset::Balanced.weights()
    }
}

/// Named weight sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeuristicPreset {
    /// Realized score only.
    ScoreOnly,
    #[default]
    Balanced,
    Aggressive,
    Strategic,
}

impl HeuristicPreset {
    pub const ALL: [HeuristicPreset; 4] = [
        HeuristicPreset::ScoreOnly,
        HeuristicPreset::Balanced,
        HeuristicPreset::Aggressive,
        HeuristicPreset::Strategic,
    ];

    pub const fn weights(self) -> FeatureWeights {
        match self {
            HeuristicPreset::ScoreOnly => FeatureWeights::new(1.0, 0.0, 0.0, 0.0, 0.0),
            HeuristicPreset::Balanced => FeatureWeights::new(1.0, 0.8, 0.6, 0.7, 0.5),
            HeuristicPreset::Aggressive => FeatureWeights::new(1.2, 0.5, 0.4, 0.9, 0.3),
            HeuristicPreset::Strategic => FeatureWeights::new(0.8, 1.2, 1.0, 0.6, 0.9),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            HeuristicPreset::ScoreOnly => "score-only",
            HeuristicPreset::Balanced => "balanced",
            HeuristicPreset::Aggressive => "aggressive",
            HeuristicPreset::Strategic => "strategic",
        }
    }

    /// Case-insensitive lookup; `simple` is accepted for `score-only`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "score-only" | "simple" => Some(HeuristicPreset::ScoreOnly),
            "balanced" => Some(HeuristicPreset::Balanced),
            "aggressive" => Some(HeuristicPreset::Aggressive),
            "strategic" => Some(HeuristicPreset::Strategic),
            _ => None,
        }
    }
}

impl fmt::Display for HeuristicPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
