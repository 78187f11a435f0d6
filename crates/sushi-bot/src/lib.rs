pub mod config;
pub mod determinizer;
pub mod ensemble;
pub mod eval;
pub mod oracle;
pub mod tracker;

pub use config::{AgentConfig, BlendConfig, ConfigError, ValidationError};
pub use determinizer::{BiasWeights, DeterminizedWorld, Determinizer};
pub use ensemble::{DecisionEnsemble, DecisionError, DecisionStats, EnsembleSettings, VoteTally};
pub use eval::{
    BlendedEvaluator, ConfiguredEvaluator, Feature, FeatureWeights, HeuristicEvaluator,
    HeuristicPreset, StateEvaluator,
};
pub use oracle::{GreedyOracle, SearchOracle};
pub use tracker::{UnseenCardTracker, UnseenDistribution};
