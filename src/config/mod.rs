//! Configuration model for repokit.
//!
//! `Config` is assembled from layered YAML sources, lowest precedence first:
//! built-in defaults, the user file `<config_dir>/repokit/config.yml`, the
//! project file `<root>/.repokit.yml`, `REPOKIT_*` environment variables, and
//! per-call overrides (CLI flags). Unknown keys are ignored at every layer.

mod layers;
mod model;
mod operations;
pub mod types;


pub use layers::{ConfigOverrides, ConfigSources, ENV_PREFIX};
pub use model::Config;
pub use types::{
    CustomStrategySpec, FlowEdge, MergeRuleConfig, PrivateSetSelector, RedactionConfig,
    SensitiveConfig, SensitivePatternConfig,
};
