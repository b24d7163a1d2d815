//! Configuration module for pivotal.
//!
//! Per-component settings loaded from TOML.

mod settings;

pub use settings::{
    CohortSettings, EngineSettings, InferenceSettings, LoaderSettings, PivotSettings, Settings,
    SettingsError,
};
