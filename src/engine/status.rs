//! Engine status reported to lifecycle listeners.

use serde::Serialize;

/// Coarse lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of the engine lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    /// Percent complete, `0..=100`.
    pub progress: u8,
    pub message: String,
}

impl EngineStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn loading(progress: u8, message: impl Into<String>) -> Self {
        Self {
            state: EngineState::Loading,
            progress: progress.min(100),
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self {
            state: EngineState::Success,
            progress: 100,
            message: "Engine ready".into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: EngineState::Error,
            progress: 0,
            message: message.into(),
        }
    }

    /// `Success` or `Error`: no further updates follow for this attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, EngineState::Success | EngineState::Error)
    }
}

/// Map downloaded bytes onto the 50..=95 progress band.
///
/// Returns `None` when the total is unknown or zero, so missing progress
/// data produces no intermediate update.
pub fn download_progress(loaded: u64, total: Option<u64>) -> Option<u8> {
    let total = total.filter(|t| *t > 0)?;
    let fraction = (loaded as f64 / total as f64).clamp(0.0, 1.0);
    let pct = 50.0 + 45.0 * fraction;
    Some(pct.round().clamp(50.0, 95.0) as u8)
}
