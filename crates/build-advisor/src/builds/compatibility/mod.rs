//! Cross-component compatibility: pure validation plus bounded repair.
//!
//! The validator never mutates a build. The repairer works on a clone and
//! records every substitution as a human-readable note so callers can surface
//! what changed and what is still wrong.

mod repair;
mod validator;

pub use repair::{repair, RepairReport};
pub use validator::{
    check, estimated_gpu_watts, required_psu_watts, validate, BASE_SYSTEM_WATTS, CPU_WATTS,
    HEADROOM_FACTOR,
};

use serde::{Deserialize, Serialize};

use super::domain::ComponentType;

/// Compatibility rule families, in the order the repairer handles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Socket,
    FormFactor,
    Power,
}

impl IssueKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::Socket, Self::FormFactor, Self::Power]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Socket => "socket mismatch",
            Self::FormFactor => "form factor mismatch",
            Self::Power => "insufficient power headroom",
        }
    }
}

/// One failed compatibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityIssue {
    pub kind: IssueKind,
    pub slots: Vec<ComponentType>,
    pub message: String,
}
