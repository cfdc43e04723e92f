//! Role-play session management core module.
//!
//! This module provides the core types and submodules for running a role-play
//! conversation against a simulated healthcare professional (HCP): the HCP's
//! behavioral state, the session record, the rule-based state derivation and
//! the session manager that drives `start` / `respond` transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Submodule for session bookkeeping held by storage backends.
pub mod active_session;
/// Submodule for the fixed opening line of a conversation.
pub mod opening_line;
/// Submodule for session data structures and utilities.
pub mod session;
/// Submodule for session manager implementation.
pub mod session_manager;
/// Submodule for deriving the HCP's initial state from scenario metadata.
pub mod state_deriver;

pub use opening_line::generate_turn0_dialogue;
pub use session::{Message, Role, Session, SessionMetadata};
pub use session_manager::{SessionManager, StartRequest};
pub use state_deriver::derive_initial_state_from_scene;

/// Represents the behavioral state of the simulated stakeholder.
///
/// Variants:
/// - `Busy`: short on time, wants the rep to get to the point.
/// - `Irritated`: frustrated and openly impatient.
/// - `Neutral`: willing to listen and engage analytically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HcpState {
    Busy,
    Irritated,
    Neutral,
}

impl HcpState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HcpState::Busy => "busy",
            HcpState::Irritated => "irritated",
            HcpState::Neutral => "neutral",
        }
    }
}

impl fmt::Display for HcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
