//! Shared data models for the Vigil safety trigger engine.
//!
//! This crate provides Serde-serializable types for:
//! - Violation classes and detector outputs
//! - Per-class debounce state snapshots
//! - Per-frame evaluation results
//! - Session ledger entries and session statistics

pub mod detection;
pub mod frame;
pub mod ledger;
pub mod session;
pub mod state;
pub mod violation;

// Re-export common types
pub use detection::{BoundingBox, Detection, Observation};
pub use frame::{FrameInfo, FrameResult};
pub use ledger::LedgerEntry;
pub use session::{SessionId, SessionStats};
pub use state::{AlertState, AlertTransition, DebounceState, TransitionKind};
pub use violation::{ViolationClass, ViolationClassParseError};
