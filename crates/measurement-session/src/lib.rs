//! Measurement Session
//!
//! Owns the active measurement set and its lifecycle:
//! - idle/measuring transitions (start, stop, reset)
//! - per-sample updates with running extrema and peak snapshots
//! - saved session records
//! - the rolling capture buffer for capture-and-average

mod clock;
mod measurement;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use measurement::{ActiveMeasurement, DataPoint, Snapshot, PALETTE};
pub use session::{
    MeasurementSession, SampleOutcome, SavedSession, SessionConfig, SessionEvent, SessionState,
};

use joint_resolver::ResolverError;
use thiserror::Error;
use uuid::Uuid;

/// Session error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Invalid measurement configuration: {0}")]
    InvalidConfiguration(#[from] ResolverError),

    #[error("Measurement already active: {id}")]
    DuplicateMeasurement { id: Uuid },

    #[error("Measurement not found: {0}")]
    MeasurementNotFound(Uuid),

    #[error("Saved session not found: {0}")]
    SavedSessionNotFound(Uuid),
}
