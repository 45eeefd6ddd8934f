//! Error types for the cgame effect subsystems.

use thiserror::Error;

/// Internal-state violations detected during a frame.
///
/// Any of these means the effect bookkeeping is corrupt; the current
/// frame's pass is abandoned and the error is handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CgError {
    /// Release of a record that is not on the active list
    #[error("CG_FreeLocalEntity: not active (slot {index})")]
    FreeInactive { index: usize },

    /// Raw effect tag with no matching variant
    #[error("Bad leType: {0}")]
    BadLeType(i32),

    /// Handle outside the pool
    #[error("local entity handle {index} out of range")]
    BadHandle { index: usize },

    /// Spawn request with a non-positive lifetime
    #[error("CG_MakeExplosion: msec = {msec}")]
    BadDuration { msec: i32 },
}

pub type CgResult<T> = Result<T, CgError>;
