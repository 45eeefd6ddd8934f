#![allow(clippy::float_cmp, clippy::needless_range_loop, clippy::too_many_arguments)]
// Client game effects: the local entity pool and its per-frame dispatch,
// effect spawners, and projectile ribbon trails.
pub mod cg_local;
pub mod cg_public;
pub mod cg_localents;
pub mod cg_effects;
pub mod cg_trails;
pub mod error;

#[cfg(test)]
mod test_support;

pub use cg_local::{CgCvars, CgFrame, CgMedia, LeType, LocalEntity};
pub use cg_localents::LocalEntities;
pub use cg_public::CgameImport;
pub use cg_trails::Trails;
pub use error::{CgError, CgResult};
