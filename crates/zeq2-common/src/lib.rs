#![allow(clippy::float_cmp, clippy::needless_range_loop, clippy::too_many_arguments)]
// Shared code for the cgame: math, trajectories, render/collision types, cvars.
pub mod q_shared;
pub mod bg_misc;
pub mod cvar;
pub mod common;
