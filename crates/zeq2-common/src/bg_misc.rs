// bg_misc.rs -- trajectory evaluation shared by the game and cgame modules

use std::f32::consts::PI;

use crate::q_shared::{vector_ma, TrType, Trajectory, Vec3};

/// Position of a trajectory at `at_time` (milliseconds).
pub fn evaluate_trajectory(tr: &Trajectory, at_time: i32) -> Vec3 {
    match tr.tr_type {
        TrType::Stationary | TrType::Interpolate => tr.tr_base,
        TrType::Linear => {
            let delta_time = (at_time - tr.tr_time) as f32 * 0.001; // milliseconds to seconds
            vector_ma(&tr.tr_base, delta_time, &tr.tr_delta)
        }
        TrType::Sine => {
            if tr.tr_duration == 0 {
                return tr.tr_base;
            }
            let delta_time = (at_time - tr.tr_time) as f32 / tr.tr_duration as f32;
            let phase = (delta_time * PI * 2.0).sin();
            vector_ma(&tr.tr_base, phase, &tr.tr_delta)
        }
        TrType::LinearStop => {
            let at_time = at_time.min(tr.tr_time + tr.tr_duration);
            let delta_time = ((at_time - tr.tr_time) as f32 * 0.001).max(0.0);
            vector_ma(&tr.tr_base, delta_time, &tr.tr_delta)
        }
        TrType::Gravity => {
            let delta_time = (at_time - tr.tr_time) as f32 * 0.001;
            let mut result = vector_ma(&tr.tr_base, delta_time, &tr.tr_delta);
            result[2] -= 0.5 * tr.gravity * delta_time * delta_time;
            result
        }
    }
}

/// Velocity of a trajectory at `at_time`, used for bounce reflection.
pub fn evaluate_trajectory_delta(tr: &Trajectory, at_time: i32) -> Vec3 {
    match tr.tr_type {
        TrType::Stationary | TrType::Interpolate => [0.0; 3],
        TrType::Linear => tr.tr_delta,
        TrType::Sine => {
            if tr.tr_duration == 0 {
                return [0.0; 3];
            }
            let delta_time = (at_time - tr.tr_time) as f32 / tr.tr_duration as f32;
            let phase = (delta_time * PI * 2.0).cos() * 0.5;
            vector_ma(&[0.0; 3], phase, &tr.tr_delta)
        }
        TrType::LinearStop => {
            if at_time > tr.tr_time + tr.tr_duration {
                [0.0; 3]
            } else {
                tr.tr_delta
            }
        }
        TrType::Gravity => {
            let delta_time = (at_time - tr.tr_time) as f32 * 0.001;
            let mut result = tr.tr_delta;
            result[2] -= tr.gravity * delta_time;
            result
        }
    }
}
