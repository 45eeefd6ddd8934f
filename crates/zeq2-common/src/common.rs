// common.rs -- console print helpers used by every module

// ============================================================
// Com_Printf / Com_DPrintf
// ============================================================

/// General-purpose print. Goes to the `log` facade at info level;
/// trailing newlines from console-style messages are trimmed.
pub fn com_printf(msg: &str) {
    log::info!("{}", msg.trim_end_matches('\n'));
}

/// Developer-only print. Only emitted when the "developer" cvar is set.
pub fn com_dprintf(msg: &str) {
    if crate::cvar::cvar_variable_value("developer") == 0.0 {
        return;
    }
    log::debug!("{}", msg.trim_end_matches('\n'));
}

// ============================================================
// Random numbers
// ============================================================

/// Random float in [0, 1].
pub fn frand() -> f32 {
    (rand::random::<u32>() & 32767) as f32 * (1.0 / 32767.0)
}

/// Random float in [-1, 1].
pub fn crand() -> f32 {
    (rand::random::<u32>() & 32767) as f32 * (2.0 / 32767.0) - 1.0
}

/// Random integer in [0, 32767], like C's rand() & 0x7fff.
pub fn rand_i32() -> i32 {
    (rand::random::<u32>() & 0x7fff) as i32
}
