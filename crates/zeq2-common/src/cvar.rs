// cvar.rs -- dynamic variable tracking

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::common::com_printf;
use crate::q_shared::CVAR_NOSET;

/// A console variable.
#[derive(Debug, Clone)]
pub struct Cvar {
    pub name: String,
    pub string: String,
    pub reset_string: String,
    pub flags: i32,
    pub modified: bool,
    pub value: f32,
}

/// The full cvar system context.
#[derive(Debug, Default)]
pub struct CvarContext {
    pub cvar_vars: Vec<Cvar>,
    /// O(1) cvar lookup by name -> index in cvar_vars
    cvar_index: HashMap<String, usize>,
}

impl CvarContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_var_index(&self, name: &str) -> Option<usize> {
        self.cvar_index.get(name).copied()
    }

    pub fn find_var(&self, name: &str) -> Option<&Cvar> {
        self.cvar_index.get(name).map(|&idx| &self.cvar_vars[idx])
    }

    /// Get the floating-point value of a cvar. Returns 0 if not found.
    pub fn variable_value(&self, name: &str) -> f32 {
        self.find_var(name).map_or(0.0, |var| var.value)
    }

    /// Get the string value of a cvar. Returns "" if not found.
    pub fn variable_string(&self, name: &str) -> &str {
        self.find_var(name).map_or("", |var| var.string.as_str())
    }

    /// Get or create a cvar. If it already exists, the value is not changed
    /// but flags are OR'd in.
    pub fn get(&mut self, name: &str, value: &str, flags: i32) -> Option<usize> {
        if let Some(&idx) = self.cvar_index.get(name) {
            self.cvar_vars[idx].flags |= flags;
            return Some(idx);
        }

        let idx = self.cvar_vars.len();
        self.cvar_vars.push(Cvar {
            name: name.to_string(),
            string: value.to_string(),
            reset_string: value.to_string(),
            flags,
            modified: true,
            value: value.parse::<f32>().unwrap_or(0.0),
        });
        self.cvar_index.insert(name.to_string(), idx);

        Some(idx)
    }

    fn set2(&mut self, name: &str, value: &str, force: bool) -> Option<usize> {
        let idx = match self.find_var_index(name) {
            Some(idx) => idx,
            None => return self.get(name, value, 0),
        };

        let var = &mut self.cvar_vars[idx];
        if !force && var.flags & CVAR_NOSET != 0 {
            com_printf(&format!("{} is write protected.\n", name));
            return Some(idx);
        }

        if value == var.string {
            return Some(idx); // not changed
        }

        log::trace!("cvar \"{}\" = \"{}\"", name, value);
        var.modified = true;
        var.string = value.to_string();
        var.value = value.parse::<f32>().unwrap_or(0.0);

        Some(idx)
    }

    /// Set a cvar value (respects NOSET).
    pub fn set(&mut self, name: &str, value: &str) -> Option<usize> {
        self.set2(name, value, false)
    }

    /// Force-set a cvar value (ignores NOSET).
    pub fn force_set(&mut self, name: &str, value: &str) -> Option<usize> {
        self.set2(name, value, true)
    }

    /// Set a cvar from a float value.
    pub fn set_value(&mut self, name: &str, value: f32) {
        let val_str = if value == (value as i32) as f32 {
            format!("{}", value as i32)
        } else {
            format!("{}", value)
        };
        self.set(name, &val_str);
    }

    /// Put every cvar back to the value it was registered with.
    pub fn reset_all(&mut self) {
        for var in &mut self.cvar_vars {
            if var.string != var.reset_string {
                var.string = var.reset_string.clone();
                var.value = var.string.parse::<f32>().unwrap_or(0.0);
                var.modified = true;
            }
        }
    }

    pub fn value_by_handle(&self, handle: usize) -> f32 {
        self.cvar_vars.get(handle).map_or(0.0, |v| v.value)
    }

    pub fn modified_by_handle(&self, handle: usize) -> bool {
        self.cvar_vars.get(handle).is_some_and(|v| v.modified)
    }

    pub fn clear_modified_by_handle(&mut self, handle: usize) {
        if let Some(v) = self.cvar_vars.get_mut(handle) {
            v.modified = false;
        }
    }
}

// ============================================================
// Process-wide cvar context
// ============================================================

static CVAR_CTX: Mutex<Option<CvarContext>> = parking_lot::const_mutex(None);

/// Run `f` against the global context, creating it on first use.
pub fn with_cvars<R>(f: impl FnOnce(&mut CvarContext) -> R) -> R {
    let mut guard = CVAR_CTX.lock();
    f(guard.get_or_insert_with(CvarContext::new))
}

pub fn cvar_get(name: &str, value: &str, flags: i32) -> Option<usize> {
    with_cvars(|ctx| ctx.get(name, value, flags))
}

pub fn cvar_set(name: &str, value: &str) {
    with_cvars(|ctx| {
        ctx.set(name, value);
    });
}

pub fn cvar_variable_value(name: &str) -> f32 {
    CVAR_CTX.lock().as_ref().map_or(0.0, |ctx| ctx.variable_value(name))
}

pub fn cvar_variable_string(name: &str) -> String {
    CVAR_CTX
        .lock()
        .as_ref()
        .map_or_else(String::new, |ctx| ctx.variable_string(name).to_string())
}
