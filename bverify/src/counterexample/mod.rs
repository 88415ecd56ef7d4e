//! Counterexample extraction
//!
//! Turns a solved snapshot into an ordered, readable trace: the receiver
//! first (dumped structurally), then every other relevant binding in
//! snapshot order with its disambiguation suffix removed.

mod dump;

use std::fmt;

use serde::Serialize;

use crate::snapshot::{Snapshot, RECEIVER_VARIABLE};

pub use dump::{dump, MAX_DUMP_BREADTH, MAX_DUMP_DEPTH};

/// Display name of the receiver binding
pub const RECEIVER_DISPLAY_NAME: &str = "this";

/// One `name = value` line of a trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceBinding {
    pub name: String,
    pub value: String,
}

/// Ordered bindings demonstrating a contract violation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CounterexampleTrace {
    bindings: Vec<TraceBinding>,
}

impl CounterexampleTrace {
    pub fn bindings(&self) -> &[TraceBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The receiver binding, present only for instance methods
    pub fn receiver(&self) -> Option<&TraceBinding> {
        self.bindings
            .first()
            .filter(|b| b.name == RECEIVER_DISPLAY_NAME)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.value.as_str())
    }
}

impl fmt::Display for CounterexampleTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for binding in &self.bindings {
            writeln!(f, "{} = {}", binding.name, binding.value)?;
        }
        Ok(())
    }
}

/// Build the trace for a snapshot already restricted to the relevant bindings
pub fn build_trace(snapshot: &Snapshot) -> CounterexampleTrace {
    let mut bindings = Vec::with_capacity(snapshot.len());

    if let Some(receiver) = snapshot.get(RECEIVER_VARIABLE) {
        bindings.push(TraceBinding {
            name: RECEIVER_DISPLAY_NAME.to_string(),
            value: dump(snapshot, receiver),
        });
    }

    for entry in snapshot.entries() {
        if entry.name == RECEIVER_VARIABLE {
            continue;
        }
        bindings.push(TraceBinding {
            name: strip_suffix(&entry.name).to_string(),
            value: snapshot.render_raw(&entry.value),
        });
    }

    CounterexampleTrace { bindings }
}

/// Remove a trailing `_<digits>` disambiguation suffix.
///
/// `x_0` becomes `x`, `a_b_12` becomes `a_b`; names without such a suffix
/// are returned unchanged.
pub fn strip_suffix(name: &str) -> &str {
    match name.rfind('_') {
        Some(pos) => {
            let suffix = &name[pos + 1..];
            if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
                &name[..pos]
            } else {
                name
            }
        }
        None => name,
    }
}
