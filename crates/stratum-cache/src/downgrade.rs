//! Development downgrade of persistent caches.
//!
//! Each entry is rewritten by the first matching rule:
//!
//! | Entry | Result |
//! |-------|--------|
//! | `uncache = false` on the entry or in the opt-outs | untouched |
//! | backend accepts executable code, null included | null backend |
//! | variable frontend | transient memory backend, options removed |
//! | anything else | variable frontend on transient memory, options removed |
//!
//! The rules cover every entry, so a rewritten entry always lands on a
//! shape that the same rule maps to itself. Running the pass twice yields
//! the same registry as running it once, and an entry counts as changed
//! only when the rewrite actually differs from what was there.

use std::fmt;

use stratum_telemetry::metrics::record_cache_downgrade;
use tracing::{debug, info};

use crate::descriptor::{BackendDescriptor, FrontendDescriptor};
use crate::registry::{CacheConfiguration, CacheRegistry, Capability, OptOuts};

/// Which rule the pass applies to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DowngradeAction {
    /// The entry asked to stay persistent.
    OptedOut,
    /// Backend set to the null backend.
    NullBackend,
    /// Backend set to transient memory, options removed.
    TransientBackend,
    /// Frontend forced to variable on transient memory, options removed.
    ForcedVariable,
}

impl DowngradeAction {
    /// Stable name used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OptedOut => "opted_out",
            Self::NullBackend => "null_backend",
            Self::TransientBackend => "transient_backend",
            Self::ForcedVariable => "forced_variable",
        }
    }

    fn apply(self, entry: &mut CacheConfiguration) {
        match self {
            Self::OptedOut => {}
            Self::NullBackend => entry.set_backend(BackendDescriptor::null()),
            Self::TransientBackend => {
                entry.set_backend(BackendDescriptor::transient_memory());
                entry.clear_options();
            }
            Self::ForcedVariable => {
                entry.set_frontend(FrontendDescriptor::variable());
                entry.set_backend(BackendDescriptor::transient_memory());
                entry.clear_options();
            }
        }
    }
}

impl fmt::Display for DowngradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Choose the rule for one entry.
pub fn action_for(name: &str, entry: &CacheConfiguration, opt_outs: &OptOuts) -> DowngradeAction {
    if entry.uncache() == Some(false) || opt_outs.is_opted_out(name) {
        return DowngradeAction::OptedOut;
    }
    match entry.capability() {
        Capability::PersistentExecutable => DowngradeAction::NullBackend,
        Capability::PersistentVariable => DowngradeAction::TransientBackend,
        Capability::Unknown => DowngradeAction::ForcedVariable,
    }
}

/// Apply the rule for one entry and report whether it changed.
fn rewrite(name: &str, entry: &mut CacheConfiguration, opt_outs: &OptOuts) -> (DowngradeAction, bool) {
    let action = action_for(name, entry, opt_outs);
    if action == DowngradeAction::OptedOut {
        return (action, false);
    }
    let before = entry.clone();
    action.apply(entry);
    (action, *entry != before)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Outcome {
    name: String,
    action: DowngradeAction,
    changed: bool,
}

/// Per-entry outcome of a pass, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DowngradeReport {
    outcomes: Vec<Outcome>,
}

impl DowngradeReport {
    fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|outcome| outcome.name == name)
    }

    /// Rule applied to `name`.
    pub fn action(&self, name: &str) -> Option<DowngradeAction> {
        self.outcome(name).map(|outcome| outcome.action)
    }

    /// Whether the pass rewrote `name`.
    pub fn was_changed(&self, name: &str) -> Option<bool> {
        self.outcome(name).map(|outcome| outcome.changed)
    }

    /// Every entry with its rule and whether it changed.
    pub fn iter(&self) -> impl Iterator<Item = (&str, DowngradeAction, bool)> {
        self.outcomes
            .iter()
            .map(|outcome| (outcome.name.as_str(), outcome.action, outcome.changed))
    }

    /// Number of rewritten entries.
    pub fn changed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.changed).count()
    }

    /// Number of entries left as they were.
    pub fn unchanged(&self) -> usize {
        self.outcomes.len() - self.changed()
    }

    /// Whether the registry was empty.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Compute the report without rewriting anything.
pub fn plan(registry: &CacheRegistry, opt_outs: &OptOuts) -> DowngradeReport {
    DowngradeReport {
        outcomes: registry
            .iter()
            .map(|(name, entry)| {
                let (action, changed) = rewrite(name, &mut entry.clone(), opt_outs);
                Outcome {
                    name: name.to_string(),
                    action,
                    changed,
                }
            })
            .collect(),
    }
}

/// Rewrite every entry that did not opt out.
pub fn downgrade(registry: &mut CacheRegistry, opt_outs: &OptOuts) -> DowngradeReport {
    let mut report = DowngradeReport::default();

    for (name, entry) in registry.iter_mut() {
        let (action, changed) = rewrite(name, entry, opt_outs);
        if changed {
            record_cache_downgrade(action.as_str());
            debug!(cache = %name, action = %action, "Downgraded cache");
        }
        report.outcomes.push(Outcome {
            name: name.to_string(),
            action,
            changed,
        });
    }

    if report.changed() > 0 {
        info!(
            changed = report.changed(),
            unchanged = report.unchanged(),
            "Persistent caches downgraded for development"
        );
    }
    report
}
