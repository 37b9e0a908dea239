//! detectors/ast/unitdelta.rs
//!
//! Added / removed / modified units between two snapshots of one file.
//!
//! "Modified" is a heuristic: a unit's region runs from its declaration
//! line to end of file, so an edit anywhere below a unit marks it modified.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::detectors::ast::catalog::{extract_units_as, CallableUnit, UnitKind};
use crate::detectors::language::Dialect;
use crate::error::Result;
use crate::keyed::first_by_key;

/// How units of the two snapshots are paired up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Same name is the same logical unit, whatever its kind.
    #[default]
    Name,
    NameAndKind,
}

impl MatchPolicy {
    fn key(self, unit: &CallableUnit) -> (String, Option<UnitKind>) {
        match self {
            MatchPolicy::Name => (unit.name.clone(), None),
            MatchPolicy::NameAndKind => (unit.name.clone(), Some(unit.kind)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitDelta {
    pub added: Vec<CallableUnit>,
    pub removed: Vec<CallableUnit>,
    /// Units present in both snapshots, reported with their new position.
    pub modified: Vec<CallableUnit>,
}

impl UnitDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/* ============================================================
   Public entry
   ============================================================ */

pub fn diff_units(new_source: &str, old_source: &str, policy: MatchPolicy) -> Result<UnitDelta> {
    diff_units_as(new_source, old_source, policy, Dialect::default())
}

pub fn diff_units_as(
    new_source: &str,
    old_source: &str,
    policy: MatchPolicy,
    dialect: Dialect,
) -> Result<UnitDelta> {
    // first unit in source order represents a shared key
    let new_units = first_by_key(extract_units_as(new_source, dialect)?, |u| policy.key(u));
    let old_units = first_by_key(extract_units_as(old_source, dialect)?, |u| policy.key(u));

    let find_old = |u: &CallableUnit| old_units.iter().find(|o| policy.key(o) == policy.key(u));
    let in_new = |u: &CallableUnit| new_units.iter().any(|n| policy.key(n) == policy.key(u));

    let mut delta = UnitDelta::default();

    for unit in &new_units {
        match find_old(unit) {
            None => delta.added.push(unit.clone()),
            Some(old) => {
                if region_hash(new_source, unit.line) != region_hash(old_source, old.line) {
                    delta.modified.push(unit.clone());
                }
            }
        }
    }

    delta.removed = old_units.iter().filter(|o| !in_new(*o)).cloned().collect();

    tracing::debug!(
        added = delta.added.len(),
        removed = delta.removed.len(),
        modified = delta.modified.len(),
        "unit delta computed"
    );

    Ok(delta)
}

/// SHA-256 over the lines from `line` (1-based) to end of file.
pub fn region_hash(source: &str, line: usize) -> String {
    let mut h = Sha256::new();
    for l in source.lines().skip(line.saturating_sub(1)) {
        h.update(l.as_bytes());
        h.update(b"\n");
    }
    hex::encode(h.finalize())
}
