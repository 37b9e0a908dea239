// src/testgen/pipeline.rs
//
// The pure steps of one sync run, in the order they happen:
// plan → generate → combine → record.

use std::path::Path;

use crate::detectors::ast::catalog::{extract_units_as, CallableUnit};
use crate::detectors::language::Dialect;
use crate::error::Result;
use crate::keyed::first_by_key;
use crate::llm::backend::{generate_fragments, Batch, TestGenerator};
use crate::testgen::cache::{FileFingerprint, FingerprintStore};
use crate::testgen::merge::merge_with;
use crate::testgen::suite::MergeOptions;

/// Units of `current` with no `(name, kind)` match in `stored`. A fresh
/// fingerprint knows nothing, so everything is new.
pub fn plan_new_units(current: &[CallableUnit], stored: &FileFingerprint) -> Vec<CallableUnit> {
    current
        .iter()
        .filter(|u| !stored.knows(u))
        .cloned()
        .collect()
}

/// The unit set to persist after `selected` got tests.
pub fn accepted_units(stored: &FileFingerprint, selected: &[CallableUnit]) -> Vec<CallableUnit> {
    first_by_key(
        stored.units.iter().chain(selected.iter()).cloned(),
        |u: &CallableUnit| (u.name.clone(), u.kind),
    )
}

/// Merge `generated` into the suite already on disk, if there is one.
pub fn combine(generated: &str, existing: Option<&str>, options: &MergeOptions) -> Result<String> {
    match existing {
        None => Ok(generated.to_string()),
        Some(existing) => merge_with(generated, existing, options),
    }
}

/* ============================================================
   Full run
   ============================================================ */

pub struct SyncRequest<'a> {
    pub source_path: &'a Path,
    pub source: &'a str,
    /// Current content of the suite file, if it exists.
    pub existing: Option<&'a str>,
    pub options: &'a MergeOptions,
    pub fence_languages: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Units tests were requested for.
    pub requested: Vec<CallableUnit>,
    /// Requested units whose reply held code; only these are recorded.
    pub generated_for: Vec<CallableUnit>,
    /// Suite text to write, `None` when nothing was new.
    pub suite: Option<String>,
    pub fingerprint: FileFingerprint,
}

/// Plan, generate, merge and record one source file. Writing the suite text
/// is left to the caller.
pub fn synchronize(
    store: &FingerprintStore,
    generator: &dyn TestGenerator,
    req: &SyncRequest<'_>,
) -> Result<SyncOutcome> {
    let current = extract_units_as(req.source, Dialect::from_path(req.source_path))?;
    let stored = store.read(req.source_path)?;
    let selected = plan_new_units(&current, &stored);

    if selected.is_empty() {
        tracing::info!(source = %req.source_path.display(), "no new units");
        return Ok(SyncOutcome {
            requested: Vec::new(),
            generated_for: Vec::new(),
            suite: None,
            fingerprint: stored,
        });
    }

    let known: Vec<String> = stored.units.iter().map(|u| u.name.clone()).collect();
    let path_text = req.source_path.to_string_lossy();
    let batch = Batch {
        source_path: Some(&path_text),
        source: req.source,
        selected: &selected,
        known: &known,
        languages: req.fence_languages,
    };

    let generated = generate_fragments(generator, &batch)?;
    if generated.covered.is_empty() {
        tracing::warn!(source = %req.source_path.display(), "no tests came back");
        return Ok(SyncOutcome {
            requested: selected,
            generated_for: Vec::new(),
            suite: None,
            fingerprint: stored,
        });
    }

    let suite = combine(&generated.text, req.existing, req.options)?;

    let fingerprint = store.write(
        req.source_path,
        req.source,
        accepted_units(&stored, &generated.covered),
    )?;

    Ok(SyncOutcome {
        requested: selected,
        generated_for: generated.covered,
        suite: Some(suite),
        fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::ast::catalog::UnitKind;

    fn stored(units: Vec<CallableUnit>) -> FileFingerprint {
        FileFingerprint {
            hash: "h".into(),
            units,
            timestamp: Some(1),
        }
    }

    #[test]
    fn empty_fingerprint_makes_every_unit_new() {
        let current = vec![
            CallableUnit::new("a", UnitKind::Function, 1),
            CallableUnit::new("b", UnitKind::Method, 4),
        ];
        assert_eq!(plan_new_units(&current, &FileFingerprint::default()), current);
    }

    #[test]
    fn known_units_are_matched_by_name_and_kind_only() {
        let current = vec![
            CallableUnit::new("a", UnitKind::Function, 10),
            CallableUnit::new("a", UnitKind::ArrowFunction, 12),
        ];
        let known = stored(vec![CallableUnit::new("a", UnitKind::Function, 1)]);
        assert_eq!(
            plan_new_units(&current, &known),
            vec![CallableUnit::new("a", UnitKind::ArrowFunction, 12)]
        );
    }

    #[test]
    fn accepted_units_keep_the_stored_entry_on_overlap() {
        let old = stored(vec![CallableUnit::new("a", UnitKind::Function, 1)]);
        let selected = vec![
            CallableUnit::new("a", UnitKind::Function, 7),
            CallableUnit::new("b", UnitKind::Function, 9),
        ];
        assert_eq!(
            accepted_units(&old, &selected),
            vec![
                CallableUnit::new("a", UnitKind::Function, 1),
                CallableUnit::new("b", UnitKind::Function, 9),
            ]
        );
    }

    #[test]
    fn combine_without_existing_returns_generated_verbatim() {
        let generated = "describe(\"x\",()=>{it(\"y\",()=>{})})";
        assert_eq!(
            combine(generated, None, &MergeOptions::default()).unwrap(),
            generated
        );
    }
}
