// src/testgen/merge.rs
//
// Structural merge of two test suites.
//
// Imports are consolidated per module path, groups per name. Existing
// content always comes first and is never rewritten; new content is only
// appended when it is not already there.

use std::collections::HashSet;

use crate::error::{Result, SyncError};
use crate::keyed::{first_by_key, group_by_key};
use crate::testgen::render::render_suite;
use crate::testgen::suite::{
    parse_suite, ImportBinding, ImportDecl, MergeOptions, Suite, SuiteItem, TestGroup, Verbatim,
};

/* ============================================================
   Public entry
   ============================================================ */

/// Merge freshly generated suite text into an existing suite.
pub fn merge(new_text: &str, existing_text: &str) -> Result<String> {
    merge_with(new_text, existing_text, &MergeOptions::default())
}

pub fn merge_with(new_text: &str, existing_text: &str, options: &MergeOptions) -> Result<String> {
    let new_suite = parse_suite(new_text, options).map_err(SyncError::Merge)?;
    let existing = parse_suite(existing_text, options).map_err(SyncError::Merge)?;

    let merged = merge_suites(&existing, &new_suite);

    tracing::info!(
        imports = merged.imports().count(),
        groups = merged.groups().count(),
        cases = merged.groups().map(|g| g.cases.len()).sum::<usize>(),
        "suites merged"
    );

    Ok(render_suite(&merged, options))
}

/// Combine two parsed suites into a new one: imports, then other
/// statements, then groups, each in first-seen order with `existing` first.
pub fn merge_suites(existing: &Suite, new: &Suite) -> Suite {
    let all: Vec<&SuiteItem> = existing.items.iter().chain(new.items.iter()).collect();

    let imports = group_by_key(
        all.iter().copied().filter_map(|i| match i {
            SuiteItem::Import(d) => Some(d),
            _ => None,
        }),
        |d| d.module.clone(),
    )
    .into_iter()
    .map(|(module, decls)| SuiteItem::Import(merge_imports(module, &decls)));

    let statements = first_by_key(
        all.iter().copied().filter_map(|i| match i {
            SuiteItem::Statement(s) => Some(s),
            _ => None,
        }),
        |s| s.text.clone(),
    )
    .into_iter()
    .map(|s: &Verbatim| SuiteItem::Statement(s.clone()));

    let groups = group_by_key(
        all.iter().copied().filter_map(|i| match i {
            SuiteItem::Group(g) => Some(g),
            _ => None,
        }),
        |g| g.name.clone(),
    )
    .into_iter()
    .filter_map(|(_, groups)| {
        let (first, rest) = groups.split_first()?;
        Some(SuiteItem::Group(merge_groups(first, rest)))
    });

    let items = imports.chain(statements).chain(groups).collect();

    Suite {
        items,
        trailing: dedupe_comments(existing.trailing.iter().chain(new.trailing.iter())),
    }
}

/* ============================================================
   Imports
   ============================================================ */

fn merge_imports(module: String, decls: &[&ImportDecl]) -> ImportDecl {
    let bindings = first_by_key(
        decls.iter().flat_map(|d| d.bindings.iter().cloned()),
        |b: &ImportBinding| b.clone(),
    );

    ImportDecl {
        module,
        bindings,
        comments: dedupe_comments(decls.iter().flat_map(|d| d.comments.iter())),
        trailing: decls.iter().find_map(|d| d.trailing.clone()),
    }
}

/* ============================================================
   Groups
   ============================================================ */

/// Fold same-named groups into the first one. Cases of `first` are kept as
/// they are; later cases are appended when their title (or, for untitled
/// statements, their text) is not present yet.
fn merge_groups(first: &TestGroup, rest: &[&TestGroup]) -> TestGroup {
    let mut merged = first.clone();

    let mut titles: HashSet<String> = merged.titles().map(str::to_owned).collect();
    let mut bodies: HashSet<String> = merged
        .cases
        .iter()
        .filter(|c| c.title.is_none())
        .map(|c| c.text.clone())
        .collect();

    for other in rest {
        for case in &other.cases {
            let fresh = match &case.title {
                Some(title) => titles.insert(title.clone()),
                None => bodies.insert(case.text.clone()),
            };

            if fresh {
                merged.cases.push(case.clone());
            } else {
                tracing::debug!(
                    group = %merged.name,
                    title = case.title.as_deref().unwrap_or("<untitled>"),
                    "duplicate case dropped"
                );
            }
        }
    }

    merged.comments = dedupe_comments(
        first
            .comments
            .iter()
            .chain(rest.iter().flat_map(|g| g.comments.iter())),
    );
    if merged.trailing.is_none() {
        merged.trailing = rest.iter().find_map(|g| g.trailing.clone());
    }
    merged
}

fn dedupe_comments<'a>(comments: impl Iterator<Item = &'a String>) -> Vec<String> {
    first_by_key(comments.cloned(), |c: &String| c.clone())
}
