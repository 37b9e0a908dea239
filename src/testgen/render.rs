// src/testgen/render.rs
//
// Suite → source text. Imports and group scaffolding are regenerated with
// single quotes and two-space indentation; case and statement text is
// copied as read.

use crate::testgen::suite::{
    ImportBinding, ImportDecl, MergeOptions, Suite, SuiteItem, TestCase, TestGroup, Verbatim,
};

const INDENT: &str = "  ";

pub fn render_suite(suite: &Suite, options: &MergeOptions) -> String {
    let mut imports = Vec::new();
    let mut statements = Vec::new();
    let mut groups = Vec::new();

    for item in &suite.items {
        match item {
            SuiteItem::Import(decl) => imports.push(render_import(decl)),
            SuiteItem::Statement(stmt) => statements.push(render_statement(stmt)),
            SuiteItem::Group(group) => groups.push(render_group(group)),
        }
    }

    let any_commented = suite.groups().any(|g| !g.comments.is_empty());
    if any_commented {
        if let Some(first) = groups.first_mut() {
            *first = format!("{}\n{}", options.marker, first);
        }
    }

    let sections = [
        imports.join("\n"),
        statements.join("\n\n"),
        groups.join("\n\n"),
        suite.trailing.join("\n"),
    ];

    let body = sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if body.is_empty() {
        body
    } else {
        body + "\n"
    }
}

/* ============================================================
   Imports
   ============================================================ */

/// One statement per module path, unless the bindings cannot share one
/// statement: extra defaults and namespaces, and named bindings that sit
/// next to a namespace, spill into further statements for the same path.
fn render_import(decl: &ImportDecl) -> String {
    let source = quote(&decl.module);

    let mut defaults = Vec::new();
    let mut namespaces = Vec::new();
    let mut named = Vec::new();
    for b in &decl.bindings {
        match b {
            ImportBinding::Default(t) => defaults.push(t.as_str()),
            ImportBinding::Namespace(t) => namespaces.push(t.as_str()),
            ImportBinding::Named(t) => named.push(t.as_str()),
        }
    }

    let mut lines: Vec<String> = decl.comments.clone();

    if decl.bindings.is_empty() {
        lines.push(with_trailing(format!("import {source};"), &decl.trailing));
        return lines.join("\n");
    }

    let braces = |names: &[&str]| format!("{{ {} }}", names.join(", "));

    let mut head = Vec::new();
    if let Some(d) = defaults.first() {
        head.push(d.to_string());
    }
    match namespaces.first() {
        Some(ns) => head.push(ns.to_string()),
        None if !named.is_empty() => head.push(braces(&named)),
        None => {}
    }
    lines.push(format!("import {} from {source};", head.join(", ")));
    if let Some(comment) = &decl.trailing {
        if let Some(main) = lines.last_mut() {
            main.push(' ');
            main.push_str(comment);
        }
    }

    for d in defaults.iter().skip(1) {
        lines.push(format!("import {d} from {source};"));
    }
    for ns in namespaces.iter().skip(1) {
        lines.push(format!("import {ns} from {source};"));
    }
    if !namespaces.is_empty() && !named.is_empty() {
        lines.push(format!("import {} from {source};", braces(&named)));
    }

    lines.join("\n")
}

fn quote(module: &str) -> String {
    if module.contains('\'') {
        format!("\"{module}\"")
    } else {
        format!("'{module}'")
    }
}

/* ============================================================
   Statements and groups
   ============================================================ */

fn render_statement(stmt: &Verbatim) -> String {
    let mut lines = stmt.comments.clone();
    lines.push(stmt.text.clone());
    lines.join("\n")
}

fn render_group(group: &TestGroup) -> String {
    let mut out = String::new();
    for c in &group.comments {
        out.push_str(c);
        out.push('\n');
    }

    let open = format!("{}({}, {} {{", group.callee, group.name_literal, group.header);
    if group.cases.is_empty() {
        out.push_str(&with_trailing(format!("{open}}});"), &group.trailing));
        return out;
    }

    out.push_str(&open);
    out.push('\n');
    let cases: Vec<String> = group.cases.iter().map(render_case).collect();
    out.push_str(&cases.join("\n\n"));
    out.push('\n');
    out.push_str(&with_trailing("});".to_string(), &group.trailing));
    out
}

fn with_trailing(line: String, comment: &Option<String>) -> String {
    match comment {
        Some(c) => format!("{line} {c}"),
        None => line,
    }
}

/// Only the first line of each piece is indented; later lines already carry
/// their original indentation.
fn render_case(case: &TestCase) -> String {
    case.comments
        .iter()
        .chain(std::iter::once(&case.text))
        .map(|piece| format!("{INDENT}{piece}"))
        .collect::<Vec<_>>()
        .join("\n")
}
