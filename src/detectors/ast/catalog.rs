//! detectors/ast/catalog.rs
//!
//! Callable-unit extraction: every named function, arrow-function binding,
//! class method and object-literal method in a module.

use std::fmt;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::detectors::ast::ast::{node_text, parse_module, string_literal_value};
use crate::detectors::language::Dialect;
use crate::error::{Result, SyncError};
use crate::keyed::first_by_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    Function,
    ArrowFunction,
    Method,
    ObjectMethod,
}

/// One callable found in a source snapshot.
///
/// "Already seen" compares `(name, kind)`; a single extraction never holds
/// two entries with the same `(name, kind, line)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallableUnit {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: UnitKind,
    pub line: usize,
}

impl CallableUnit {
    pub fn new(name: impl Into<String>, kind: UnitKind, line: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            line,
        }
    }

    pub fn identity(&self) -> (&str, UnitKind) {
        (&self.name, self.kind)
    }

    pub fn same_unit(&self, other: &CallableUnit) -> bool {
        self.identity() == other.identity()
    }
}

/* ============================================================
   Public entry
   ============================================================ */

/// Extract the unit catalog of `source`, read with the default grammar.
pub fn extract_units(source: &str) -> Result<Vec<CallableUnit>> {
    extract_units_as(source, Dialect::default())
}

pub fn extract_units_as(source: &str, dialect: Dialect) -> Result<Vec<CallableUnit>> {
    let tree = parse_module(source, dialect).map_err(SyncError::Parse)?;
    let found = walk_units(tree.root_node(), source);

    let units = first_by_key(found, |u| (u.name.clone(), u.kind, u.line));
    tracing::debug!(count = units.len(), "extracted callable units");
    Ok(units)
}

/* ============================================================
   Tree walk
   ============================================================ */

/// Pre-order walk, so units come out in source order.
fn walk_units(root: Node, source: &str) -> Vec<CallableUnit> {
    let mut found = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if let Some(unit) = classify(node, source) {
            found.push(unit);
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    found
}

fn classify(node: Node, source: &str) -> Option<CallableUnit> {
    let (kind, name) = match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            let name = node.child_by_field_name("name")?;
            (UnitKind::Function, node_text(name, source).to_string())
        }

        "variable_declarator" => {
            let value = node.child_by_field_name("value")?;
            if value.kind() != "arrow_function" {
                return None;
            }
            // destructuring patterns have no single binding name
            let name = node.child_by_field_name("name")?;
            if name.kind() != "identifier" {
                return None;
            }
            (UnitKind::ArrowFunction, node_text(name, source).to_string())
        }

        "method_definition" => {
            let kind = match node.parent()?.kind() {
                "class_body" => UnitKind::Method,
                "object" => UnitKind::ObjectMethod,
                _ => return None,
            };
            (kind, key_name(node.child_by_field_name("name")?, source)?)
        }

        _ => return None,
    };

    if name.is_empty() {
        return None;
    }

    Some(CallableUnit {
        name,
        kind,
        line: node.start_position().row + 1,
    })
}

/// Name of a method key. Computed keys have no recoverable name.
fn key_name(key: Node, source: &str) -> Option<String> {
    match key.kind() {
        "property_identifier" | "private_property_identifier" | "identifier" => {
            Some(node_text(key, source).to_string())
        }
        "string" => string_literal_value(key, source),
        _ => None,
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitKind::Function => "function",
            UnitKind::ArrowFunction => "arrow-function",
            UnitKind::Method => "method",
            UnitKind::ObjectMethod => "object-method",
        };
        f.write_str(s)
    }
}

impl fmt::Display for CallableUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, line {})", self.name, self.kind, self.line)
    }
}
