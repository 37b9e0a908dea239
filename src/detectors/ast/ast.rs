//! detectors/ast/ast.rs
//!
//! tree-sitter parsing shared by the unit catalog and the suite reader.

use std::cell::RefCell;

use tree_sitter::{Node, Parser, Tree};

use crate::detectors::language::Dialect;
use crate::error::ParseError;

thread_local! {
    static TSX_PARSER: RefCell<Parser> = RefCell::new(make_parser(Dialect::Tsx));
    static TS_PARSER: RefCell<Parser> = RefCell::new(make_parser(Dialect::TypeScript));
}

const SNIPPET_CHARS: usize = 40;

fn make_parser(dialect: Dialect) -> Parser {
    let mut p = Parser::new();
    p.set_language(&dialect.grammar())
        .expect("bundled grammar is ABI-compatible with tree-sitter");
    p
}

/// Parse `source` as a module.
///
/// tree-sitter always produces a tree; a tree that contains error or missing
/// nodes is rejected with the location of the first one.
pub fn parse_module(source: &str, dialect: Dialect) -> Result<Tree, ParseError> {
    let tree = match dialect {
        Dialect::Tsx => TSX_PARSER.with(|p| p.borrow_mut().parse(source, None)),
        Dialect::TypeScript => TS_PARSER.with(|p| p.borrow_mut().parse(source, None)),
    }
    .ok_or_else(|| ParseError::new(1, 1, "parser returned no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(describe_syntax_error(root, source));
    }

    Ok(tree)
}

fn describe_syntax_error(root: Node, source: &str) -> ParseError {
    let Some(node) = first_error_node(root) else {
        return ParseError::new(1, 1, "invalid syntax");
    };

    let pos = node.start_position();
    let reason = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        match snippet(node, source) {
            s if s.is_empty() => "unexpected end of input".to_string(),
            s => format!("unexpected `{s}`"),
        }
    };

    ParseError::new(pos.row + 1, pos.column + 1, reason)
}

fn first_error_node(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(n) = first_error_node(child) {
            return Some(n);
        }
    }

    None
}

fn snippet(node: Node, source: &str) -> String {
    let first_line = node_text(node, source).lines().next().unwrap_or("").trim();
    first_line.chars().take(SNIPPET_CHARS).collect()
}

/* ============================================================
   Node helpers
   ============================================================ */

pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Named children in source order, without comments.
pub fn code_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

/// All named children in source order, comments included.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// The contents of a string literal, or of a template literal without
/// substitutions. Escapes are left as written.
pub fn string_literal_value(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "string" => {}
        "template_string" => {
            let mut cursor = node.walk();
            let has_substitution = node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution");
            if has_substitution {
                return None;
            }
        }
        _ => return None,
    }

    let text = node_text(node, source);
    if text.len() < 2 {
        return None;
    }
    Some(text[1..text.len() - 1].to_string())
}

/// First argument of a call statement, when it is a literal string.
pub fn call_title(statement: Node, source: &str) -> Option<String> {
    let call = call_of_statement(statement)?;
    let args = call.child_by_field_name("arguments")?;
    let first = code_children(args).into_iter().next()?;
    string_literal_value(first, source)
}

/// The call expression behind `expression_statement`, if that is what it is.
pub fn call_of_statement(statement: Node) -> Option<Node> {
    if statement.kind() != "expression_statement" {
        return None;
    }
    code_children(statement)
        .into_iter()
        .next()
        .filter(|n| n.kind() == "call_expression")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_module_parses() {
        let tree = parse_module("export const a = 1;\n", Dialect::Tsx).unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn empty_source_is_an_empty_program() {
        let tree = parse_module("", Dialect::Tsx).unwrap();
        assert_eq!(tree.root_node().named_child_count(), 0);
    }

    #[test]
    fn syntax_error_reports_its_line() {
        let err = parse_module("const a = 1;\nfunction (\n", Dialect::Tsx).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn jsx_and_types_are_tolerated() {
        let src = "type P = { n: number };\nexport const C = (p: P) => <div>{p.n}</div>;\n";
        assert!(parse_module(src, Dialect::Tsx).is_ok());
    }

    #[test]
    fn angle_bracket_casts_need_the_typescript_grammar() {
        let src = "const n = <number>value;\n";
        assert!(parse_module(src, Dialect::TypeScript).is_ok());
    }

    #[test]
    fn literal_values_strip_quotes() {
        let src = "f('a b', `c`, `d${e}`);";
        let tree = parse_module(src, Dialect::Tsx).unwrap();
        let stmt = tree.root_node().named_child(0).unwrap();
        let call = call_of_statement(stmt).unwrap();
        let args = code_children(call.child_by_field_name("arguments").unwrap());
        assert_eq!(string_literal_value(args[0], src).as_deref(), Some("a b"));
        assert_eq!(string_literal_value(args[1], src).as_deref(), Some("c"));
        assert_eq!(string_literal_value(args[2], src), None);
        assert_eq!(call_title(stmt, src).as_deref(), Some("a b"));
    }
}
