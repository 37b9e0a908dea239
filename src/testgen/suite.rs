// src/testgen/suite.rs
//
// Test-suite model: imports, other top-level statements and named groups of
// cases, read from a tree-sitter tree into plain immutable values. Case and
// statement text is kept byte-for-byte; only the scaffolding around it is
// regenerated when a suite is rendered.

use tree_sitter::Node;

use crate::detectors::ast::ast::{
    call_of_statement, call_title, code_children, named_children, node_text, parse_module,
    string_literal_value,
};
use crate::detectors::language::Dialect;
use crate::error::ParseError;

pub const MERGE_MARKER: &str = "// testsync: merged suite";

/// Conventions the suite reader recognises.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Callees that open a test group, e.g. `describe`.
    pub group_callees: Vec<String>,
    /// Comment emitted ahead of commented groups; dropped when read back.
    pub marker: String,
    pub dialect: Dialect,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            group_callees: vec!["describe".to_string()],
            marker: MERGE_MARKER.to_string(),
            dialect: Dialect::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suite {
    pub items: Vec<SuiteItem>,
    /// Comments after the last top-level item.
    pub trailing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteItem {
    Import(ImportDecl),
    Statement(Verbatim),
    Group(TestGroup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Module path as written between the quotes.
    pub module: String,
    /// Empty for a side-effect import.
    pub bindings: Vec<ImportBinding>,
    pub comments: Vec<String>,
    /// Comment on the same line as the statement, e.g. `// eslint-disable-line`.
    pub trailing: Option<String>,
}

/// One imported name. Identity is the variant plus its rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportBinding {
    /// `import a from 'm'`
    Default(String),
    /// `import * as a from 'm'`, stored as `* as a`
    Namespace(String),
    /// One entry of `{ ... }`, e.g. `b as c` or `type T`
    Named(String),
}

impl ImportBinding {
    pub fn text(&self) -> &str {
        match self {
            ImportBinding::Default(t) | ImportBinding::Namespace(t) | ImportBinding::Named(t) => t,
        }
    }
}

/// A top-level statement kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verbatim {
    pub comments: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestGroup {
    pub callee: String,
    /// Group name as written between the quotes; the group's identity.
    pub name: String,
    /// The name literal including its quotes.
    pub name_literal: String,
    /// Callback text up to the body brace: `() =>`, `function ()`, `async () =>`.
    pub header: String,
    pub comments: Vec<String>,
    pub cases: Vec<TestCase>,
    /// Comment on the line of the closing `});`.
    pub trailing: Option<String>,
}

impl TestGroup {
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().filter_map(|c| c.title.as_deref())
    }
}

/// One statement of a group body.
///
/// Titled cases are calls whose first argument is a literal string
/// (`it('...')`, `test('...')`, nested groups). Hooks, helpers and dangling
/// comments are untitled and identified by their text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub title: Option<String>,
    pub comments: Vec<String>,
    pub text: String,
}

impl Suite {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.trailing.is_empty()
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.items.iter().filter_map(|i| match i {
            SuiteItem::Import(d) => Some(d),
            _ => None,
        })
    }

    pub fn statements(&self) -> impl Iterator<Item = &Verbatim> {
        self.items.iter().filter_map(|i| match i {
            SuiteItem::Statement(s) => Some(s),
            _ => None,
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = &TestGroup> {
        self.items.iter().filter_map(|i| match i {
            SuiteItem::Group(g) => Some(g),
            _ => None,
        })
    }

    pub fn group(&self, name: &str) -> Option<&TestGroup> {
        self.groups().find(|g| g.name == name)
    }
}

/* ============================================================
   Reading
   ============================================================ */

/// Read suite text. Blank text is an empty suite; text without recognisable
/// groups is a suite of plain statements.
pub fn parse_suite(text: &str, options: &MergeOptions) -> Result<Suite, ParseError> {
    if text.trim().is_empty() {
        return Ok(Suite::default());
    }

    let tree = parse_module(text, options.dialect)?;
    let nodes = named_children(tree.root_node());

    let mut items = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut i = 0;

    while i < nodes.len() {
        let node = nodes[i];
        i += 1;

        if node.kind() == "comment" {
            let comment = node_text(node, text);
            if comment.trim() != options.marker {
                pending.push(comment.to_string());
            }
            continue;
        }

        let comments = std::mem::take(&mut pending);

        let (end, consumed) = extend_over_trailing_comment(&nodes, i - 1);
        let trailing = (consumed > 0).then(|| node_text(nodes[i], text).to_string());
        i += consumed;

        if let Some(mut decl) = read_import(node, text, comments.clone()) {
            decl.trailing = trailing;
            items.push(SuiteItem::Import(decl));
            continue;
        }

        if let Some(mut group) = read_group(node, text, options, comments.clone()) {
            group.trailing = trailing;
            items.push(SuiteItem::Group(group));
            continue;
        }

        items.push(SuiteItem::Statement(Verbatim {
            comments,
            text: text[node.start_byte()..end].to_string(),
        }));
    }

    Ok(Suite {
        items,
        trailing: pending,
    })
}

/// A comment that starts on the line a statement ends on belongs to that
/// statement. Returns the end byte to copy up to and whether the comment
/// was taken.
fn extend_over_trailing_comment(nodes: &[Node], idx: usize) -> (usize, usize) {
    let node = nodes[idx];
    match nodes.get(idx + 1) {
        Some(next)
            if next.kind() == "comment"
                && next.start_position().row == node.end_position().row =>
        {
            (next.end_byte(), 1)
        }
        _ => (node.end_byte(), 0),
    }
}

fn read_import(node: Node, src: &str, comments: Vec<String>) -> Option<ImportDecl> {
    if node.kind() != "import_statement" {
        return None;
    }

    let module = string_literal_value(node.child_by_field_name("source")?, src)?;

    let mut type_only = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "type" => type_only = true,
            // flow `import typeof` and import attributes are kept verbatim
            "typeof" | "import_attribute" => return None,
            _ => {}
        }
    }

    let mut bindings = Vec::new();
    let clause = code_children(node)
        .into_iter()
        .find(|c| c.kind() == "import_clause");

    if let Some(clause) = clause {
        for part in code_children(clause) {
            match part.kind() {
                "identifier" if type_only => bindings.push(ImportBinding::Named(format!(
                    "type default as {}",
                    node_text(part, src)
                ))),
                "identifier" => bindings.push(ImportBinding::Default(node_text(part, src).to_string())),
                "namespace_import" if type_only => return None,
                "namespace_import" => bindings.push(ImportBinding::Namespace(normalize(node_text(part, src)))),
                "named_imports" => {
                    for spec in code_children(part) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let spec = normalize(node_text(spec, src));
                        bindings.push(ImportBinding::Named(if type_only {
                            format!("type {spec}")
                        } else {
                            spec
                        }));
                    }
                }
                _ => return None,
            }
        }
    }

    Some(ImportDecl {
        module,
        bindings,
        comments,
        trailing: None,
    })
}

fn read_group(
    node: Node,
    src: &str,
    options: &MergeOptions,
    comments: Vec<String>,
) -> Option<TestGroup> {
    let call = call_of_statement(node)?;
    let callee = node_text(call.child_by_field_name("function")?, src);
    if !options.group_callees.iter().any(|c| c == callee) {
        return None;
    }

    let args = code_children(call.child_by_field_name("arguments")?);
    let [name_node, body_fn, ..] = args.as_slice() else {
        return None;
    };

    let Some(name) = string_literal_value(*name_node, src) else {
        tracing::warn!(
            line = node.start_position().row + 1,
            "`{callee}` call without a literal name is kept as a plain statement"
        );
        return None;
    };

    let body = match body_fn.kind() {
        "arrow_function" | "function_expression" | "function" => body_fn.child_by_field_name("body")?,
        _ => return None,
    };
    if body.kind() != "statement_block" {
        return None;
    }

    Some(TestGroup {
        callee: callee.to_string(),
        name,
        name_literal: node_text(*name_node, src).to_string(),
        header: normalize(&src[body_fn.start_byte()..body.start_byte()]),
        comments,
        cases: read_cases(body, src),
        trailing: None,
    })
}

fn read_cases(block: Node, src: &str) -> Vec<TestCase> {
    let nodes = named_children(block);
    let mut cases = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut i = 0;

    while i < nodes.len() {
        let node = nodes[i];

        if node.kind() == "comment" {
            pending.push(node_text(node, src).to_string());
            i += 1;
            continue;
        }

        let (end, consumed) = extend_over_trailing_comment(&nodes, i);
        cases.push(TestCase {
            title: call_title(node, src),
            comments: std::mem::take(&mut pending),
            text: src[node.start_byte()..end].to_string(),
        });
        i += 1 + consumed;
    }

    // comments after the last case stand on their own
    cases.extend(pending.into_iter().map(|c| TestCase {
        title: None,
        comments: Vec::new(),
        text: c,
    }));

    cases
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Suite {
        parse_suite(text, &MergeOptions::default()).unwrap()
    }

    #[test]
    fn blank_text_is_an_empty_suite() {
        assert!(read("  \n\t").is_empty());
    }

    #[test]
    fn imports_are_split_into_bindings() {
        let suite = read("import a, { b as c, d } from './m';\nimport * as ns from \"n\";\nimport 'side';\n");
        let imports: Vec<&ImportDecl> = suite.imports().collect();
        assert_eq!(imports.len(), 3);
        assert_eq!(
            imports[0].bindings,
            vec![
                ImportBinding::Default("a".into()),
                ImportBinding::Named("b as c".into()),
                ImportBinding::Named("d".into()),
            ]
        );
        assert_eq!(imports[1].module, "n");
        assert_eq!(imports[1].bindings, vec![ImportBinding::Namespace("* as ns".into())]);
        assert!(imports[2].bindings.is_empty());
    }

    #[test]
    fn type_only_imports_become_inline_type_bindings() {
        let suite = read("import type { A } from './types';\n");
        let decl = suite.imports().next().unwrap();
        assert_eq!(decl.bindings, vec![ImportBinding::Named("type A".into())]);
    }

    #[test]
    fn groups_keep_case_text_and_comments() {
        let src = "// about greeter\ndescribe('Greeter', () => {\n  // hello case\n  it('says hello', () => {\n    expect(1).toBe(1);\n  });\n  beforeEach(() => reset());\n});\n";
        let suite = read(src);
        let group = suite.group("Greeter").unwrap();
        assert_eq!(group.comments, vec!["// about greeter".to_string()]);
        assert_eq!(group.name_literal, "'Greeter'");
        assert_eq!(group.cases.len(), 2);
        assert_eq!(group.cases[0].title.as_deref(), Some("says hello"));
        assert_eq!(group.cases[0].comments, vec!["// hello case".to_string()]);
        assert_eq!(
            group.cases[0].text,
            "it('says hello', () => {\n    expect(1).toBe(1);\n  });"
        );
        assert_eq!(group.cases[1].title, None);
    }

    #[test]
    fn non_literal_group_names_stay_statements() {
        let suite = read("describe(Greeter.name, () => {});\n");
        assert_eq!(suite.groups().count(), 0);
        assert_eq!(suite.statements().count(), 1);
    }

    #[test]
    fn same_line_comment_stays_with_its_statement() {
        let suite = read("jest.mock('./api'); // network\n");
        let stmt = suite.statements().next().unwrap();
        assert_eq!(stmt.text, "jest.mock('./api'); // network");
        assert!(suite.trailing.is_empty());
    }

    #[test]
    fn same_line_comments_stay_with_imports_and_groups() {
        let suite = read("import { a } from './a'; // eslint-disable-line\ndescribe('A', () => {}); // end A\ndescribe('B', () => {});\n");
        let decl = suite.imports().next().unwrap();
        assert_eq!(decl.trailing.as_deref(), Some("// eslint-disable-line"));
        assert_eq!(suite.group("A").unwrap().trailing.as_deref(), Some("// end A"));
        assert!(suite.group("B").unwrap().comments.is_empty());
    }

    #[test]
    fn group_callback_header_is_recorded() {
        let suite = read("describe('Slow', function () {\n  this.timeout(5000);\n});\ndescribe('Fast', async () => {});\n");
        assert_eq!(suite.group("Slow").unwrap().header, "function ()");
        assert_eq!(suite.group("Fast").unwrap().header, "async () =>");
    }

    #[test]
    fn merge_marker_is_dropped_on_read() {
        let suite = read("// testsync: merged suite\n// real\ndescribe('A', () => {});\n");
        assert_eq!(suite.group("A").unwrap().comments, vec!["// real".to_string()]);
    }

    #[test]
    fn malformed_suite_is_an_error() {
        assert!(parse_suite("describe('x', () => {", &MergeOptions::default()).is_err());
    }
}
