use similar::{ChangeTag, TextDiff};

/// Unified diff of a suite file against the text about to replace it.
pub fn suite_diff(path: &str, before: Option<&str>, after: &str) -> String {
    match before {
        Some(b) => TextDiff::from_lines(b, after)
            .unified_diff()
            .context_radius(3)
            .header(path, path)
            .to_string(),
        None => after
            .lines()
            .map(|l| format!("+{}\n", l))
            .collect(),
    }
}

/// Added and removed line counts between two texts.
pub fn change_counts(before: &str, after: &str) -> (usize, usize) {
    let diff = TextDiff::from_lines(before, after);
    diff.iter_all_changes()
        .fold((0, 0), |(ins, del), change| match change.tag() {
            ChangeTag::Insert => (ins + 1, del),
            ChangeTag::Delete => (ins, del + 1),
            ChangeTag::Equal => (ins, del),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_case_shows_as_insertions_only() {
        let before = "describe('G', () => {\n  it('a', () => {});\n});\n";
        let after = "describe('G', () => {\n  it('a', () => {});\n\n  it('b', () => {});\n});\n";
        assert_eq!(change_counts(before, after), (2, 0));

        let diff = suite_diff("g.test.js", Some(before), after);
        assert!(diff.starts_with("--- g.test.js\n+++ g.test.js\n"));
        assert!(diff.contains("+  it('b', () => {});"));
    }

    #[test]
    fn new_file_is_all_additions() {
        assert_eq!(suite_diff("x", None, "a\nb\n"), "+a\n+b\n");
    }
}
