use std::collections::HashSet;

use testsync::testgen::suite::parse_suite;
use testsync::{merge, MergeOptions, SyncError};

const EXISTING: &str = r#"import { greet } from '../src/greeter';
import * as fixtures from './fixtures';

jest.mock('../src/clock'); // frozen time

// greeting behaviour
describe('Greeter', () => {
  beforeEach(() => fixtures.reset());

  it('says hello', () => {
    expect(greet('Ann')).toBe('hello Ann');
  });
});

describe('Farewell', () => {
  it('says bye', () => {
    expect(1).toBe(1);
  });
});
"#;

const GENERATED: &str = r#"import { greet, farewell } from '../src/greeter';
import { render } from '@testing-library/react';

describe('Greeter', () => {
  it('says hello', () => {
    expect(greet('Bob')).toBe('hello Bob');
  });

  it('says goodbye', () => {
    expect(farewell('Bob')).toBe('bye Bob');
  });
});

describe('Renderer', () => {
  it('renders', () => {
    render(null);
  });
});
"#;

fn titles(text: &str, group: &str) -> Vec<String> {
    let suite = parse_suite(text, &MergeOptions::default()).unwrap();
    suite
        .group(group)
        .map(|g| g.titles().map(str::to_owned).collect())
        .unwrap_or_default()
}

#[test]
fn merging_into_nothing_keeps_everything() {
    let options = MergeOptions::default();
    let merged = merge(EXISTING, "").unwrap();
    assert_eq!(
        parse_suite(&merged, &options).unwrap(),
        parse_suite(EXISTING, &options).unwrap()
    );
}

#[test]
fn greeter_gains_only_the_new_case() {
    let merged = merge(GENERATED, EXISTING).unwrap();
    assert_eq!(titles(&merged, "Greeter"), vec!["says hello", "says goodbye"]);
    assert!(merged.contains("expect(greet('Ann')).toBe('hello Ann');"));
    assert!(!merged.contains("hello Bob"));
}

#[test]
fn groups_keep_existing_order_and_append_new_ones() {
    let merged = merge(GENERATED, EXISTING).unwrap();
    let suite = parse_suite(&merged, &MergeOptions::default()).unwrap();
    let names: Vec<&str> = suite.groups().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Greeter", "Farewell", "Renderer"]);
}

#[test]
fn imports_of_one_module_become_one_statement() {
    let merged = merge(GENERATED, EXISTING).unwrap();
    let greeter_imports: Vec<&str> = merged
        .lines()
        .filter(|l| l.starts_with("import") && l.contains("'../src/greeter'"))
        .collect();
    assert_eq!(greeter_imports, vec!["import { greet, farewell } from '../src/greeter';"]);
    assert!(merged.contains("import { render } from '@testing-library/react';"));
    assert!(merged.contains("import * as fixtures from './fixtures';"));
}

#[test]
fn statements_and_hooks_survive() {
    let merged = merge(GENERATED, EXISTING).unwrap();
    assert!(merged.contains("jest.mock('../src/clock'); // frozen time"));
    assert!(merged.contains("  beforeEach(() => fixtures.reset());"));
    assert!(merged.contains("// greeting behaviour\ndescribe('Greeter'"));
}

#[test]
fn merging_the_same_suite_again_adds_no_duplicates() {
    let once = merge(GENERATED, EXISTING).unwrap();
    let twice = merge(&once, GENERATED).unwrap();

    let suite = parse_suite(&twice, &MergeOptions::default()).unwrap();
    for group in suite.groups() {
        let mut seen = HashSet::new();
        for title in group.titles() {
            assert!(seen.insert(title), "duplicate {title:?} in {}", group.name);
        }
    }
    assert_eq!(twice.matches(&MergeOptions::default().marker).count(), 1);
}

#[test]
fn remerging_the_existing_suite_is_stable() {
    let once = merge(GENERATED, EXISTING).unwrap();
    let again = merge(&once, EXISTING).unwrap();

    let suite = parse_suite(&again, &MergeOptions::default()).unwrap();
    for group in suite.groups() {
        let mut seen = HashSet::new();
        for title in group.titles() {
            assert!(seen.insert(title), "duplicate {title:?} in {}", group.name);
        }
    }
    assert_eq!(titles(&again, "Greeter"), vec!["says hello", "says goodbye"]);
    assert_eq!(titles(&again, "Farewell"), vec!["says bye"]);
    assert_eq!(titles(&again, "Renderer"), vec!["renders"]);
}

#[test]
fn same_line_comments_stay_on_their_line() {
    let suite = "import { a } from './a'; // eslint-disable-line import/no-unresolved\n\ndescribe('G', () => {\n  it('x', () => {});\n}); // end G\n\ndescribe('H', () => {\n  it('y', () => {});\n});\n";
    assert_eq!(merge(suite, "").unwrap(), suite);
}

#[test]
fn function_callbacks_keep_their_this_binding() {
    let mocha = "describe('Slow', function () {\n  this.timeout(5000);\n\n  it('waits', function (done) {\n    setTimeout(done, 10);\n  });\n});\n";
    assert_eq!(merge(mocha, "").unwrap(), mocha);

    let generated = "describe('Slow', () => {\n  it('finishes', () => {});\n});\n";
    let merged = merge(generated, mocha).unwrap();
    assert!(merged.starts_with("describe('Slow', function () {\n  this.timeout(5000);"));
    assert_eq!(titles(&merged, "Slow"), vec!["waits", "finishes"]);
}

#[test]
fn overlapping_import_specifiers_are_unioned() {
    let merged = merge(
        "import { b, c } from './m';\n",
        "import { a, b } from './m';\n",
    )
    .unwrap();
    assert_eq!(merged, "import { a, b, c } from './m';\n");
}

#[test]
fn broken_generated_code_fails_the_merge() {
    let err = merge("describe('x', () => {", EXISTING).unwrap_err();
    assert!(matches!(err, SyncError::Merge(_)));
}
