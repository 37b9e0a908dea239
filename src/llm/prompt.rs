use crate::llm::backend::GenerationRequest;

#[derive(Debug, Clone)]
pub struct LlmPrompt {
    pub system: String,
    pub user: String,
}

pub const DEFAULT_FRAMEWORK: &str = "jest";

pub fn build_prompt(request: &GenerationRequest<'_>, framework: &str) -> LlmPrompt {
    LlmPrompt {
        system: system_prompt(),
        user: user_prompt(request, framework),
    }
}

/* ============================================================
   System prompt (stable, reused)
   ============================================================ */

fn system_prompt() -> String {
    r#"
You are an expert test engineer writing unit tests for JavaScript and TypeScript code.

Rules:
- Cover normal, boundary and failure cases
- Stay compatible with the tests that already exist
- Group cases in one describe block per unit under test
- Give every case a unique, descriptive title
- Write explanations as code comments, never as prose
- Use ES module syntax
- Output code in fenced ```javascript blocks only
"#
    .trim()
    .to_string()
}

/* ============================================================
   User prompt (fully derived from the request)
   ============================================================ */

fn user_prompt(r: &GenerationRequest<'_>, framework: &str) -> String {
    let mut out = String::new();

    /* ---------- TARGET ---------- */
    out.push_str("TARGET\n");
    if let Some(path) = r.source_path {
        out.push_str(&format!("File: {}\n", path));
    }
    out.push_str(&format!(
        "Unit: {} ({}, line {})\n",
        r.unit.name, r.unit.kind, r.unit.line
    ));
    out.push_str(&format!("Test Framework: {}\n\n", framework));

    /* ---------- EXISTING TESTS ---------- */
    out.push_str("ALREADY TESTED\n");
    if r.known.is_empty() {
        out.push_str("(none)\n\n");
    } else {
        out.push_str(&r.known.join(", "));
        out.push_str("\n\n");
    }

    /* ---------- SOURCE ---------- */
    out.push_str("SOURCE\n```\n");
    out.push_str(r.source);
    if !r.source.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```\n");

    out
}
