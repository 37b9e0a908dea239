use crossbeam_channel::unbounded;

use crate::detectors::ast::catalog::CallableUnit;
use crate::error::{Result, SyncError};
use crate::llm::fence::unwrap_reply;

/// What a generator is asked to cover for one unit.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub source_path: Option<&'a str>,
    pub source: &'a str,
    pub unit: &'a CallableUnit,
    pub known: &'a [String],
}

/// Anything that turns a request into reply text (usually fenced code).
pub trait TestGenerator: Sync {
    fn generate(&self, request: &GenerationRequest<'_>) -> std::result::Result<String, String>;
}

impl<F> TestGenerator for F
where
    F: Fn(&GenerationRequest<'_>) -> std::result::Result<String, String> + Sync,
{
    fn generate(&self, request: &GenerationRequest<'_>) -> std::result::Result<String, String> {
        self(request)
    }
}

/// Everything needed to fan a batch of units out to a generator.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    pub source_path: Option<&'a str>,
    pub source: &'a str,
    pub selected: &'a [CallableUnit],
    pub known: &'a [String],
    pub languages: &'a [String],
}

/// Cleaned generator output for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    /// Fragments in unit order, separated by a blank line.
    pub text: String,
    /// Units whose reply contained code.
    pub covered: Vec<CallableUnit>,
}

/// Run the generator once per selected unit, concurrently, and join the
/// cleaned replies in unit order with a blank line between fragments.
pub fn generate_fragments(generator: &dyn TestGenerator, batch: &Batch<'_>) -> Result<Fragments> {
    if batch.selected.is_empty() {
        return Ok(Fragments::default());
    }

    let (tx, rx) = unbounded::<(usize, std::result::Result<String, String>)>();

    std::thread::scope(|scope| {
        for (idx, unit) in batch.selected.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let request = GenerationRequest {
                    source_path: batch.source_path,
                    source: batch.source,
                    unit,
                    known: batch.known,
                };
                tracing::debug!(unit = %unit, "generating tests");
                let _ = tx.send((idx, generator.generate(&request)));
            });
        }
    });
    drop(tx);

    let mut replies: Vec<(usize, std::result::Result<String, String>)> = rx.iter().collect();
    replies.sort_by_key(|(idx, _)| *idx);

    let mut fragments = Vec::with_capacity(replies.len());
    let mut covered = Vec::with_capacity(replies.len());
    for (idx, reply) in replies {
        let text = reply.map_err(|e| {
            SyncError::Generation(format!("{}: {}", batch.selected[idx].name, e))
        })?;
        let code = unwrap_reply(&text, batch.languages);
        if code.is_empty() {
            tracing::warn!(unit = %batch.selected[idx], "generator returned no code");
            continue;
        }
        fragments.push(code);
        covered.push(batch.selected[idx].clone());
    }

    Ok(Fragments {
        text: fragments.join("\n\n"),
        covered,
    })
}
