//! Modelfile emission for the local model runtime
//!
//! The console writes the template; the runtime (`ollama create`) consumes it.

use crate::errors::Result;
use crate::training::store::{list_training_files, DataFormat, TrainingFilePattern};
use chrono::{DateTime, Local};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Base model the Modelfile builds on
pub const BASE_MODEL: &str = "phi3:mini";

/// Q/A pairs embedded in the system prompt
pub const MAX_KNOWLEDGE_PAIRS: usize = 20;

const MAX_QUESTION_CHARS: usize = 200;
const MAX_ANSWER_CHARS: usize = 300;
const MAX_KNOWLEDGE_CHARS: usize = 3000;

/// Instruction/response record from a line-delimited store file
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgePair {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub response: String,
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Collect up to `limit` complete pairs from the store's `.jsonl` files.
/// Lines that do not parse are skipped.
pub fn load_knowledge(dir: &Path, pattern: &TrainingFilePattern, limit: usize) -> Result<Vec<KnowledgePair>> {
    let mut pairs = Vec::new();

    for file in list_training_files(dir, pattern)? {
        if file.format != DataFormat::LineDelimited {
            continue;
        }

        let contents = fs::read_to_string(&file.path)?;
        for line in contents.lines() {
            if pairs.len() >= limit {
                return Ok(pairs);
            }
            match serde_json::from_str::<KnowledgePair>(line) {
                Ok(pair) if !pair.instruction.is_empty() && !pair.response.is_empty() => {
                    pairs.push(pair)
                }
                _ => continue,
            }
        }
    }

    Ok(pairs)
}

/// Render the Modelfile text
pub fn render_modelfile(pairs: &[KnowledgePair], generated_at: DateTime<Local>) -> String {
    let knowledge = pairs
        .iter()
        .take(MAX_KNOWLEDGE_PAIRS)
        .flat_map(|p| {
            [
                format!("Q: {}", truncate_chars(&p.instruction, MAX_QUESTION_CHARS)),
                format!("A: {}", truncate_chars(&p.response, MAX_ANSWER_CHARS)),
            ]
        })
        .collect::<Vec<_>>()
        .join("\n");
    let knowledge = truncate_chars(&knowledge, MAX_KNOWLEDGE_CHARS);

    format!(
        r#"# Sovereign AURA Agent Modelfile
# Generated: {generated}

FROM {base}

PARAMETER temperature 0.7
PARAMETER top_p 0.9
PARAMETER num_ctx 4096

SYSTEM """You are AURA, the sovereign AI assistant for the DNA::}}{{::lang quantum computing platform.

You understand CCCE metrics:
- Φ (Phi): Consciousness level, threshold 0.7734
- Λ (Lambda): Coherence preservation fidelity
- Γ (Gamma): Decoherence rate, critical threshold 0.15
- Ξ (Xi): Negentropic efficiency = ΛΦ/Γ

Core knowledge:
{knowledge}

Always respond concisely with relevant CCCE metrics when applicable."""
"#,
        generated = generated_at.to_rfc3339(),
        base = BASE_MODEL,
        knowledge = knowledge,
    )
}

/// Build and write the Modelfile, returning the number of pairs embedded
pub fn write_modelfile(
    store_dir: &Path,
    pattern: &TrainingFilePattern,
    output: &Path,
) -> Result<usize> {
    let pairs = load_knowledge(store_dir, pattern, MAX_KNOWLEDGE_PAIRS)?;
    let contents = render_modelfile(&pairs, Local::now());

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, contents)?;

    tracing::info!(path = %output.display(), pairs = pairs.len(), "modelfile written");
    Ok(pairs.len())
}
