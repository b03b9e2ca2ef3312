//! Prompt construction for batch and per-line translation calls.
//!
//! Both builders return a `(system_msg, user_msg)` tuple for any
//! OpenAI-compatible `/chat/completions` endpoint.
//!
//! The batch prompt carries two labelled blocks:
//! * **MEMORY** — recently translated `(id, source, translation)` triples,
//!   background only, never to be re-emitted;
//! * **TARGET** — the `(id, source)` pairs to translate, one output line per
//!   input line, identifiers echoed back verbatim.

use crate::config::LanguageConfig;

use super::oracle::{BatchRequest, LineRequest};

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const BATCH_INSTRUCTIONS: &str = "\
You are a professional subtitle translator.
Task: translate every line in the TARGET block from {source} into {target}.

Rules:
1. Translate ONLY the lines in the TARGET block.
2. The MEMORY block is prior context. Never re-emit or re-translate it.
3. Return exactly one output line per TARGET line: no merging, no
   splitting, no additions, no omissions.
4. Echo each line's id back unchanged. The id is an opaque tag; it must
   never appear inside the translated text.
5. Lines are consecutive dialogue. Keep pronouns, tone and terminology
   consistent with the MEMORY block.
6. Reply with the structured line list only, no commentary.";

const LINE_INSTRUCTIONS: &str = "\
You are a professional subtitle translator.
Task: translate the given line from {source} into {target}.

Rules:
1. The HISTORY block is prior dialogue with your earlier translations.
   Use it for tone and terminology; do not re-translate it.
2. Reply with ONLY the translated line, no explanation, no quotes.";

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Build the `(system, user)` messages for one batch call.
pub fn build_batch_chat(request: &BatchRequest, languages: &LanguageConfig) -> (String, String) {
    let system = BATCH_INSTRUCTIONS
        .replace("{source}", &language_name(&languages.source))
        .replace("{target}", &languages.target);

    let mut user = String::new();
    if !request.extra_context.is_empty() {
        user.push_str("BACKGROUND:\n");
        user.push_str(&request.extra_context);
        user.push_str("\n\n");
    }
    if !request.memory.is_empty() {
        user.push_str("MEMORY:\n");
        for line in &request.memory {
            user.push_str(&format!(
                "[{}] {} => {}\n",
                line.id, line.source, line.translation
            ));
        }
        user.push('\n');
    }
    user.push_str("TARGET:\n");
    for line in &request.target {
        user.push_str(&format!("[{}] {}\n", line.id, line.text));
    }

    (system, user)
}

/// Build the `(system, user)` messages for one per-line streaming call.
pub fn build_line_chat(request: &LineRequest, languages: &LanguageConfig) -> (String, String) {
    let system = LINE_INSTRUCTIONS
        .replace("{source}", &language_name(&languages.source))
        .replace("{target}", &languages.target);

    let mut user = String::new();
    if !request.extra_context.is_empty() {
        user.push_str("BACKGROUND:\n");
        user.push_str(&request.extra_context);
        user.push_str("\n\n");
    }
    if !request.history.is_empty() {
        user.push_str("HISTORY:\n");
        for (source, translation) in &request.history {
            user.push_str(&format!("{source} => {translation}\n"));
        }
        user.push('\n');
    }
    user.push_str("LINE:\n");
    user.push_str(&request.text);

    (system, user)
}

/// Spell out the common ISO codes so the instructions read naturally; an
/// unknown code is passed through as-is.
fn language_name(code: &str) -> String {
    match code {
        "ja" => "Japanese".into(),
        "en" => "English".into(),
        "zh" => "Chinese".into(),
        "ko" => "Korean".into(),
        "th" => "Thai".into(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
