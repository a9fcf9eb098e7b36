//! Prompt for the contract red-flag review.
//!
//! Every prompt string lives here so a wording change touches one file and
//! unit tests can inspect the rendered prompt without a model.
//!
//! The category keys are part of the response contract: the parser and the
//! HTTP clients both expect exactly these names.

use std::num::NonZeroUsize;

/// Risk categories, as `(response key, description shown to the model)`.
pub const RISK_CATEGORIES: [(&str, &str); 5] = [
    ("auto_renewal", "Auto-renewal clauses"),
    ("termination_fees", "Termination fees"),
    ("payment_terms", "Payment terms longer than 30 days"),
    ("compliance_gaps", "Compliance or legal risks"),
    ("exclusivity_clauses", "Exclusivity or lock-in"),
];

/// Opening instruction placed before the category list.
pub const ANALYST_ROLE: &str = "You are a contract risk analyzer. Identify red flags in the following vendor contract text in plain English:";

/// Response keys, in prompt order.
pub fn category_keys() -> impl Iterator<Item = &'static str> {
    RISK_CATEGORIES.iter().map(|(key, _)| *key)
}

/// Render the analysis prompt around the first `budget` characters of `text`.
///
/// Deterministic: the same text and budget always yield the same prompt.
pub fn build_prompt(text: &str, budget: NonZeroUsize) -> String {
    let excerpt = truncate_chars(text, budget.get());

    let mut prompt = String::with_capacity(excerpt.len() + 512);
    prompt.push_str(ANALYST_ROLE);
    prompt.push('\n');
    for (i, (_, description)) in RISK_CATEGORIES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, description));
    }

    prompt.push_str(
        "\nReturn them as a single flat JSON object whose values are plain-English strings \
(use an empty string when nothing is found), under exactly these keys:\n",
    );
    for key in category_keys() {
        prompt.push_str("- ");
        prompt.push_str(key);
        prompt.push('\n');
    }
    prompt.push_str("Respond with the JSON object only.\n\nContract:\n");
    prompt.push_str(excerpt);
    prompt.push('\n');
    prompt
}

/// Longest prefix of `text` holding at most `max_chars` characters.
///
/// Counts `char`s, not bytes, so multi-byte text is never split mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
