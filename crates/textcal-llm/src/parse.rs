//! Response parsing: model text to candidate events.
//!
//! Model output is untrusted. It may wrap the JSON array in prose, return a
//! bare object, or return nothing usable at all. Parsing therefore never
//! fails: it yields the entries it could decode plus a diagnostic for
//! everything it could not, and the worst case is an empty list with a
//! diagnostic explaining why.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use textcal_core::CandidateEvent;

/// Matches the widest bracketed span, so prose before and after the JSON
/// array is ignored.
static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));

/// What came out of a model response: decoded entries plus diagnostics for
/// everything that was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// Entries that decoded into candidate events, in response order.
    pub events: Vec<CandidateEvent>,
    /// One message per dropped entry or unusable response.
    pub diagnostics: Vec<String>,
}

impl ParseOutcome {
    /// Joins the diagnostics into a single report note.
    pub fn diagnostic(&self) -> Option<String> {
        if self.diagnostics.is_empty() {
            None
        } else {
            Some(self.diagnostics.join("; "))
        }
    }
}

/// Decodes a model response into candidate events.
///
/// The JSON array is located with a greedy bracket match so surrounding
/// prose does not matter; when no bracketed span exists the whole response
/// is tried as-is. Each array entry decodes independently, so one malformed
/// entry never takes down its neighbours.
pub fn parse_events(response: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    let trimmed = response.trim();
    if trimmed.is_empty() {
        outcome
            .diagnostics
            .push("model returned an empty response".to_string());
        return outcome;
    }

    let candidate = ARRAY_RE
        .find(trimmed)
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    let values = match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(serde_json::Value::Array(values)) => values,
        Ok(other) => {
            warn!(kind = json_kind(&other), "model response was not a JSON array");
            outcome.diagnostics.push(format!(
                "model response was {} instead of a JSON array",
                json_kind(&other)
            ));
            return outcome;
        }
        Err(e) => {
            warn!(error = %e, "model response was not valid JSON");
            outcome
                .diagnostics
                .push(format!("model response was not valid JSON: {}", e));
            return outcome;
        }
    };

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<CandidateEvent>(value) {
            Ok(event) => outcome.events.push(event),
            Err(e) => {
                warn!(index, error = %e, "dropping undecodable entry");
                outcome
                    .diagnostics
                    .push(format!("entry {} could not be decoded: {}", index + 1, e));
            }
        }
    }

    debug!(
        events = outcome.events.len(),
        dropped = outcome.diagnostics.len(),
        "parsed model response"
    );
    outcome
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
