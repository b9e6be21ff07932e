//! Prompt construction for event extraction.
//!
//! The prompt pins down two things the model cannot be trusted to guess:
//! the output schema (a strict JSON array) and the "current date/time"
//! anchor used to resolve relative expressions like "tomorrow" or "next
//! Friday". Building is pure: identical text, anchor and budget always
//! produce an identical prompt.

use chrono::DateTime;
use chrono_tz::Tz;

/// Marker appended to the text when it was cut to fit the budget.
pub const TRUNCATION_MARKER: &str = "[... text truncated ...]";

/// A finished prompt plus whether its input text was truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// The full prompt text sent to the model.
    pub text: String,
    /// True when the input exceeded the character budget and was cut.
    pub truncated: bool,
}

/// Builds the extraction prompt for a piece of text.
///
/// `now` is the anchor the model is told to resolve relative dates
/// against; `max_chars` bounds how much of the input is embedded. Text
/// over budget is cut at a character boundary and marked with
/// [`TRUNCATION_MARKER`] so the model knows the tail is missing.
pub fn build_prompt(text: &str, now: DateTime<Tz>, max_chars: usize) -> Prompt {
    let mut truncated = false;
    let body = if text.chars().count() > max_chars {
        truncated = true;
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}\n{TRUNCATION_MARKER}")
    } else {
        text.to_string()
    };

    let anchor = now.format("%Y-%m-%d %H:%M (%A)");
    let text = format!(
        "Extract calendar events from the following text.\n\
         \n\
         Current date/time: {anchor}\n\
         \n\
         Return a JSON array where each element is an object with these fields:\n\
         - \"title\": short event title (string, required)\n\
         - \"description\": additional details (string or null)\n\
         - \"start_time\": start in ISO 8601 format, e.g. \"2026-08-28T10:00:00\" (string, required)\n\
         - \"end_time\": end in ISO 8601 format (string or null if unknown)\n\
         - \"location\": where the event takes place (string or null)\n\
         - \"all_day\": true when the event has a date but no time of day (boolean)\n\
         \n\
         Rules:\n\
         - Resolve relative dates (\"tomorrow\", \"next Friday\") against the current date/time above.\n\
         - Assume the current year when no year is stated.\n\
         - Use null for end_time when the text states no end or duration.\n\
         - Only include events the text actually mentions; never invent one.\n\
         - Respond with the JSON array only, no other text.\n\
         - Respond with [] when the text mentions no events.\n\
         \n\
         Text:\n\
         {body}"
    );

    Prompt { text, truncated }
}
