use crate::types::ToolEvent;
use regex::RegexSetBuilder;

/// Fixed emergency keyword patterns, matched case-insensitively against
/// the event's command or message text.
const PATTERNS: &[&str] = &[
    r"emergency:",
    r"hotfix:",
    r"critical:",
    r"override:",
    r"production.*down",
    r"security.*vulnerability",
    r"data.*loss",
];

/// Scans event text for emergency keywords. A match short-circuits the
/// rule table entirely: any tool, any step. Pure function of the event;
/// no state is consulted.
#[derive(Debug, Clone)]
pub struct EmergencyMatcher {
    set: regex::RegexSet,
}

impl EmergencyMatcher {
    pub fn new() -> Self {
        let set = RegexSetBuilder::new(PATTERNS)
            .case_insensitive(true)
            .build()
            .expect("emergency patterns are valid regexes");
        Self { set }
    }

    pub fn is_emergency(&self, event: &ToolEvent) -> bool {
        event
            .command_text()
            .map(|text| self.set.is_match(text))
            .unwrap_or(false)
    }

    pub fn matches_text(&self, text: &str) -> bool {
        self.set.is_match(text)
    }
}

impl Default for EmergencyMatcher {
    fn default() -> Self {
        Self::new()
    }
}
