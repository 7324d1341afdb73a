use crate::emergency::EmergencyMatcher;
use crate::rules::{RuleTable, ToolAccess};
use crate::state::Metrics;
use crate::types::{ToolEvent, WorkflowStep};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Outcome of gating one tool invocation. A blocked tool is a normal
/// business outcome, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    pub emergency: bool,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl Decision {
    pub fn allow(message: impl Into<String>) -> Self {
        Self {
            allowed: true,
            emergency: false,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn block(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            allowed: false,
            emergency: false,
            message: message.into(),
            suggestions,
        }
    }

    pub fn emergency_override() -> Self {
        Self {
            allowed: true,
            emergency: true,
            message: "Emergency override accepted".to_string(),
            suggestions: Vec::new(),
        }
    }

    /// Wire shape consumed by the hook layer.
    pub fn response(&self) -> DecisionResponse<'_> {
        DecisionResponse {
            decision: if self.allowed { "allow" } else { "block" },
            message: if self.allowed {
                Some(&self.message)
            } else {
                None
            },
            reason: if self.allowed {
                None
            } else {
                Some(&self.message)
            },
            suggestions: &self.suggestions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse<'a> {
    pub decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
    #[serde(skip_serializing_if = "no_suggestions")]
    pub suggestions: &'a [String],
}

fn no_suggestions(suggestions: &&[String]) -> bool {
    suggestions.is_empty()
}

// ---------------------------------------------------------------------------
// Metrics recording
// ---------------------------------------------------------------------------

impl Metrics {
    /// Every evaluation increments exactly one of allowed/blocked; an
    /// emergency override additionally bumps its own counter. A blocked
    /// attempt is also a workflow violation.
    pub fn record(&mut self, decision: &Decision) {
        if decision.allowed {
            self.tools_allowed += 1;
        } else {
            self.tools_blocked += 1;
            self.workflow_violations += 1;
        }
        if decision.emergency {
            self.emergency_overrides += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// ToolUseEvaluator
// ---------------------------------------------------------------------------

/// Combines the rule table with the emergency matcher to gate one
/// (step, tool, event) triple. Explicitly constructed and immutable; no
/// hidden shared configuration.
#[derive(Debug, Clone)]
pub struct ToolUseEvaluator {
    rules: RuleTable,
    matcher: EmergencyMatcher,
}

impl ToolUseEvaluator {
    pub fn new(rules: RuleTable) -> Self {
        Self {
            rules,
            matcher: EmergencyMatcher::new(),
        }
    }

    pub fn evaluate(&self, step: WorkflowStep, event: &ToolEvent) -> Decision {
        // Override supremacy: bypasses all step restrictions.
        if self.matcher.is_emergency(event) {
            return Decision::emergency_override();
        }

        // Fail-open on a step with no policy.
        let Some(entry) = self.rules.entry(step) else {
            return Decision::allow(format!("no rules defined for {step}; allowing"));
        };

        if entry.allowed == ToolAccess::Wildcard {
            return Decision::allow(entry.message.clone());
        }
        if entry.blocked.contains(&event.tool) {
            return Decision::block(entry.message.clone(), entry.suggestions.clone());
        }
        if entry.allowed.permits(&event.tool) {
            return Decision::allow(entry.message.clone());
        }
        Decision::block(
            format!("{} is not allowed during the {step} step", event.tool),
            Vec::new(),
        )
    }
}

impl Default for ToolUseEvaluator {
    fn default() -> Self {
        Self::new(RuleTable::default_rules())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
