use crate::types::{Tool, WorkflowStep};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// ToolAccess
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ToolAccess {
    /// Every tool is allowed (implementation step).
    Wildcard,
    Only(Vec<Tool>),
}

impl ToolAccess {
    pub fn permits(&self, tool: &Tool) -> bool {
        match self {
            ToolAccess::Wildcard => true,
            ToolAccess::Only(tools) => tools.contains(tool),
        }
    }
}

// ---------------------------------------------------------------------------
// RuleEntry
// ---------------------------------------------------------------------------

/// Per-step gating policy: which tools may run, which are blocked, and what
/// to tell the caller when one is.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub allowed: ToolAccess,
    pub blocked: Vec<Tool>,
    pub message: String,
    pub suggestions: Vec<String>,
}

// ---------------------------------------------------------------------------
// RuleTable
// ---------------------------------------------------------------------------

/// All named tools, for deriving category sets from the `Tool` predicates.
/// `Other` is open-ended and falls through to each step's default-deny.
const NAMED_TOOLS: [Tool; 10] = [
    Tool::Read,
    Tool::Grep,
    Tool::Glob,
    Tool::Ls,
    Tool::Write,
    Tool::Edit,
    Tool::MultiEdit,
    Tool::Bash,
    Tool::TodoWrite,
    Tool::Git,
];

fn category(pred: fn(&Tool) -> bool) -> Vec<Tool> {
    NAMED_TOOLS.into_iter().filter(|t| pred(t)).collect()
}

/// Static step → policy mapping. Constructed explicitly and never mutated;
/// pure lookup, no I/O.
#[derive(Debug, Clone)]
pub struct RuleTable {
    entries: BTreeMap<WorkflowStep, RuleEntry>,
}

impl RuleTable {
    pub fn new(entries: BTreeMap<WorkflowStep, RuleEntry>) -> Self {
        Self { entries }
    }

    pub fn entry(&self, step: WorkflowStep) -> Option<&RuleEntry> {
        self.entries.get(&step)
    }

    /// The canonical six-step table.
    ///
    /// The category sets (READ, WRITE, EXEC, GIT) are derived from the
    /// `Tool` predicates, so table membership cannot drift from the tool
    /// categories. Steps that permit GIT also permit EXEC, so git-flavored
    /// bash never needs special casing at lookup time.
    pub fn default_rules() -> Self {
        let read = || category(Tool::is_read_only);
        let write = || category(Tool::is_write);
        let exec = || category(Tool::is_exec);
        let git = || category(Tool::is_git);

        let mut entries = BTreeMap::new();

        entries.insert(
            WorkflowStep::Planning,
            RuleEntry {
                allowed: ToolAccess::Only({
                    let mut t = read();
                    t.push(Tool::TodoWrite);
                    t
                }),
                blocked: {
                    let mut t = write();
                    t.extend(exec());
                    t
                },
                message: "Planning sprint: read-only exploration until a plan exists".to_string(),
                suggestions: vec![
                    "Record the sprint plan with TodoWrite before changing code".to_string(),
                    "Explore the codebase with Read, Grep, and Glob".to_string(),
                    "Code changes and command execution unlock in the implementation step"
                        .to_string(),
                ],
            },
        );

        entries.insert(
            WorkflowStep::Implementation,
            RuleEntry {
                allowed: ToolAccess::Wildcard,
                blocked: Vec::new(),
                message: "Implementation step: full tool access".to_string(),
                suggestions: Vec::new(),
            },
        );

        entries.insert(
            WorkflowStep::Validation,
            RuleEntry {
                allowed: ToolAccess::Only({
                    let mut t = read();
                    t.extend(exec());
                    t.push(Tool::Edit);
                    t
                }),
                blocked: vec![Tool::Write],
                message: "Validation step: run tests and apply minor fixes with Edit; no new files"
                    .to_string(),
                suggestions: vec![
                    "Run the test suite with Bash".to_string(),
                    "Fix small issues in existing files with Edit".to_string(),
                ],
            },
        );

        entries.insert(
            WorkflowStep::Review,
            RuleEntry {
                allowed: ToolAccess::Only({
                    let mut t = read();
                    t.push(Tool::TodoWrite);
                    t
                }),
                blocked: {
                    let mut t = write();
                    t.extend(exec());
                    t
                },
                message: "Review step: read-only analysis".to_string(),
                suggestions: vec![
                    "Inspect the changes with Read and Grep".to_string(),
                    "Capture review findings with TodoWrite".to_string(),
                    "Apply fixes in the refinement step".to_string(),
                ],
            },
        );

        entries.insert(
            WorkflowStep::Refinement,
            RuleEntry {
                allowed: ToolAccess::Only({
                    let mut t = read();
                    t.push(Tool::Edit);
                    t.push(Tool::MultiEdit);
                    t.extend(exec());
                    t
                }),
                blocked: vec![Tool::Write],
                message: "Refinement step: apply review feedback to existing files; no new files"
                    .to_string(),
                suggestions: vec![
                    "Address review findings with Edit or MultiEdit".to_string(),
                    "Re-run checks with Bash".to_string(),
                ],
            },
        );

        entries.insert(
            WorkflowStep::Integration,
            RuleEntry {
                allowed: ToolAccess::Only({
                    let mut t = read();
                    t.extend(git());
                    t.extend(exec());
                    t
                }),
                blocked: write(),
                message: "Integration step: prepare for merge; no file changes".to_string(),
                suggestions: vec![
                    "Commit and push with git".to_string(),
                    "Verify branch status before merging".to_string(),
                ],
            },
        );

        Self::new(entries)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::default_rules()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_total_over_steps() {
        let table = RuleTable::default_rules();
        for step in WorkflowStep::all() {
            assert!(table.entry(*step).is_some(), "missing entry for {step}");
        }
    }

    #[test]
    fn planning_allows_read_blocks_write_and_exec() {
        let table = RuleTable::default_rules();
        let entry = table.entry(WorkflowStep::Planning).unwrap();
        assert!(entry.allowed.permits(&Tool::Read));
        assert!(entry.allowed.permits(&Tool::TodoWrite));
        assert!(!entry.allowed.permits(&Tool::Write));
        assert!(entry.blocked.contains(&Tool::Write));
        assert!(entry.blocked.contains(&Tool::Bash));
        assert_eq!(entry.suggestions.len(), 3);
    }

    #[test]
    fn implementation_is_wildcard() {
        let table = RuleTable::default_rules();
        let entry = table.entry(WorkflowStep::Implementation).unwrap();
        assert_eq!(entry.allowed, ToolAccess::Wildcard);
        assert!(entry.blocked.is_empty());
        assert!(entry.allowed.permits(&Tool::Other("WebFetch".into())));
    }

    #[test]
    fn validation_permits_edit_but_not_write() {
        let table = RuleTable::default_rules();
        let entry = table.entry(WorkflowStep::Validation).unwrap();
        assert!(entry.allowed.permits(&Tool::Edit));
        assert!(entry.allowed.permits(&Tool::Bash));
        assert!(entry.blocked.contains(&Tool::Write));
        assert!(!entry.allowed.permits(&Tool::MultiEdit));
    }

    #[test]
    fn category_sets_follow_tool_predicates() {
        let table = RuleTable::default_rules();

        // Planning blocks exactly the WRITE and EXEC categories.
        let planning = table.entry(WorkflowStep::Planning).unwrap();
        for tool in NAMED_TOOLS {
            assert_eq!(
                planning.blocked.contains(&tool),
                tool.is_write() || tool.is_exec(),
                "planning blocked set diverges from categories for {tool}"
            );
        }

        // Every read-only tool is allowed in every restricted step.
        for step in WorkflowStep::all() {
            let entry = table.entry(*step).unwrap();
            for tool in NAMED_TOOLS.iter().filter(|t| t.is_read_only()) {
                assert!(entry.allowed.permits(tool), "{tool} must pass in {step}");
            }
        }
    }

    #[test]
    fn integration_permits_git_and_exec_blocks_writes() {
        let table = RuleTable::default_rules();
        let entry = table.entry(WorkflowStep::Integration).unwrap();
        assert!(entry.allowed.permits(&Tool::Git));
        assert!(entry.allowed.permits(&Tool::Bash));
        for tool in [Tool::Write, Tool::Edit, Tool::MultiEdit] {
            assert!(entry.blocked.contains(&tool));
        }
    }
}
