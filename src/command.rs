use anyhow::{bail, Result};

/// Delimiter the agent splits `/update-issue` payloads on. Fields carrying it
/// would shift every later segment, so they are rejected locally.
const FIELD_DELIMITER: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ask,
    RiskCheck,
    UpdateIssue,
}

impl Command {
    pub fn all() -> [Command; 3] {
        [Command::Ask, Command::RiskCheck, Command::UpdateIssue]
    }

    pub fn title(self) -> &'static str {
        match self {
            Command::Ask => "Ask",
            Command::RiskCheck => "Risk Check",
            Command::UpdateIssue => "Update Issue",
        }
    }

    pub fn next(self) -> Command {
        match self {
            Command::Ask => Command::RiskCheck,
            Command::RiskCheck => Command::UpdateIssue,
            Command::UpdateIssue => Command::Ask,
        }
    }

    pub fn prev(self) -> Command {
        match self {
            Command::Ask => Command::UpdateIssue,
            Command::RiskCheck => Command::Ask,
            Command::UpdateIssue => Command::RiskCheck,
        }
    }
}

pub const ISSUE_FIELD_COUNT: usize = 7;

/// The seven `/update-issue` fields, in wire order.
#[derive(Debug, Clone, Default)]
pub struct IssueFields {
    pub category: String,
    pub content: String,
    pub vendor: String,
    pub assignee: String,
    pub priority: String,
    pub deadline: String,
    pub impact: String,
}

impl IssueFields {
    pub fn labels() -> [&'static str; ISSUE_FIELD_COUNT] {
        [
            "Category", "Content", "Vendor", "Assignee", "Priority", "Deadline", "Impact",
        ]
    }

    /// Priority and impact are optional; everything else must be present.
    pub fn required(idx: usize) -> bool {
        !matches!(idx, 4 | 6)
    }

    pub fn field(&self, idx: usize) -> Option<&String> {
        match idx {
            0 => Some(&self.category),
            1 => Some(&self.content),
            2 => Some(&self.vendor),
            3 => Some(&self.assignee),
            4 => Some(&self.priority),
            5 => Some(&self.deadline),
            6 => Some(&self.impact),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, idx: usize) -> Option<&mut String> {
        match idx {
            0 => Some(&mut self.category),
            1 => Some(&mut self.content),
            2 => Some(&mut self.vendor),
            3 => Some(&mut self.assignee),
            4 => Some(&mut self.priority),
            5 => Some(&mut self.deadline),
            6 => Some(&mut self.impact),
            _ => None,
        }
    }

    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        if self.vendor.trim().is_empty() {
            missing.push("vendor");
        }
        if self.assignee.trim().is_empty() {
            missing.push("assignee");
        }
        if self.deadline.trim().is_empty() {
            missing.push("deadline");
        }
        missing
    }

    fn has_embedded_delimiter(&self) -> bool {
        [
            &self.category,
            &self.content,
            &self.vendor,
            &self.assignee,
            &self.priority,
            &self.deadline,
            &self.impact,
        ]
        .iter()
        .any(|v| v.contains(FIELD_DELIMITER))
    }
}

/// Build the `/ask` command. Blank questions are rejected before any request
/// is made.
pub fn build_ask(query: &str) -> Result<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        bail!("Enter a question before sending");
    }
    Ok(format!("/ask {}", trimmed))
}

/// `/risk-alert` takes no parameters and cannot fail.
pub fn build_risk_alert() -> String {
    "/risk-alert".to_string()
}

/// Build the `/update-issue` command: seven pipe-joined segments in fixed
/// order. Free-text fields are trimmed; priority, deadline and impact are
/// sent as entered.
pub fn build_update_issue(fields: &IssueFields) -> Result<String> {
    let missing = fields.missing_required();
    if !missing.is_empty() {
        bail!("Required fields missing: {}", missing.join(", "));
    }
    if fields.has_embedded_delimiter() {
        bail!("Fields may not contain the '|' character");
    }

    let joined = [
        fields.category.trim(),
        fields.content.trim(),
        fields.vendor.trim(),
        fields.assignee.trim(),
        fields.priority.as_str(),
        fields.deadline.as_str(),
        fields.impact.as_str(),
    ]
    .join("|");

    Ok(format!("/update-issue {}", joined))
}
