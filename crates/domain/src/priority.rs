use serde::Serialize;

use crate::{Issue, IssueStatus, Severity};

/// Issue paired with its moderation priority score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrioritizedIssue {
    /// The ranked issue.
    #[serde(flatten)]
    pub issue: Issue,
    /// Score used for ranking; higher is more urgent.
    pub priority_score: f64,
}

/// Computes `upvotes * severity * status_multiplier / 100`.
///
/// Pending issues weigh 1.5, in-progress issues 1.2 and everything else 0.8.
#[must_use]
pub fn priority_score(upvotes: u32, severity: Severity, status: IssueStatus) -> f64 {
    let multiplier = match status {
        IssueStatus::Pending => 1.5,
        IssueStatus::InProgress => 1.2,
        IssueStatus::Resolved | IssueStatus::Rejected => 0.8,
    };

    f64::from(upvotes) * f64::from(severity.value()) * multiplier / 100.0
}

/// Scores issues and orders them from most to least urgent.
#[must_use]
pub fn rank_by_priority(issues: Vec<Issue>) -> Vec<PrioritizedIssue> {
    let mut ranked: Vec<PrioritizedIssue> = issues
        .into_iter()
        .map(|issue| PrioritizedIssue {
            priority_score: priority_score(issue.upvotes, issue.severity, issue.status),
            issue,
        })
        .collect();

    ranked.sort_by(|left, right| right.priority_score.total_cmp(&left.priority_score));
    ranked
}
