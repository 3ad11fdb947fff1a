use serde::Serialize;

use crate::IssueStatus;

/// Issue totals per moderation status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStats {
    /// Every stored issue.
    pub total_issues: u64,
    /// Issues awaiting moderation.
    pub pending_issues: u64,
    /// Approved issues being worked on.
    pub in_progress_issues: u64,
    /// Fixed issues.
    pub resolved_issues: u64,
    /// Rejected issues.
    pub rejected_issues: u64,
    /// Resolved share of all issues as a whole percentage, 0 when empty.
    pub resolution_rate: u64,
}

impl IssueStats {
    /// Aggregates per-status row counts. Repeated statuses are summed.
    #[must_use]
    pub fn from_counts(counts: &[(IssueStatus, u64)]) -> Self {
        let mut stats = Self::default();
        for (status, count) in counts {
            let bucket = match status {
                IssueStatus::Pending => &mut stats.pending_issues,
                IssueStatus::InProgress => &mut stats.in_progress_issues,
                IssueStatus::Resolved => &mut stats.resolved_issues,
                IssueStatus::Rejected => &mut stats.rejected_issues,
            };
            *bucket += count;
            stats.total_issues += count;
        }

        // Rounded half up.
        if stats.total_issues > 0 {
            stats.resolution_rate =
                (stats.resolved_issues * 200 + stats.total_issues) / (stats.total_issues * 2);
        }

        stats
    }
}
