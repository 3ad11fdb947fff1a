use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use wereport_application::{CommentRepository, IssuePage, IssueRepository, UpvoteOutcome};
use wereport_core::{AppError, AppResult};
use wereport_domain::{Comment, Issue, IssueId, IssueSearch, IssueSort, IssueStatus, PageRequest};

/// In-memory issue, upvote and comment repository.
#[derive(Debug, Default)]
pub struct InMemoryIssueRepository {
    issues: RwLock<HashMap<IssueId, Issue>>,
    upvotes: RwLock<HashSet<(IssueId, String)>>,
    comments: RwLock<Vec<Comment>>,
}

impl InMemoryIssueRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn sorted(&self, filter: impl Fn(&Issue) -> bool, sort: IssueSort) -> Vec<Issue> {
        let issues = self.issues.read().await;
        let mut values: Vec<Issue> = issues
            .values()
            .filter(|issue| filter(*issue))
            .cloned()
            .collect();
        values.sort_by(|left, right| sort.compare(left, right));
        values
    }
}

fn page_of(issues: Vec<Issue>, page: PageRequest) -> IssuePage {
    let total = u64::try_from(issues.len()).unwrap_or(u64::MAX);
    let issues = issues
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
        .collect();

    IssuePage { issues, total }
}

fn take(mut issues: Vec<Issue>, limit: u32) -> Vec<Issue> {
    issues.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    issues
}

fn missing(issue_id: IssueId) -> AppError {
    AppError::NotFound(format!("issue '{issue_id}' does not exist"))
}

#[async_trait]
impl IssueRepository for InMemoryIssueRepository {
    async fn insert_issue(&self, issue: Issue) -> AppResult<Issue> {
        let mut issues = self.issues.write().await;
        if issues.contains_key(&issue.id) {
            return Err(AppError::Conflict(format!(
                "issue '{}' already exists",
                issue.id
            )));
        }

        issues.insert(issue.id, issue.clone());
        Ok(issue)
    }

    async fn find_issue(&self, issue_id: IssueId) -> AppResult<Option<Issue>> {
        Ok(self.issues.read().await.get(&issue_id).cloned())
    }

    async fn list_issues(&self, page: PageRequest) -> AppResult<IssuePage> {
        let issues = self.sorted(|_| true, IssueSort::Newest).await;
        Ok(page_of(issues, page))
    }

    async fn search_issues(&self, search: &IssueSearch) -> AppResult<IssuePage> {
        let issues = self
            .sorted(|issue| search.matches(issue), search.sort())
            .await;
        Ok(page_of(issues, search.page()))
    }

    async fn list_issues_by_status(
        &self,
        status: IssueStatus,
        limit: u32,
    ) -> AppResult<Vec<Issue>> {
        let issues = self
            .sorted(|issue| issue.status == status, IssueSort::Upvotes)
            .await;
        Ok(take(issues, limit))
    }

    async fn list_most_upvoted(&self, limit: u32) -> AppResult<Vec<Issue>> {
        let issues = self.sorted(|_| true, IssueSort::Upvotes).await;
        Ok(take(issues, limit))
    }

    async fn add_upvote(&self, issue_id: IssueId, user_id: &str) -> AppResult<UpvoteOutcome> {
        let mut issues = self.issues.write().await;
        let issue = issues.get_mut(&issue_id).ok_or_else(|| missing(issue_id))?;

        let changed = self
            .upvotes
            .write()
            .await
            .insert((issue_id, user_id.to_owned()));
        if changed {
            issue.upvotes = issue.upvotes.saturating_add(1);
        }

        Ok(UpvoteOutcome {
            changed,
            upvotes: issue.upvotes,
        })
    }

    async fn remove_upvote(&self, issue_id: IssueId, user_id: &str) -> AppResult<UpvoteOutcome> {
        let mut issues = self.issues.write().await;
        let issue = issues.get_mut(&issue_id).ok_or_else(|| missing(issue_id))?;

        let changed = self
            .upvotes
            .write()
            .await
            .remove(&(issue_id, user_id.to_owned()));
        if changed {
            issue.upvotes = issue.upvotes.saturating_sub(1);
        }

        Ok(UpvoteOutcome {
            changed,
            upvotes: issue.upvotes,
        })
    }

    async fn update_status(
        &self,
        issue_ids: &[IssueId],
        status: IssueStatus,
        updated_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut issues = self.issues.write().await;
        let mut affected = 0;
        for issue_id in issue_ids {
            if let Some(issue) = issues.get_mut(issue_id) {
                issue.status = status;
                issue.updated_at = updated_at;
                affected += 1;
            }
        }

        Ok(affected)
    }

    async fn delete_issues(&self, issue_ids: &[IssueId]) -> AppResult<u64> {
        let mut issues = self.issues.write().await;
        let mut affected = 0;
        for issue_id in issue_ids {
            if issues.remove(issue_id).is_some() {
                affected += 1;
            }
        }

        let deleted: HashSet<IssueId> = issue_ids.iter().copied().collect();
        self.upvotes
            .write()
            .await
            .retain(|(issue_id, _)| !deleted.contains(issue_id));
        self.comments
            .write()
            .await
            .retain(|comment| !deleted.contains(&comment.issue_id));

        Ok(affected)
    }

    async fn update_issue(&self, issue: &Issue) -> AppResult<Option<Issue>> {
        let mut issues = self.issues.write().await;
        let Some(stored) = issues.get_mut(&issue.id) else {
            return Ok(None);
        };

        stored.title.clone_from(&issue.title);
        stored.description.clone_from(&issue.description);
        stored.category = issue.category;
        stored.severity = issue.severity;
        stored.status = issue.status;
        stored.assigned_authority.clone_from(&issue.assigned_authority);
        stored.updated_at = issue.updated_at;

        Ok(Some(stored.clone()))
    }

    async fn count_by_status(&self) -> AppResult<Vec<(IssueStatus, u64)>> {
        let mut counts: HashMap<IssueStatus, u64> = HashMap::new();
        for issue in self.issues.read().await.values() {
            *counts.entry(issue.status).or_default() += 1;
        }

        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryIssueRepository {
    async fn insert_comment(&self, comment: Comment) -> AppResult<Comment> {
        if !self.issues.read().await.contains_key(&comment.issue_id) {
            return Err(missing(comment.issue_id));
        }

        self.comments.write().await.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, issue_id: IssueId, limit: u32) -> AppResult<Vec<Comment>> {
        let comments = self.comments.read().await;
        let mut values: Vec<Comment> = comments
            .iter()
            .filter(|comment| comment.issue_id == issue_id)
            .cloned()
            .collect();
        values.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        values.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(values)
    }
}
