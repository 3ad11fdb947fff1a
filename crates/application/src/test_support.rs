use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use wereport_core::{AppError, AppResult, Principal};
use wereport_domain::{
    Comment, Issue, IssueId, IssueSearch, IssueSort, IssueStatus, NewIssue, NewIssueInput,
    Notification, NotificationId, PageRequest, Profile,
};

use crate::{
    Clock, CommentRepository, IssuePage, IssueRepository, NotificationRepository,
    ProfileRepository, RateLimitDecision, RateLimitKey, RateLimitStore, UpvoteOutcome,
};

pub(crate) fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0)
        .single()
        .unwrap_or_default()
}

/// Clock that only moves when advanced.
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }
}

/// Fixed-window store that also records every key it saw.
#[derive(Default)]
pub(crate) struct FakeRateLimitStore {
    windows: Mutex<HashMap<String, (u32, DateTime<Utc>)>>,
    pub(crate) seen_keys: Mutex<Vec<String>>,
    pub(crate) fail: bool,
}

impl FakeRateLimitStore {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn seen_keys(&self) -> Vec<String> {
        self.seen_keys
            .lock()
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RateLimitStore for FakeRateLimitStore {
    async fn hit(&self, key: &RateLimitKey, now: DateTime<Utc>) -> AppResult<RateLimitDecision> {
        if self.fail {
            return Err(AppError::Upstream("rate limit store offline".to_owned()));
        }

        if let Ok(mut keys) = self.seen_keys.lock() {
            keys.push(key.to_string());
        }

        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::Internal("fake store poisoned".to_owned()))?;
        let limit = key.rule().max_requests();
        let entry = windows
            .entry(key.to_string())
            .or_insert((0, now + key.rule().window()));

        if now >= entry.1 {
            *entry = (0, now + key.rule().window());
        }

        if entry.0 >= limit {
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                limit,
                reset_at: entry.1,
            });
        }

        entry.0 += 1;
        Ok(RateLimitDecision {
            allowed: true,
            remaining: limit - entry.0,
            limit,
            reset_at: entry.1,
        })
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::Internal("fake store poisoned".to_owned()))?;
        let before = windows.len();
        windows.retain(|_, (_, reset_at)| *reset_at > now);
        Ok(u64::try_from(before - windows.len()).unwrap_or_default())
    }
}

/// Issue and comment repository that keeps rows in memory and counts writes.
#[derive(Default)]
pub(crate) struct FakeIssueRepository {
    pub(crate) issues: Mutex<Vec<Issue>>,
    pub(crate) upvotes: Mutex<Vec<(IssueId, String)>>,
    pub(crate) comments: Mutex<Vec<Comment>>,
    pub(crate) writes: Mutex<usize>,
}

impl FakeIssueRepository {
    pub(crate) fn with_issues(issues: Vec<Issue>) -> Self {
        Self {
            issues: Mutex::new(issues),
            ..Self::default()
        }
    }

    pub(crate) fn write_count(&self) -> usize {
        self.writes.lock().map(|writes| *writes).unwrap_or_default()
    }

    fn record_write(&self) {
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
    }

    fn snapshot(&self) -> Vec<Issue> {
        self.issues
            .lock()
            .map(|issues| issues.clone())
            .unwrap_or_default()
    }

    fn adjust_upvotes(&self, issue_id: IssueId, delta: i64) -> AppResult<u32> {
        let mut issues = self
            .issues
            .lock()
            .map_err(|_| AppError::Internal("fake repository poisoned".to_owned()))?;
        let issue = issues
            .iter_mut()
            .find(|issue| issue.id == issue_id)
            .ok_or_else(|| AppError::NotFound(format!("issue '{issue_id}' does not exist")))?;
        let next = (i64::from(issue.upvotes) + delta).max(0);
        issue.upvotes = u32::try_from(next).unwrap_or_default();
        Ok(issue.upvotes)
    }
}

#[async_trait]
impl IssueRepository for FakeIssueRepository {
    async fn insert_issue(&self, issue: Issue) -> AppResult<Issue> {
        self.record_write();
        if let Ok(mut issues) = self.issues.lock() {
            issues.push(issue.clone());
        }
        Ok(issue)
    }

    async fn find_issue(&self, issue_id: IssueId) -> AppResult<Option<Issue>> {
        Ok(self
            .snapshot()
            .into_iter()
            .find(|issue| issue.id == issue_id))
    }

    async fn list_issues(&self, page: PageRequest) -> AppResult<IssuePage> {
        let mut issues = self.snapshot();
        issues.sort_by(|left, right| IssueSort::Newest.compare(left, right));
        let total = u64::try_from(issues.len()).unwrap_or_default();
        Ok(IssuePage {
            issues: paginate(issues, page),
            total,
        })
    }

    async fn search_issues(&self, search: &IssueSearch) -> AppResult<IssuePage> {
        let mut issues: Vec<Issue> = self
            .snapshot()
            .into_iter()
            .filter(|issue| search.matches(issue))
            .collect();
        issues.sort_by(|left, right| search.sort().compare(left, right));
        let total = u64::try_from(issues.len()).unwrap_or_default();
        Ok(IssuePage {
            issues: paginate(issues, search.page()),
            total,
        })
    }

    async fn list_issues_by_status(
        &self,
        status: IssueStatus,
        limit: u32,
    ) -> AppResult<Vec<Issue>> {
        let mut issues: Vec<Issue> = self
            .snapshot()
            .into_iter()
            .filter(|issue| issue.status == status)
            .collect();
        issues.sort_by(|left, right| IssueSort::Upvotes.compare(left, right));
        issues.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(issues)
    }

    async fn list_most_upvoted(&self, limit: u32) -> AppResult<Vec<Issue>> {
        let mut issues = self.snapshot();
        issues.sort_by(|left, right| IssueSort::Upvotes.compare(left, right));
        issues.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(issues)
    }

    async fn add_upvote(&self, issue_id: IssueId, user_id: &str) -> AppResult<UpvoteOutcome> {
        self.record_write();
        let vote = (issue_id, user_id.to_owned());
        let already = self
            .upvotes
            .lock()
            .map(|upvotes| upvotes.contains(&vote))
            .unwrap_or_default();
        if already {
            let upvotes = self.adjust_upvotes(issue_id, 0)?;
            return Ok(UpvoteOutcome {
                changed: false,
                upvotes,
            });
        }

        let upvotes = self.adjust_upvotes(issue_id, 1)?;
        if let Ok(mut votes) = self.upvotes.lock() {
            votes.push(vote);
        }
        Ok(UpvoteOutcome {
            changed: true,
            upvotes,
        })
    }

    async fn remove_upvote(&self, issue_id: IssueId, user_id: &str) -> AppResult<UpvoteOutcome> {
        self.record_write();
        let removed = self
            .upvotes
            .lock()
            .map(|mut upvotes| {
                let before = upvotes.len();
                upvotes.retain(|(id, user)| !(*id == issue_id && user == user_id));
                before != upvotes.len()
            })
            .unwrap_or_default();
        let upvotes = self.adjust_upvotes(issue_id, if removed { -1 } else { 0 })?;
        Ok(UpvoteOutcome {
            changed: removed,
            upvotes,
        })
    }

    async fn update_status(
        &self,
        issue_ids: &[IssueId],
        status: IssueStatus,
        updated_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        self.record_write();
        let mut affected = 0;
        if let Ok(mut issues) = self.issues.lock() {
            for issue in issues.iter_mut().filter(|issue| issue_ids.contains(&issue.id)) {
                issue.status = status;
                issue.updated_at = updated_at;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete_issues(&self, issue_ids: &[IssueId]) -> AppResult<u64> {
        self.record_write();
        let mut affected = 0;
        if let Ok(mut issues) = self.issues.lock() {
            let before = issues.len();
            issues.retain(|issue| !issue_ids.contains(&issue.id));
            affected = u64::try_from(before - issues.len()).unwrap_or_default();
        }
        Ok(affected)
    }

    async fn update_issue(&self, issue: &Issue) -> AppResult<Option<Issue>> {
        self.record_write();
        let mut issues = self
            .issues
            .lock()
            .map_err(|_| AppError::Internal("fake repository poisoned".to_owned()))?;
        Ok(issues
            .iter_mut()
            .find(|stored| stored.id == issue.id)
            .map(|stored| {
                *stored = issue.clone();
                stored.clone()
            }))
    }

    async fn count_by_status(&self) -> AppResult<Vec<(IssueStatus, u64)>> {
        Ok(self
            .snapshot()
            .into_iter()
            .map(|issue| (issue.status, 1))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for FakeIssueRepository {
    async fn insert_comment(&self, comment: Comment) -> AppResult<Comment> {
        self.record_write();
        if let Ok(mut comments) = self.comments.lock() {
            comments.push(comment.clone());
        }
        Ok(comment)
    }

    async fn list_comments(&self, issue_id: IssueId, limit: u32) -> AppResult<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .comments
            .lock()
            .map(|comments| comments.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|comment| comment.issue_id == issue_id)
            .collect();
        comments.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        comments.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(comments)
    }
}

fn paginate(issues: Vec<Issue>, page: PageRequest) -> Vec<Issue> {
    issues
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
        .collect()
}

/// Notification repository backed by a vector.
#[derive(Default)]
pub(crate) struct FakeNotificationRepository {
    pub(crate) notifications: Mutex<Vec<Notification>>,
}

impl FakeNotificationRepository {
    pub(crate) fn stored(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|notifications| notifications.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationRepository for FakeNotificationRepository {
    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
    ) -> AppResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .stored()
            .into_iter()
            .filter(|notification| notification.user_id == user_id)
            .filter(|notification| !unread_only || !notification.read)
            .collect();
        notifications.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        notifications.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(notifications)
    }

    async fn find_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>> {
        Ok(self
            .stored()
            .into_iter()
            .find(|notification| notification.id == notification_id))
    }

    async fn insert_notification(&self, notification: Notification) -> AppResult<Notification> {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification.clone());
        }
        Ok(notification)
    }

    async fn set_read(
        &self,
        notification_id: NotificationId,
        read: bool,
    ) -> AppResult<Option<Notification>> {
        let mut notifications = self
            .notifications
            .lock()
            .map_err(|_| AppError::Internal("fake repository poisoned".to_owned()))?;
        Ok(notifications
            .iter_mut()
            .find(|notification| notification.id == notification_id)
            .map(|notification| {
                notification.read = read;
                notification.clone()
            }))
    }

    async fn delete_notification(&self, notification_id: NotificationId) -> AppResult<bool> {
        let mut notifications = self
            .notifications
            .lock()
            .map_err(|_| AppError::Internal("fake repository poisoned".to_owned()))?;
        let before = notifications.len();
        notifications.retain(|notification| notification.id != notification_id);
        Ok(before != notifications.len())
    }
}

/// Profile repository backed by a map keyed by subject.
#[derive(Default)]
pub(crate) struct FakeProfileRepository {
    pub(crate) profiles: Mutex<HashMap<String, Profile>>,
}

impl FakeProfileRepository {
    pub(crate) fn with_profiles(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: Mutex::new(
                profiles
                    .into_iter()
                    .map(|profile| (profile.id.clone(), profile))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl ProfileRepository for FakeProfileRepository {
    async fn find_profile(&self, user_id: &str) -> AppResult<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .map_err(|_| AppError::Internal("fake repository poisoned".to_owned()))?
            .get(user_id)
            .cloned())
    }

    async fn update_profile(&self, profile: &Profile) -> AppResult<Option<Profile>> {
        let mut profiles = self
            .profiles
            .lock()
            .map_err(|_| AppError::Internal("fake repository poisoned".to_owned()))?;
        Ok(profiles.get_mut(&profile.id).map(|stored| {
            *stored = profile.clone();
            stored.clone()
        }))
    }
}

pub(crate) fn sample_issue(title: &str, upvotes: u32, severity: i64, status: IssueStatus) -> Issue {
    let new_issue = NewIssue::new(NewIssueInput {
        title: title.to_owned(),
        description: "Reported during a neighbourhood walk".to_owned(),
        category: "infrastructure".to_owned(),
        severity: Some(severity),
        location: "Wilkinson Road".to_owned(),
        ..NewIssueInput::default()
    })
    .unwrap_or_else(|_| panic!("test"));

    let mut issue = Issue::open(IssueId::new(), "reporter-1", new_issue, start_time());
    issue.upvotes = upvotes;
    issue.status = status;
    issue
}

pub(crate) fn citizen(subject: &str) -> Principal {
    Principal::new(subject, None, false)
}

pub(crate) fn administrator(subject: &str) -> Principal {
    Principal::new(subject, Some(format!("{subject}@wereport.test")), true)
}
