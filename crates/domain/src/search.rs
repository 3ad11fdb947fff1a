use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use wereport_core::{AppError, AppResult};

use crate::{Issue, IssueCategory, IssueStatus};

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Largest page size a client may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Offset-based page request with the limit clamped to `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    offset: u32,
}

impl PageRequest {
    /// Builds a page request, clamping out-of-range values.
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit
            .unwrap_or(i64::from(DEFAULT_PAGE_LIMIT))
            .clamp(1, i64::from(MAX_PAGE_LIMIT));
        let offset = offset.unwrap_or(0).clamp(0, i64::from(u32::MAX));

        Self {
            limit: u32::try_from(limit).unwrap_or(DEFAULT_PAGE_LIMIT),
            offset: u32::try_from(offset).unwrap_or(0),
        }
    }

    /// Returns the page size.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of rows to skip.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Builds pagination metadata for a result set of `total` rows.
    #[must_use]
    pub fn paginate(&self, total: u64) -> Pagination {
        Pagination {
            limit: self.limit,
            page: self.offset / self.limit + 1,
            total,
            has_more: total > u64::from(self.offset) + u64::from(self.limit),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned with list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Page size.
    pub limit: u32,
    /// One-based page number.
    pub page: u32,
    /// Total rows matching the query.
    pub total: u64,
    /// Whether rows exist past this page.
    pub has_more: bool,
}

/// Ordering of search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSort {
    /// Most recent first.
    #[default]
    Newest,
    /// Most upvoted first, ties broken by recency.
    Upvotes,
    /// Same ordering as `Upvotes`.
    Trending,
}

impl IssueSort {
    /// Returns the query string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Upvotes => "upvotes",
            Self::Trending => "trending",
        }
    }

    /// Parses a query string value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "newest" => Ok(Self::Newest),
            "upvotes" => Ok(Self::Upvotes),
            "trending" => Ok(Self::Trending),
            _ => Err(AppError::Validation(format!("unknown sort order '{value}'"))),
        }
    }

    /// Compares two issues according to this ordering.
    #[must_use]
    pub fn compare(&self, left: &Issue, right: &Issue) -> Ordering {
        let newest_first = right.created_at.cmp(&left.created_at);
        match self {
            Self::Newest => newest_first,
            Self::Upvotes | Self::Trending => right.upvotes.cmp(&left.upvotes).then(newest_first),
        }
    }
}

/// Raw search parameters as received from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssueSearchInput {
    /// Free-text search over title and description.
    pub search: Option<String>,
    /// Category filter; `all` disables it.
    pub category: Option<String>,
    /// Status filter; `all` disables it.
    pub status: Option<String>,
    /// Sort order.
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    /// Page size.
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
}

/// Validated issue search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSearch {
    text: Option<String>,
    category: Option<IssueCategory>,
    status: Option<IssueStatus>,
    sort: IssueSort,
    page: PageRequest,
}

impl IssueSearch {
    /// Validates raw search parameters.
    pub fn new(input: IssueSearchInput) -> AppResult<Self> {
        let text = input
            .search
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        let category = parse_filter(input.category)
            .map(|value| IssueCategory::parse(&value))
            .transpose()?;
        let status = parse_filter(input.status)
            .map(|value| IssueStatus::parse(&value))
            .transpose()?;

        let sort = match input.sort_by.as_deref().map(str::trim) {
            None | Some("") => IssueSort::default(),
            Some(value) => IssueSort::parse(value)?,
        };

        Ok(Self {
            text,
            category,
            status,
            sort,
            page: PageRequest::new(input.limit, input.offset),
        })
    }

    /// Returns the trimmed search text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the category filter.
    #[must_use]
    pub fn category(&self) -> Option<IssueCategory> {
        self.category
    }

    /// Returns the status filter.
    #[must_use]
    pub fn status(&self) -> Option<IssueStatus> {
        self.status
    }

    /// Returns the sort order.
    #[must_use]
    pub fn sort(&self) -> IssueSort {
        self.sort
    }

    /// Returns the page request.
    #[must_use]
    pub fn page(&self) -> PageRequest {
        self.page
    }

    /// Returns the `ILIKE` pattern for the search text, with wildcards escaped.
    #[must_use]
    pub fn like_pattern(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(|text| format!("%{}%", escape_like_pattern(text)))
    }

    /// Returns whether an issue satisfies the text and equality filters.
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        if self.category.is_some_and(|category| category != issue.category) {
            return false;
        }

        if self.status.is_some_and(|status| status != issue.status) {
            return false;
        }

        match self.text.as_deref() {
            Some(text) => {
                let needle = text.to_lowercase();
                issue.title.to_lowercase().contains(&needle)
                    || issue.description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// Escapes `\`, `%` and `_` so user text matches literally inside `LIKE`.
#[must_use]
pub fn escape_like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }

    escaped
}

fn parse_filter(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty() && value != "all")
}
