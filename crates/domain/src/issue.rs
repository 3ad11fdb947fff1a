use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wereport_core::{AppError, AppResult, NonEmptyString};

use crate::parse_http_url;

/// Maximum issue title length in characters.
pub const ISSUE_TITLE_MAX_LENGTH: usize = 200;

/// Maximum issue description length in characters.
pub const ISSUE_DESCRIPTION_MAX_LENGTH: usize = 5000;

/// Minimum location text length in characters.
pub const ISSUE_LOCATION_MIN_LENGTH: usize = 3;

/// Maximum number of images attached to one issue.
pub const ISSUE_MAX_IMAGES: usize = 5;

/// Minimum title length when editing an existing issue.
pub const ISSUE_EDIT_TITLE_MIN_LENGTH: usize = 10;

/// Minimum description length when editing an existing issue.
pub const ISSUE_EDIT_DESCRIPTION_MIN_LENGTH: usize = 20;

/// Maximum length of the assigned authority name.
pub const ISSUE_AUTHORITY_MAX_LENGTH: usize = 200;

/// Unique identifier for a reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(Uuid);

impl IssueId {
    /// Creates a new random issue identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an issue identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses an issue identifier from its textual UUID form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid issue id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for IssueId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Civic area an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Roads, bridges, street lights and similar.
    Infrastructure,
    /// Waste collection, drainage and water.
    Sanitation,
    /// Public safety hazards.
    Safety,
    /// Pollution, green spaces and wildlife.
    Environment,
    /// Clinics and public health.
    Healthcare,
    /// Schools and libraries.
    Education,
    /// Anything else.
    Other,
}

impl IssueCategory {
    /// Every category in display order.
    pub const ALL: [Self; 7] = [
        Self::Infrastructure,
        Self::Sanitation,
        Self::Safety,
        Self::Environment,
        Self::Healthcare,
        Self::Education,
        Self::Other,
    ];

    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Infrastructure => "infrastructure",
            Self::Sanitation => "sanitation",
            Self::Safety => "safety",
            Self::Environment => "environment",
            Self::Healthcare => "healthcare",
            Self::Education => "education",
            Self::Other => "other",
        }
    }

    /// Parses a storage string into a category.
    pub fn parse(value: &str) -> AppResult<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown issue category '{value}'")))
    }
}

impl FromStr for IssueCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Moderation lifecycle of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    /// Awaiting moderation.
    Pending,
    /// Approved and being worked on.
    InProgress,
    /// Fixed.
    Resolved,
    /// Rejected by a moderator.
    Rejected,
}

impl IssueStatus {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a storage string into a status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown issue status '{value}'"
            ))),
        }
    }
}

impl FromStr for IssueStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Reporter-assessed severity from 1 (minor) to 5 (critical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Severity(u8);

impl Severity {
    /// Lowest accepted severity.
    pub const MIN: u8 = 1;
    /// Highest accepted severity.
    pub const MAX: u8 = 5;

    /// Creates a validated severity.
    pub fn new(value: i64) -> AppResult<Self> {
        u8::try_from(value)
            .ok()
            .filter(|value| (Self::MIN..=Self::MAX).contains(value))
            .map(Self)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "severity must be between {} and {}",
                    Self::MIN,
                    Self::MAX
                ))
            })
    }

    /// Returns the numeric severity.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self(3)
    }
}

/// Validated WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    /// Creates coordinates after checking latitude and longitude ranges.
    pub fn new(lat: f64, lng: f64) -> AppResult<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::Validation(
                "latitude must be between -90 and 90".to_owned(),
            ));
        }

        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::Validation(
                "longitude must be between -180 and 180".to_owned(),
            ));
        }

        Ok(Self { lat, lng })
    }

    /// Returns the latitude.
    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Returns the longitude.
    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// Raw issue submission as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewIssueInput {
    /// Short headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Category storage string.
    pub category: String,
    /// Optional severity; defaults to 3.
    pub severity: Option<i64>,
    /// Human-readable location.
    pub location: String,
    /// Optional latitude and longitude pair.
    pub coordinates: Option<CoordinatesInput>,
    /// Attached image URLs.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Raw coordinate pair as received from a client.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CoordinatesInput {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Validated issue submission ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    title: NonEmptyString,
    description: NonEmptyString,
    category: IssueCategory,
    severity: Severity,
    location: String,
    coordinates: Option<Coordinates>,
    image_urls: Vec<String>,
}

impl NewIssue {
    /// Validates a raw submission.
    pub fn new(input: NewIssueInput) -> AppResult<Self> {
        let title = NonEmptyString::new(input.title.trim())
            .map_err(|_| AppError::Validation("title is required".to_owned()))?;
        if title.as_str().chars().count() > ISSUE_TITLE_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "title must not exceed {ISSUE_TITLE_MAX_LENGTH} characters"
            )));
        }

        let description = NonEmptyString::new(input.description.trim())
            .map_err(|_| AppError::Validation("description is required".to_owned()))?;
        if description.as_str().chars().count() > ISSUE_DESCRIPTION_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "description must not exceed {ISSUE_DESCRIPTION_MAX_LENGTH} characters"
            )));
        }

        let category = IssueCategory::parse(input.category.trim())?;
        let severity = input
            .severity
            .map(Severity::new)
            .transpose()?
            .unwrap_or_default();

        let location = input.location.trim().to_owned();
        if location.chars().count() < ISSUE_LOCATION_MIN_LENGTH {
            return Err(AppError::Validation(format!(
                "location must be at least {ISSUE_LOCATION_MIN_LENGTH} characters"
            )));
        }

        let coordinates = input
            .coordinates
            .map(|pair| Coordinates::new(pair.lat, pair.lng))
            .transpose()?;

        if input.image_urls.len() > ISSUE_MAX_IMAGES {
            return Err(AppError::Validation(format!(
                "at most {ISSUE_MAX_IMAGES} images are allowed"
            )));
        }
        for url in &input.image_urls {
            parse_http_url("image url", url)?;
        }

        Ok(Self {
            title,
            description,
            category,
            severity,
            location,
            coordinates,
            image_urls: input.image_urls,
        })
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> IssueCategory {
        self.category
    }

    /// Returns the severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the location text.
    #[must_use]
    pub fn location(&self) -> &str {
        self.location.as_str()
    }

    /// Returns the coordinates, if provided.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Returns the image URLs.
    #[must_use]
    pub fn image_urls(&self) -> &[String] {
        &self.image_urls
    }
}

/// Stored issue as read back from the data store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Issue identifier.
    pub id: IssueId,
    /// Subject of the reporting user.
    pub user_id: String,
    /// Short headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Category.
    pub category: IssueCategory,
    /// Severity from 1 to 5.
    pub severity: Severity,
    /// Moderation status.
    pub status: IssueStatus,
    /// Human-readable location.
    pub location: String,
    /// Optional coordinates.
    pub coordinates: Option<Coordinates>,
    /// Attached image URLs.
    pub image_urls: Vec<String>,
    /// Current upvote count.
    pub upvotes: u32,
    /// Authority the issue was routed to, if any.
    pub assigned_authority: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Builds the stored form of a freshly reported issue.
    ///
    /// New issues start pending with no upvotes.
    #[must_use]
    pub fn open(
        id: IssueId,
        user_id: impl Into<String>,
        new_issue: NewIssue,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            title: new_issue.title.into(),
            description: new_issue.description.into(),
            category: new_issue.category,
            severity: new_issue.severity,
            status: IssueStatus::Pending,
            location: new_issue.location,
            coordinates: new_issue.coordinates,
            image_urls: new_issue.image_urls,
            upvotes: 0,
            assigned_authority: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial edit of an existing issue as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IssueUpdateInput {
    /// Replacement headline.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement category storage string.
    pub category: Option<String>,
    /// Replacement severity.
    pub severity: Option<i64>,
    /// Replacement status storage string.
    pub status: Option<String>,
    /// Authority to route the issue to; blank clears it.
    pub assigned_authority: Option<String>,
}

/// Validated partial edit of an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueUpdate {
    title: Option<String>,
    description: Option<String>,
    category: Option<IssueCategory>,
    severity: Option<Severity>,
    status: Option<IssueStatus>,
    assigned_authority: Option<Option<String>>,
}

impl IssueUpdate {
    /// Validates an edit, rejecting one that changes nothing.
    pub fn new(input: IssueUpdateInput) -> AppResult<Self> {
        let title = input
            .title
            .map(|title| {
                bounded_text(
                    "title",
                    title,
                    ISSUE_EDIT_TITLE_MIN_LENGTH,
                    ISSUE_TITLE_MAX_LENGTH,
                )
            })
            .transpose()?;
        let description = input
            .description
            .map(|description| {
                bounded_text(
                    "description",
                    description,
                    ISSUE_EDIT_DESCRIPTION_MIN_LENGTH,
                    ISSUE_DESCRIPTION_MAX_LENGTH,
                )
            })
            .transpose()?;
        let category = input
            .category
            .as_deref()
            .map(|value| IssueCategory::parse(value.trim()))
            .transpose()?;
        let severity = input.severity.map(Severity::new).transpose()?;
        let status = input
            .status
            .as_deref()
            .map(|value| IssueStatus::parse(value.trim()))
            .transpose()?;

        let assigned_authority = input
            .assigned_authority
            .map(|authority| {
                let authority = authority.trim().to_owned();
                if authority.chars().count() > ISSUE_AUTHORITY_MAX_LENGTH {
                    return Err(AppError::Validation(format!(
                        "assigned authority must not exceed {ISSUE_AUTHORITY_MAX_LENGTH} characters"
                    )));
                }
                Ok((!authority.is_empty()).then_some(authority))
            })
            .transpose()?;

        let update = Self {
            title,
            description,
            category,
            severity,
            status,
            assigned_authority,
        };

        if update.is_empty() {
            return Err(AppError::Validation(
                "issue update must change at least one field".to_owned(),
            ));
        }

        Ok(update)
    }

    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.severity.is_none()
            && self.status.is_none()
            && self.assigned_authority.is_none()
    }

    /// Whether the edit changes moderation fields reserved for administrators.
    #[must_use]
    pub fn changes_moderation(&self) -> bool {
        self.status.is_some() || self.assigned_authority.is_some()
    }

    /// Applies the edit to `issue` and stamps the modification time.
    pub fn apply(self, issue: &mut Issue, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            issue.title = title;
        }
        if let Some(description) = self.description {
            issue.description = description;
        }
        if let Some(category) = self.category {
            issue.category = category;
        }
        if let Some(severity) = self.severity {
            issue.severity = severity;
        }
        if let Some(status) = self.status {
            issue.status = status;
        }
        if let Some(authority) = self.assigned_authority {
            issue.assigned_authority = authority;
        }
        issue.updated_at = now;
    }
}

fn bounded_text(field: &str, value: String, min: usize, max: usize) -> AppResult<String> {
    let value = value.trim().to_owned();
    let length = value.chars().count();
    if length < min || length > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }

    Ok(value)
}
