use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wereport_core::{AppError, AppResult};

use crate::parse_http_url;

/// Maximum first or last name length in characters.
pub const PROFILE_NAME_MAX_LENGTH: usize = 50;

/// Maximum biography length in characters.
pub const PROFILE_BIO_MAX_LENGTH: usize = 500;

/// Maximum profile location length in characters.
pub const PROFILE_LOCATION_MAX_LENGTH: usize = 100;

/// Public profile of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Identity provider subject.
    pub id: String,
    /// Contact email, if known.
    pub email: Option<String>,
    /// Display name supplied at sign-up.
    pub full_name: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Short biography.
    pub bio: Option<String>,
    /// Home area.
    pub location: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Administrator flag.
    pub is_admin: bool,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Creates an empty profile for a newly seen subject.
    #[must_use]
    pub fn blank(
        id: impl Into<String>,
        email: Option<String>,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            email,
            full_name: None,
            first_name: None,
            last_name: None,
            bio: None,
            location: None,
            avatar_url: None,
            is_admin,
            updated_at: now,
        }
    }
}

/// Raw profile edit as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdateInput {
    /// Profile to edit; defaults to the caller's own.
    #[serde(alias = "userId")]
    pub user_id: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Short biography.
    pub bio: Option<String>,
    /// Home area.
    pub location: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

/// Validated profile edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Validates the editable fields, rejecting an edit that changes nothing.
    ///
    /// The target `user_id` is not part of the edit.
    pub fn new(input: ProfileUpdateInput) -> AppResult<Self> {
        let update = Self {
            first_name: input
                .first_name
                .map(|name| text("first name", name, 1, PROFILE_NAME_MAX_LENGTH))
                .transpose()?,
            last_name: input
                .last_name
                .map(|name| text("last name", name, 1, PROFILE_NAME_MAX_LENGTH))
                .transpose()?,
            bio: input
                .bio
                .map(|bio| text("bio", bio, 0, PROFILE_BIO_MAX_LENGTH))
                .transpose()?,
            location: input
                .location
                .map(|location| text("location", location, 0, PROFILE_LOCATION_MAX_LENGTH))
                .transpose()?,
            avatar_url: input
                .avatar_url
                .map(|url| parse_http_url("avatar url", &url).map(String::from))
                .transpose()?,
        };

        if update == Self::default() {
            return Err(AppError::Validation(
                "profile update must change at least one field".to_owned(),
            ));
        }

        Ok(update)
    }

    /// Applies the edit and stamps the modification time.
    pub fn apply(self, profile: &mut Profile, now: DateTime<Utc>) {
        if self.first_name.is_some() {
            profile.first_name = self.first_name;
        }
        if self.last_name.is_some() {
            profile.last_name = self.last_name;
        }
        if self.bio.is_some() {
            profile.bio = self.bio;
        }
        if self.location.is_some() {
            profile.location = self.location;
        }
        if self.avatar_url.is_some() {
            profile.avatar_url = self.avatar_url;
        }
        profile.updated_at = now;
    }
}

fn text(field: &str, value: String, min: usize, max: usize) -> AppResult<String> {
    let value = value.trim().to_owned();
    let length = value.chars().count();
    if length < min || length > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }

    Ok(value)
}
