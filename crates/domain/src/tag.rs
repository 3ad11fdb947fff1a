use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wereport_core::{AppError, AppResult};

/// Colour assigned to tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#000000";

/// Raw tag definition as received from an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewTagInput {
    /// Display name.
    pub name: String,
    /// URL-safe slug.
    pub slug: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional `#RRGGBB` colour.
    pub color: Option<String>,
    /// Optional short icon, usually an emoji.
    pub icon: Option<String>,
}

/// Validated tag definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    name: String,
    slug: String,
    description: Option<String>,
    color: String,
    icon: Option<String>,
}

impl NewTag {
    /// Validates a raw tag definition.
    ///
    /// - name and slug are 2 to 50 characters
    /// - slug only uses lowercase ASCII letters, digits and `-`
    /// - description is at most 200 characters
    /// - colour is `#RRGGBB`, defaulting to black
    /// - icon is at most 10 characters
    pub fn new(input: NewTagInput) -> AppResult<Self> {
        let name = input.name.trim().to_owned();
        check_length("tag name", &name, 2, 50)?;

        let slug = input.slug.trim().to_owned();
        check_length("tag slug", &slug, 2, 50)?;
        if !slug
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '-')
        {
            return Err(AppError::Validation(format!(
                "tag slug '{slug}' may only contain lowercase letters, digits and '-'"
            )));
        }

        let description = normalize_optional(input.description);
        if let Some(description) = description.as_deref() {
            check_length("tag description", description, 0, 200)?;
        }

        let color = match normalize_optional(input.color) {
            Some(color) if is_hex_color(&color) => color,
            Some(color) => {
                return Err(AppError::Validation(format!(
                    "tag color '{color}' must be formatted as #RRGGBB"
                )));
            }
            None => DEFAULT_TAG_COLOR.to_owned(),
        };

        let icon = normalize_optional(input.icon);
        if let Some(icon) = icon.as_deref() {
            check_length("tag icon", icon, 0, 10)?;
        }

        Ok(Self {
            name,
            slug,
            description,
            color,
            icon,
        })
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the colour.
    #[must_use]
    pub fn color(&self) -> &str {
        self.color.as_str()
    }

    /// Returns the icon.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }
}

/// Stored tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// Tag identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// URL-safe slug.
    pub slug: String,
    /// Optional description.
    pub description: Option<String>,
    /// `#RRGGBB` colour.
    pub color: String,
    /// Optional icon.
    pub icon: Option<String>,
    /// Number of issues carrying the tag.
    pub usage_count: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

fn check_length(label: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
    let length = value.chars().count();
    if length < min || length > max {
        return Err(AppError::Validation(format!(
            "{label} must be between {min} and {max} characters"
        )));
    }

    Ok(())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|digit| digit.is_ascii_hexdigit()))
}
