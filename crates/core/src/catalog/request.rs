//! Write payload for creating and updating items.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::normalize::clean;
use super::{CatalogError, CatalogItem, ItemStatus, TagSet};

pub const MAX_TITLE_LEN: usize = 150;
pub const MAX_SERIES_LEN: usize = 150;
pub const MAX_ISSUE_NUMBER_LEN: usize = 30;
pub const MAX_PUBLISHER_LEN: usize = 120;
pub const MAX_LANGUAGE_LEN: usize = 80;
pub const MAX_CONDITION_LEN: usize = 80;
pub const MAX_LOCATION_LEN: usize = 120;
pub const MAX_DESCRIPTION_LEN: usize = 200;
pub const MAX_IMAGE_URL_LEN: usize = 255;
pub const MAX_TAG_LEN: usize = 40;

/// Field values for an item write (create, update or one CSV row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub title: String,
    #[serde(default)]
    pub series: Option<String>,
    pub issue_number: String,
    pub publisher: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
    /// Raw tag inputs; normalized when the request is applied.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ItemRequest {
    /// Create a request with the required fields set.
    pub fn new(
        title: impl Into<String>,
        issue_number: impl Into<String>,
        publisher: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            issue_number: issue_number.into(),
            publisher: publisher.into(),
            ..Default::default()
        }
    }

    /// Trim every text field; blank optional fields become `None`.
    pub fn cleaned(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            series: clean(self.series.as_deref()),
            issue_number: self.issue_number.trim().to_string(),
            publisher: self.publisher.trim().to_string(),
            language: clean(self.language.as_deref()),
            condition: clean(self.condition.as_deref()),
            location: clean(self.location.as_deref()),
            description: clean(self.description.as_deref()),
            image_url: clean(self.image_url.as_deref()),
            status: self.status,
            tags: self.tags,
        }
    }

    /// Check field constraints, reporting every violation at once.
    ///
    /// Expects a [`cleaned`](Self::cleaned) request. Tags beyond `max_tags`
    /// are not an error; they are discarded when the request is applied.
    pub fn validate(&self, max_tags: usize) -> Result<(), CatalogError> {
        let mut problems = Vec::new();

        check_required(&mut problems, "title", &self.title, MAX_TITLE_LEN);
        check_required(
            &mut problems,
            "issue_number",
            &self.issue_number,
            MAX_ISSUE_NUMBER_LEN,
        );
        check_required(&mut problems, "publisher", &self.publisher, MAX_PUBLISHER_LEN);
        check_optional(&mut problems, "series", &self.series, MAX_SERIES_LEN);
        check_optional(&mut problems, "language", &self.language, MAX_LANGUAGE_LEN);
        check_optional(&mut problems, "condition", &self.condition, MAX_CONDITION_LEN);
        check_optional(&mut problems, "location", &self.location, MAX_LOCATION_LEN);
        check_optional(
            &mut problems,
            "description",
            &self.description,
            MAX_DESCRIPTION_LEN,
        );
        check_optional(&mut problems, "image_url", &self.image_url, MAX_IMAGE_URL_LEN);

        for tag in TagSet::from_raw(&self.tags, max_tags).iter() {
            if tag.chars().count() > MAX_TAG_LEN {
                problems.push(format!("tag '{}' exceeds {} characters", tag, MAX_TAG_LEN));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(problems.join("; ")))
        }
    }

    /// Clean, validate and turn the request into a new, unsaved item.
    pub fn into_item(self, max_tags: usize) -> Result<CatalogItem, CatalogError> {
        let request = self.cleaned();
        request.validate(max_tags)?;

        let now = Utc::now();
        Ok(CatalogItem {
            id: None,
            tags: TagSet::from_raw(&request.tags, max_tags),
            title: request.title,
            series: request.series,
            issue_number: request.issue_number,
            publisher: request.publisher,
            language: request.language,
            condition: request.condition,
            location: request.location,
            description: request.description,
            image_url: request.image_url,
            status: request.status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Clean, validate and overwrite every editable field of `item`.
    ///
    /// Identity and creation time are kept. On error `item` is unchanged.
    pub fn apply_to(self, item: &mut CatalogItem, max_tags: usize) -> Result<(), CatalogError> {
        let replacement = self.into_item(max_tags)?;
        *item = CatalogItem {
            id: item.id,
            created_at: item.created_at,
            ..replacement
        };
        Ok(())
    }
}

fn check_required(problems: &mut Vec<String>, field: &str, value: &str, max: usize) {
    if value.is_empty() {
        problems.push(format!("{} must not be blank", field));
    } else if value.chars().count() > max {
        problems.push(format!("{} exceeds {} characters", field, max));
    }
}

fn check_optional(problems: &mut Vec<String>, field: &str, value: &Option<String>, max: usize) {
    if let Some(value) = value {
        if value.chars().count() > max {
            problems.push(format!("{} exceeds {} characters", field, max));
        }
    }
}
