use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::labels::ReviewStatus;
use crate::validate::{self, ValidationError};
use crate::{IdeaId, ReviewId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub idea_id: IdeaId,
    pub user_id: UserId,
    pub user_name: String,
    pub comment: String,
    pub rating: u8,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::required_text("comment", &self.comment, validate::REVIEW_COMMENT_MAX)?;
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::Rating(self.rating));
        }
        Ok(())
    }
}

/// A review; only `status` and `helpful` change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    #[serde(flatten)]
    pub content: NewReview,
    #[serde(default)]
    pub helpful: u32,
    #[serde(default)]
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(id: ReviewId, content: NewReview, now: DateTime<Utc>) -> Self {
        Self {
            id,
            content,
            helpful: 0,
            status: ReviewStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.status == ReviewStatus::Approved
    }
}
