//! The canonical idea document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::labels::{BusinessModel, Category, IdeaStatus, InvestmentRange, MarketSize, TimeToStart};
use crate::validate::{self, ValidationError};
use crate::{IdeaId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Every writable field of an idea.
///
/// This is what submissions and the legacy transformer produce; the store
/// wraps it into an [`Idea`] with an id, engagement state and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIdea {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<u64>,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub investment_range: InvestmentRange,
    pub time_to_start: TimeToStart,
    pub business_model: BusinessModel,
    pub market_size: MarketSize,
    pub target_audience: String,
    pub competitive_advantage: String,
    pub challenges: String,
    pub key_features: Vec<String>,
    pub revenue_streams: Vec<String>,
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub contact: Contact,
    #[serde(default)]
    pub status: IdeaStatus,
    #[serde(default)]
    pub is_static_idea: bool,
    #[serde(default)]
    pub featured: bool,
    pub uploaded_by: UserId,
    pub uploaded_by_email: String,
    pub uploaded_by_name: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
}

impl NewIdea {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::required_text("title", &self.title, validate::TITLE_MAX)?;
        validate::required_text("description", &self.description, validate::DESCRIPTION_MAX)?;
        validate::max_len(
            "targetAudience",
            &self.target_audience,
            validate::TARGET_AUDIENCE_MAX,
        )?;
        validate::max_len(
            "competitiveAdvantage",
            &self.competitive_advantage,
            validate::COMPETITIVE_ADVANTAGE_MAX,
        )?;
        validate::max_len("challenges", &self.challenges, validate::CHALLENGES_MAX)?;
        validate::cardinality("keyFeatures", &self.key_features, validate::KEY_FEATURES)?;
        validate::cardinality(
            "revenueStreams",
            &self.revenue_streams,
            validate::REVENUE_STREAMS,
        )?;
        validate::cardinality(
            "requiredSkills",
            &self.required_skills,
            validate::REQUIRED_SKILLS,
        )?;
        validate::email("contact.email", &self.contact.email)?;
        validate::phone("contact.phone", self.contact.phone.as_deref())?;
        Ok(())
    }
}

/// A stored idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: IdeaId,
    #[serde(flatten)]
    pub content: NewIdea,
    #[serde(default)]
    pub liked_by: BTreeSet<UserId>,
    #[serde(default)]
    pub saved_by: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    pub fn new(id: IdeaId, content: NewIdea, now: DateTime<Utc>) -> Self {
        Self {
            id,
            content,
            liked_by: BTreeSet::new(),
            saved_by: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.content.validate()
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.content.uploaded_by == user
    }
}

/// Partial update of an idea; `None` leaves the field untouched.
///
/// Ownership, provenance and engagement counters are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdeaPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub investment_range: Option<InvestmentRange>,
    pub time_to_start: Option<TimeToStart>,
    pub business_model: Option<BusinessModel>,
    pub market_size: Option<MarketSize>,
    pub target_audience: Option<String>,
    pub competitive_advantage: Option<String>,
    pub challenges: Option<String>,
    pub key_features: Option<Vec<String>>,
    pub revenue_streams: Option<Vec<String>>,
    pub required_skills: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
    pub contact: Option<Contact>,
    pub status: Option<IdeaStatus>,
    pub featured: Option<bool>,
}

impl IdeaPatch {
    pub fn is_empty(&self) -> bool {
        *self == IdeaPatch::default()
    }

    pub fn apply_to(self, idea: &mut NewIdea) {
        let IdeaPatch {
            title,
            description,
            category,
            investment_range,
            time_to_start,
            business_model,
            market_size,
            target_audience,
            competitive_advantage,
            challenges,
            key_features,
            revenue_streams,
            required_skills,
            tags,
            image,
            contact,
            status,
            featured,
        } = self;

        macro_rules! set {
            ($($field:ident),+) => {
                $(if let Some(v) = $field { idea.$field = v; })+
            };
        }
        set!(
            title,
            description,
            category,
            investment_range,
            time_to_start,
            business_model,
            market_size,
            target_audience,
            competitive_advantage,
            challenges,
            key_features,
            revenue_streams,
            required_skills,
            tags,
            contact,
            status,
            featured
        );
        if image.is_some() {
            idea.image = image;
        }
    }
}
