//! Legacy record → canonical `NewIdea`.
//!
//! Missing fields are backfilled with fixed defaults. Nothing here checks
//! lengths or list cardinalities; the store rejects a record that does not
//! fit (an idea without tags ends up with no key features, for instance).

use serde::Serialize;
use uuid::Uuid;

use ideas_model::{BusinessModel, Contact, IdeaStatus, NewIdea, UserId};

use crate::legacy::{DetailedIdea, LegacyIdea, SummaryIdea};
use crate::normalize::{
    normalize_business_model, normalize_category, normalize_investment, normalize_market_size,
    normalize_timeline,
};

/// Owner recorded on every migrated idea.
pub const SYSTEM_USER_ID: UserId = Uuid::from_u128(0x1000_0000_0000_4000_8000_1de4_5000_0001);
pub const SYSTEM_USER_EMAIL: &str = "admin@10000ideas.com";
pub const SYSTEM_USER_NAME: &str = "10000 Ideas Team";
pub const CONTACT_EMAIL: &str = "ideas@10000ideas.com";

pub const DEFAULT_TARGET_AUDIENCE: &str = "General consumers and businesses";
pub const DEFAULT_COMPETITIVE_ADVANTAGE: &str = "Innovative approach to an underserved market need";
pub const DEFAULT_CHALLENGES: &str = "Market competition and customer acquisition";
pub const DEFAULT_REVENUE_STREAMS: &[&str] = &["Direct sales"];
pub const DEFAULT_REQUIRED_SKILLS: &[&str] = &["Business Strategy", "Marketing", "Operations"];

const MAX_KEY_FEATURES: usize = 5;

/// Which normalizers fell back to their default for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fallbacks {
    pub category: bool,
    pub investment_range: bool,
    pub time_to_start: bool,
    pub market_size: bool,
    pub business_model: bool,
}

/// Running totals of [`Fallbacks`] over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackCounts {
    pub category: usize,
    pub investment_range: usize,
    pub time_to_start: usize,
    pub market_size: usize,
    pub business_model: usize,
}

impl FallbackCounts {
    pub fn record(&mut self, f: Fallbacks) {
        self.category += usize::from(f.category);
        self.investment_range += usize::from(f.investment_range);
        self.time_to_start += usize::from(f.time_to_start);
        self.market_size += usize::from(f.market_size);
        self.business_model += usize::from(f.business_model);
    }

    pub fn total(&self) -> usize {
        self.category + self.investment_range + self.time_to_start + self.market_size + self.business_model
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub idea: NewIdea,
    pub fallbacks: Fallbacks,
}

pub fn transform(legacy: &LegacyIdea) -> Transformed {
    match legacy {
        LegacyIdea::Summary(s) => from_summary(s),
        LegacyIdea::Detailed(d) => from_detailed(d),
    }
}

fn from_summary(s: &SummaryIdea) -> Transformed {
    let category = normalize_category(s.category.as_deref());
    let investment = normalize_investment(s.investment_amount.as_deref());
    let timeline = normalize_timeline(s.time_to_market.as_deref());
    let market_size = normalize_market_size(None);

    let idea = NewIdea {
        original_id: s.id,
        title: s.title.trim().to_string(),
        description: text_or_empty(s.description.as_deref()),
        category: category.value,
        investment_range: investment.value,
        time_to_start: timeline.value,
        business_model: BusinessModel::B2C,
        market_size: market_size.value,
        target_audience: DEFAULT_TARGET_AUDIENCE.to_string(),
        competitive_advantage: DEFAULT_COMPETITIVE_ADVANTAGE.to_string(),
        challenges: DEFAULT_CHALLENGES.to_string(),
        key_features: key_features(&s.tags),
        revenue_streams: owned(DEFAULT_REVENUE_STREAMS),
        required_skills: owned(DEFAULT_REQUIRED_SKILLS),
        tags: s.tags.clone(),
        image: s.image.clone(),
        contact: placeholder_contact(),
        status: IdeaStatus::Published,
        is_static_idea: true,
        featured: false,
        uploaded_by: SYSTEM_USER_ID,
        uploaded_by_email: SYSTEM_USER_EMAIL.to_string(),
        uploaded_by_name: SYSTEM_USER_NAME.to_string(),
        views: 0,
        likes: 0,
    };

    Transformed {
        idea,
        fallbacks: Fallbacks {
            category: category.fallback,
            investment_range: investment.fallback,
            time_to_start: timeline.fallback,
            market_size: market_size.fallback,
            business_model: false,
        },
    }
}

fn from_detailed(d: &DetailedIdea) -> Transformed {
    let market = d.market_analysis.clone().unwrap_or_default();
    let category = normalize_category(d.category.as_deref());
    let investment = normalize_investment(d.investment.as_deref());
    let timeline = normalize_timeline(d.time_to_market.as_deref());
    let market_size = normalize_market_size(market.market_size.as_deref());
    let business_model = normalize_business_model(d.business_model.as_deref());

    let revenue_streams = d
        .revenue_streams
        .as_ref()
        .map(|r| r.to_list())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| owned(DEFAULT_REVENUE_STREAMS));
    let required_skills = d
        .required_skills
        .as_ref()
        .map(|r| r.to_list())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| owned(DEFAULT_REQUIRED_SKILLS));
    let challenges = d
        .challenges
        .as_ref()
        .map(|c| c.joined())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CHALLENGES.to_string());

    let idea = NewIdea {
        original_id: d.id,
        title: d.title.trim().to_string(),
        description: text_or_empty(d.detailed_description.as_deref().or(d.description.as_deref())),
        category: category.value,
        investment_range: investment.value,
        time_to_start: timeline.value,
        business_model: business_model.value,
        market_size: market_size.value,
        target_audience: text_or(market.target_audience.as_deref(), DEFAULT_TARGET_AUDIENCE),
        competitive_advantage: text_or(
            d.competitive_advantage.as_deref(),
            DEFAULT_COMPETITIVE_ADVANTAGE,
        ),
        challenges,
        key_features: key_features(&d.tags),
        revenue_streams,
        required_skills,
        tags: d.tags.clone(),
        image: d.image.clone(),
        contact: placeholder_contact(),
        status: IdeaStatus::Published,
        is_static_idea: true,
        featured: false,
        uploaded_by: SYSTEM_USER_ID,
        uploaded_by_email: SYSTEM_USER_EMAIL.to_string(),
        uploaded_by_name: SYSTEM_USER_NAME.to_string(),
        views: d.views.unwrap_or(0),
        likes: d.likes.unwrap_or(0),
    };

    Transformed {
        idea,
        fallbacks: Fallbacks {
            category: category.fallback,
            investment_range: investment.fallback,
            time_to_start: timeline.fallback,
            market_size: market_size.fallback,
            business_model: business_model.fallback,
        },
    }
}

fn placeholder_contact() -> Contact {
    Contact {
        email: CONTACT_EMAIL.to_string(),
        phone: None,
    }
}

fn key_features(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .take(MAX_KEY_FEATURES)
        .map(str::to_string)
        .collect()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn text_or_empty(text: Option<&str>) -> String {
    text.map(str::trim).unwrap_or_default().to_string()
}

fn text_or(text: Option<&str>, default: &str) -> String {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(default)
        .to_string()
}
