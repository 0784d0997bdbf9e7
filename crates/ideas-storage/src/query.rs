//! Filtering, sorting and paging over the idea collection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use ideas_model::{
    BusinessModel, Category, Idea, IdeaStatus, InvestmentRange, MarketSize, TimeToStart, UserId,
};

pub const DEFAULT_PER_PAGE: usize = 12;
pub const MAX_PER_PAGE: usize = 100;

/// Conjunction of optional predicates; an empty filter matches every idea.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdeaFilter {
    pub is_static_idea: Option<bool>,
    pub category: Option<Category>,
    pub investment_range: Option<InvestmentRange>,
    pub time_to_start: Option<TimeToStart>,
    pub market_size: Option<MarketSize>,
    pub business_model: Option<BusinessModel>,
    pub status: Option<IdeaStatus>,
    pub featured: Option<bool>,
    pub uploaded_by: Option<UserId>,
    /// Case-insensitive substring over title, description and tags.
    pub search: Option<String>,
}

impl IdeaFilter {
    /// Everything the migration pipeline owns.
    pub fn static_ideas() -> Self {
        Self {
            is_static_idea: Some(true),
            ..Default::default()
        }
    }

    pub fn matches(&self, idea: &Idea) -> bool {
        let c = &idea.content;
        fn eq<T: PartialEq>(want: &Option<T>, have: &T) -> bool {
            want.as_ref().map_or(true, |w| w == have)
        }

        eq(&self.is_static_idea, &c.is_static_idea)
            && eq(&self.category, &c.category)
            && eq(&self.investment_range, &c.investment_range)
            && eq(&self.time_to_start, &c.time_to_start)
            && eq(&self.market_size, &c.market_size)
            && eq(&self.business_model, &c.business_model)
            && eq(&self.status, &c.status)
            && eq(&self.featured, &c.featured)
            && eq(&self.uploaded_by, &c.uploaded_by)
            && self.matches_search(idea)
    }

    fn matches_search(&self, idea: &Idea) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim) else {
            return true;
        };
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        let c = &idea.content;
        c.title.to_lowercase().contains(&needle)
            || c.description.to_lowercase().contains(&needle)
            || c.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    MostViewed,
    MostLiked,
    Title,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "newest" | "latest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "most_viewed" | "views" | "popular" => Ok(Self::MostViewed),
            "most_liked" | "likes" => Ok(Self::MostLiked),
            "title" | "alphabetical" => Ok(Self::Title),
            other => Err(format!(
                "unknown sort `{other}` (expected newest|oldest|most_viewed|most_liked|title)"
            )),
        }
    }
}

impl SortOrder {
    fn compare(self, a: &Idea, b: &Idea) -> Ordering {
        match self {
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::Oldest => a.created_at.cmp(&b.created_at),
            SortOrder::MostViewed => b.content.views.cmp(&a.content.views),
            SortOrder::MostLiked => b.content.likes.cmp(&a.content.likes),
            SortOrder::Title => a
                .content
                .title
                .to_lowercase()
                .cmp(&b.content.title.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdeaQuery {
    #[serde(flatten)]
    pub filter: IdeaFilter,
    pub sort: SortOrder,
    /// 1-based; 0 is read as 1.
    pub page: usize,
    pub per_page: usize,
}

impl Default for IdeaQuery {
    fn default() -> Self {
        Self {
            filter: IdeaFilter::default(),
            sort: SortOrder::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl IdeaQuery {
    pub fn effective_page(&self) -> usize {
        self.page.max(1)
    }

    pub fn effective_per_page(&self) -> usize {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Filter, stable-sort and slice `ideas` (given in insertion order).
pub fn run_query<'a>(ideas: impl IntoIterator<Item = &'a Idea>, query: &IdeaQuery) -> Page<Idea> {
    let mut matched: Vec<&Idea> = ideas
        .into_iter()
        .filter(|idea| query.filter.matches(idea))
        .collect();
    matched.sort_by(|a, b| query.sort.compare(a, b));

    let page = query.effective_page();
    let per_page = query.effective_per_page();
    let total = matched.len();
    let total_pages = total.div_ceil(per_page);

    let items = matched
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .cloned()
        .collect();

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}
