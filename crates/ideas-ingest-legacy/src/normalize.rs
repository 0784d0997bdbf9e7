//! Free text to closed label sets.
//!
//! Each normalizer is an ordered rule table. Input is lower-cased and the
//! first rule with a keyword occurring in it wins, so order matters wherever
//! keyword sets overlap. Market-size keywords must be whole words. Crore
//! amounts and year counts are read as numbers when no keyword claims them.
//! Input that already is one of the labels passes through unchanged.
//!
//! Absent, blank and unrecognized input all map to a per-normalizer default:
//!
//! | normalizer     | default          |
//! |----------------|------------------|
//! | category       | `Other`          |
//! | investment     | `Under ₹1 Lakh`  |
//! | timeline       | `3-6 months`     |
//! | market size    | `Global`         |
//! | business model | `B2C`            |
//!
//! The defaults are not uniform. [`Normalized::fallback`] records when one
//! was used so callers can report it.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use ideas_model::{BusinessModel, Category, InvestmentRange, MarketSize, TimeToStart};

/// A normalized value and whether it came from the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized<T> {
    pub value: T,
    pub fallback: bool,
}

impl<T> Normalized<T> {
    fn matched(value: T) -> Self {
        Self {
            value,
            fallback: false,
        }
    }

    fn default_to(value: T) -> Self {
        Self {
            value,
            fallback: true,
        }
    }
}

/// How a keyword has to sit in the input to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Matching {
    /// Anywhere, including inside longer words ("healthtech" has "health").
    Substring,
    /// Keywords that start with a digit must not continue a number, so
    /// "5l" matches "₹5l" but not "15l" or "2.5l".
    Amount,
    /// Whole words only: "city" does not match "electricity".
    Word,
}

struct Rule<T> {
    keywords: &'static [&'static str],
    label: T,
}

const fn rule<T>(keywords: &'static [&'static str], label: T) -> Rule<T> {
    Rule { keywords, label }
}

/// Shared front half of every normalizer: blank input takes the default,
/// an exact label passes through, anything else goes to `find` lower-cased.
fn classify<T, F>(input: Option<&str>, default: T, find: F) -> Normalized<T>
where
    T: FromStr,
    F: FnOnce(&str) -> Option<T>,
{
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Normalized::default_to(default);
    };
    if let Ok(exact) = raw.parse::<T>() {
        return Normalized::matched(exact);
    }

    match find(&raw.to_lowercase()) {
        Some(value) => Normalized::matched(value),
        None => Normalized::default_to(default),
    }
}

fn first_match<T: Copy>(text: &str, rules: &[Rule<T>], matching: Matching) -> Option<T> {
    rules
        .iter()
        .find(|r| r.keywords.iter().any(|k| contains(text, k, matching)))
        .map(|r| r.label)
}

fn contains(text: &str, keyword: &str, matching: Matching) -> bool {
    let continues_number = |c: char| c.is_ascii_digit() || c == '.';
    match matching {
        Matching::Substring => text.contains(keyword),
        Matching::Amount if !keyword.starts_with(|c: char| c.is_ascii_digit()) => {
            text.contains(keyword)
        }
        Matching::Amount => text
            .match_indices(keyword)
            .any(|(at, _)| !text[..at].chars().next_back().is_some_and(continues_number)),
        Matching::Word => text.match_indices(keyword).any(|(at, k)| {
            let before = text[..at].chars().next_back();
            let after = text[at + k.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        }),
    }
}

/// Leading number of the first `<number> <unit>` in `text`, where the
/// number does not continue an earlier one.
fn quantity(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// ============================================================================
// Category
// ============================================================================

// Domain categories precede Technology so "edtech" or "agritech" land in
// their domain; "ai" is a bare substring and would otherwise claim words
// like "retail" or "training".
static CATEGORY_RULES: &[Rule<Category>] = &[
    rule(
        &["health", "wellness", "fitness", "medical", "medicine", "clinic", "pharma", "hospital", "doctor"],
        Category::Healthcare,
    ),
    rule(
        &["education", "edtech", "learning", "school", "tutor", "teaching", "course", "coaching", "training"],
        Category::Education,
    ),
    rule(
        &["finance", "fintech", "bank", "payment", "insurance", "invest", "loan", "lending", "accounting"],
        Category::Finance,
    ),
    rule(
        &["e-commerce", "ecommerce", "online store", "retail", "shop", "d2c"],
        Category::ECommerce,
    ),
    rule(
        &["food", "beverage", "restaurant", "cafe", "kitchen", "bakery", "catering", "drink", "chai", "coffee"],
        Category::FoodAndBeverage,
    ),
    rule(
        &["travel", "tourism", "hotel", "hospitality", "homestay", "trip"],
        Category::TravelAndTourism,
    ),
    rule(
        &["real estate", "realestate", "property", "housing", "construction", "rental"],
        Category::RealEstate,
    ),
    rule(
        &["entertainment", "media", "gaming", "game", "music", "film", "event", "content"],
        Category::Entertainment,
    ),
    rule(
        &["fashion", "apparel", "clothing", "textile", "jewel", "beauty", "salon"],
        Category::Fashion,
    ),
    rule(&["sport", "fitness", "gym", "yoga", "athlet"], Category::Sports),
    rule(
        &["automotive", "automobile", "vehicle", "car ", "bike", "ev ", "mobility", "garage"],
        Category::Automotive,
    ),
    rule(
        &["agri", "farm", "dairy", "organic", "crop", "poultry", "fishery"],
        Category::Agriculture,
    ),
    rule(
        &["energy", "solar", "renewable", "power", "battery", "electric"],
        Category::Energy,
    ),
    rule(
        &["manufactur", "factory", "production", "industrial", "fabrication"],
        Category::Manufacturing,
    ),
    rule(
        &["tech", "ai", "software", "app", "digital", "saas", "iot", "robot", "blockchain", "cloud"],
        Category::Technology,
    ),
];

pub fn normalize_category(input: Option<&str>) -> Normalized<Category> {
    classify(input, Category::Other, |text| {
        first_match(text, CATEGORY_RULES, Matching::Substring)
    })
}

// ============================================================================
// Investment
// ============================================================================

// Descending magnitude. "₹1.2 Cr" reads as the ₹50 Lakhs - 1 Crore bucket.
// Other crore amounts go through `crore_bucket` before any lakh rule runs.
static CRORE_RULES: &[Rule<InvestmentRange>] = &[
    rule(
        &["above ₹1 cr", "above 1 cr", "above rs 1 cr", "1cr+", "1 cr+", "1 crore+"],
        InvestmentRange::AboveOneCrore,
    ),
    rule(
        &["1.2cr", "1.2 cr", "1cr", "1 cr", "one crore", "0.5cr", "0.5 cr"],
        InvestmentRange::FiftyLakhsToOneCrore,
    ),
];

static LAKH_RULES: &[Rule<InvestmentRange>] = &[
    rule(
        &["75l", "75 l", "60l", "60 l"],
        InvestmentRange::FiftyLakhsToOneCrore,
    ),
    rule(
        &["50l", "50 l", "40l", "40 l", "30l", "30 l"],
        InvestmentRange::TwentyFiveToFiftyLakhs,
    ),
    rule(
        &["25l", "25 l", "20l", "20 l", "15l", "15 l", "12l", "12 l"],
        InvestmentRange::TenToTwentyFiveLakhs,
    ),
    rule(
        &["10l", "10 l", "8l", "8 l", "7l", "7 l", "6l", "6 l"],
        InvestmentRange::FiveToTenLakhs,
    ),
    rule(
        &["5l", "5 l", "4l", "4 l", "3l", "3 l", "2.5l", "2.5 l", "2l", "2 l"],
        InvestmentRange::OneToFiveLakhs,
    ),
    rule(&["1l", "1 l", "thousand"], InvestmentRange::UnderOneLakh),
];

fn crore_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9.])([0-9]+(?:\.[0-9]+)?)\s*(?:crores?|cr)\b")
            .expect("static crore pattern")
    })
}

/// Buckets a crore amount by its value in lakhs. Bucket upper bounds are
/// inclusive, matching the lakh keyword tables.
fn crore_bucket(crores: f64) -> InvestmentRange {
    let lakhs = crores * 100.0;
    if lakhs > 100.0 {
        InvestmentRange::AboveOneCrore
    } else if lakhs > 50.0 {
        InvestmentRange::FiftyLakhsToOneCrore
    } else if lakhs > 25.0 {
        InvestmentRange::TwentyFiveToFiftyLakhs
    } else if lakhs > 10.0 {
        InvestmentRange::TenToTwentyFiveLakhs
    } else if lakhs > 5.0 {
        InvestmentRange::FiveToTenLakhs
    } else if lakhs >= 1.0 {
        InvestmentRange::OneToFiveLakhs
    } else {
        InvestmentRange::UnderOneLakh
    }
}

pub fn normalize_investment(input: Option<&str>) -> Normalized<InvestmentRange> {
    classify(input, InvestmentRange::UnderOneLakh, |text| {
        first_match(text, CRORE_RULES, Matching::Amount)
            .or_else(|| quantity(crore_pattern(), text).map(crore_bucket))
            .or_else(|| first_match(text, LAKH_RULES, Matching::Amount))
    })
}

// ============================================================================
// Timeline
// ============================================================================

// "More than 2 years" must win over the "2 year" of the 1-2 years rule,
// "6 months to 1 year" over its "1 year", and "3-6 months" over the
// "3 month" of the 1-3 months rule. Year counts no rule names go through
// `year_bucket`.
static TIMELINE_RULES: &[Rule<TimeToStart>] = &[
    rule(
        &["immediate", "asap", "right away", "0 month", "0-1 month"],
        TimeToStart::Immediately,
    ),
    rule(
        &["more than 2 year", "2+ year", "2-3 year", "3+ year", "3 year", "4 year", "5 year", "36 month"],
        TimeToStart::MoreThanTwoYears,
    ),
    rule(
        &["months to 1 year", "month to 1 year", "months - 1 year", "months-1 year"],
        TimeToStart::SixToTwelveMonths,
    ),
    rule(
        &["1-2 year", "1 - 2 year", "1.5 year", "1 year", "2 year", "12-24 month", "18 month", "24 month"],
        TimeToStart::OneToTwoYears,
    ),
    rule(
        &["6-12 month", "6 - 12 month", "6-9 month", "12 month", "10 month", "9 month", "8 month", "7 month"],
        TimeToStart::SixToTwelveMonths,
    ),
    rule(
        &["3-6 month", "3 - 6 month", "4-6 month", "6 month", "5 month", "4 month"],
        TimeToStart::ThreeToSixMonths,
    ),
    rule(
        &["1-3 month", "1 - 3 month", "2-3 month", "3 month", "2 month", "1 month", "week"],
        TimeToStart::OneToThreeMonths,
    ),
];

fn years_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9.])([0-9]+(?:\.[0-9]+)?)\s*\+?\s*(?:years?|yrs?)\b")
            .expect("static years pattern")
    })
}

fn year_bucket(years: f64) -> TimeToStart {
    if years > 2.0 {
        TimeToStart::MoreThanTwoYears
    } else if years >= 1.0 {
        TimeToStart::OneToTwoYears
    } else {
        TimeToStart::SixToTwelveMonths
    }
}

pub fn normalize_timeline(input: Option<&str>) -> Normalized<TimeToStart> {
    classify(input, TimeToStart::ThreeToSixMonths, |text| {
        first_match(text, TIMELINE_RULES, Matching::Amount)
            .or_else(|| quantity(years_pattern(), text).map(year_bucket))
    })
}

// ============================================================================
// Market size
// ============================================================================

// Whole-word keywords, so "electricity" is not a city and "real estate"
// not a state. Local still runs first: "city-wide across the state" is Local.
static MARKET_SIZE_RULES: &[Rule<MarketSize>] = &[
    rule(
        &["local", "city", "cities", "citywide", "town", "towns", "neighbourhood", "neighborhood", "village", "villages"],
        MarketSize::Local,
    ),
    rule(
        &["regional", "region", "state", "states", "statewide", "district", "districts"],
        MarketSize::Regional,
    ),
    rule(
        &["international", "multinational", "cross-border", "export", "exports", "overseas"],
        MarketSize::International,
    ),
    rule(
        &["national", "nationwide", "pan-india", "india", "country", "countrywide"],
        MarketSize::National,
    ),
    rule(&["global", "globally", "world", "worldwide"], MarketSize::Global),
];

pub fn normalize_market_size(input: Option<&str>) -> Normalized<MarketSize> {
    classify(input, MarketSize::Global, |text| {
        first_match(text, MARKET_SIZE_RULES, Matching::Word)
    })
}

// ============================================================================
// Business model
// ============================================================================

// "b2b2c" contains both "b2b" and "b2c".
static BUSINESS_MODEL_RULES: &[Rule<BusinessModel>] = &[
    rule(&["b2b2c"], BusinessModel::B2B2C),
    rule(&["freemium"], BusinessModel::Freemium),
    rule(
        &["subscription", "saas", "recurring", "membership"],
        BusinessModel::Subscription,
    ),
    rule(&["marketplace", "commission"], BusinessModel::Marketplace),
    rule(&["c2c", "peer-to-peer", "p2p"], BusinessModel::C2C),
    rule(
        &["b2b", "business-to-business", "enterprise"],
        BusinessModel::B2B,
    ),
    rule(
        &["b2c", "d2c", "direct-to-consumer", "consumer", "retail"],
        BusinessModel::B2C,
    ),
];

pub fn normalize_business_model(input: Option<&str>) -> Normalized<BusinessModel> {
    classify(input, BusinessModel::B2C, |text| {
        first_match(text, BUSINESS_MODEL_RULES, Matching::Substring)
    })
}
