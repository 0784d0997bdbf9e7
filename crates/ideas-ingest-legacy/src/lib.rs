//! Legacy idea import for 10000Ideas
//!
//! Turns the two pre-migration JSON shapes into canonical ideas:
//!
//! ```text
//!  summary file ──┐                                   ┌── category
//!  (keyed object) │   LegacyIdea   ┌─────────────┐    ├── investment range
//!                 ├──────────────► │ transformer │ ◄──┼── time to start
//!  detailed file ─┘  (tagged sum)  └──────┬──────┘    ├── market size
//!  (array)                                │           └── business model
//!                                         ▼              (normalizers)
//!                                      NewIdea
//!                                         │
//!                    delete static ideas, bulk insert (IdeaStore)
//! ```
//!
//! Normalizers are pure table lookups. The transformer fills defaults but
//! does not validate; the store does that on write.

pub mod legacy;
pub mod migrate;
pub mod normalize;
pub mod transform;

pub use legacy::{DetailedIdea, LegacyError, LegacyIdea, MarketAnalysis, SummaryIdea, TextOrList};
pub use migrate::{
    run_migration, LegacyBatch, LegacyFiles, LegacySource, MigrationError, MigrationReport,
};
pub use normalize::{
    normalize_business_model, normalize_category, normalize_investment, normalize_market_size,
    normalize_timeline, Normalized,
};
pub use transform::{transform, FallbackCounts, Transformed};
