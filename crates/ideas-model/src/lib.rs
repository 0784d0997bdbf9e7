//! 10000Ideas canonical records
//!
//! This crate defines the storage representation shared by every other crate
//! in the workspace:
//!
//! - `Idea` / `NewIdea` / `IdeaPatch`: the canonical idea document,
//! - `User` / `PublicUser`: accounts (the password hash never leaves `User`),
//! - `Review`: ratings attached to an idea,
//! - closed label sets (`Category`, `InvestmentRange`, ...) in [`labels`].
//!
//! Enumerated fields are enums, so an out-of-set value cannot exist in memory.
//! Everything else (lengths, list cardinalities, contact patterns) is checked
//! by the `validate` methods, which the store calls on every write.

pub mod idea;
pub mod labels;
pub mod review;
pub mod user;
pub mod validate;

pub use idea::{Contact, Idea, IdeaPatch, NewIdea};
pub use labels::{
    AgeBracket, Area, BusinessModel, Caste, Category, Gender, IdeaStatus, IncomeBracket,
    InvestmentRange, MarketSize, ReviewStatus, Role, TimeToStart, UnknownLabel,
};
pub use review::{NewReview, Review};
pub use user::{NewUser, Profile, ProfileStats, PublicUser, User};
pub use validate::ValidationError;

/// Store-generated identifier of an idea.
pub type IdeaId = uuid::Uuid;

/// Store-generated identifier of a user.
pub type UserId = uuid::Uuid;

/// Store-generated identifier of a review.
pub type ReviewId = uuid::Uuid;
