//! 10000Ideas document store
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          IdeaStore                            │
//! ├───────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │   writes ──► validate ──► mutate ──► snapshot (tmp + rename)  │
//! │                             │                                 │
//! │                             ▼                                 │
//! │                  ┌─────────────────────┐                      │
//! │   reads ◄────────│ ideas/users/reviews │ (RwLock, in memory)  │
//! │                  └─────────────────────┘                      │
//! │                                                               │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is an explicit handle: callers `connect` it, pass `&IdeaStore`
//! to whatever needs it, and `close` it when done. There is no process-wide
//! connection.
//!
//! Every write is validated against the canonical schema before it touches
//! the collections, and is persisted before the call returns (when the store
//! has a data directory). Bulk inserts are all-or-nothing.

pub mod query;
mod snapshot;


use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use ideas_model::user::normalize_email;
use ideas_model::{
    Idea, IdeaId, IdeaPatch, NewIdea, NewReview, NewUser, Profile, Review, ReviewId,
    ReviewStatus, User, UserId, ValidationError,
};

pub use query::{IdeaFilter, IdeaQuery, Page, SortOrder};
use snapshot::Collections;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot open store at {path}: {reason}")]
    Connection { path: PathBuf, reason: String },

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("record #{index} of the batch is invalid: {source}")]
    InvalidBatchRecord {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("duplicate {0}")]
    Duplicate(String),
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection { .. })
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the snapshot; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Snapshot file name inside `data_dir`.
    pub snapshot_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            snapshot_file: "ideas.json".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(&self.snapshot_file))
    }
}

// ============================================================================
// Store handle
// ============================================================================

pub struct IdeaStore {
    config: StoreConfig,
    state: Arc<RwLock<Collections>>,
    /// Serializes snapshot writes so the file always ends at the latest state.
    persist_lock: tokio::sync::Mutex<()>,
}

impl IdeaStore {
    pub async fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let collections = match config.snapshot_path() {
            Some(path) => snapshot::load(&path).await?,
            None => Collections::default(),
        };

        tracing::info!(
            snapshot = ?config.snapshot_path(),
            ideas = collections.ideas.len(),
            users = collections.users.len(),
            reviews = collections.reviews.len(),
            "store connected"
        );

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(collections)),
            persist_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Flush and release the handle.
    pub async fn close(self) -> Result<(), StoreError> {
        self.persist().await?;
        tracing::info!(snapshot = ?self.config.snapshot_path(), "store closed");
        Ok(())
    }

    /// Release the handle without writing. For read-only callers; any
    /// changes made through this handle are dropped.
    pub fn release(self) {
        tracing::debug!(snapshot = ?self.config.snapshot_path(), "store released unchanged");
    }

    /// Write the current state without releasing the handle.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.persist().await
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = self.config.snapshot_path() else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;
        let bytes = snapshot::encode(&self.state.read()).map_err(|source| StoreError::Persist {
            path: path.clone(),
            source,
        })?;
        snapshot::write(&path, bytes).await
    }

    // ========================================================================
    // Ideas
    // ========================================================================

    pub async fn insert_idea(&self, new: NewIdea) -> Result<Idea, StoreError> {
        new.validate()?;
        let idea = {
            let mut state = self.state.write();
            if let Some(original_id) = new.original_id {
                if state
                    .ideas
                    .iter()
                    .any(|i| i.content.original_id == Some(original_id))
                {
                    return Err(StoreError::Duplicate(format!("originalId {original_id}")));
                }
            }
            let idea = Idea::new(Uuid::new_v4(), new, Utc::now());
            state.ideas.push(idea.clone());
            idea
        };
        self.persist().await?;
        Ok(idea)
    }

    /// Insert a batch atomically: if any record is invalid or collides on
    /// `originalId`, nothing is inserted.
    pub async fn insert_ideas(&self, batch: Vec<NewIdea>) -> Result<Vec<Idea>, StoreError> {
        for (index, new) in batch.iter().enumerate() {
            new.validate()
                .map_err(|source| StoreError::InvalidBatchRecord { index, source })?;
        }

        let inserted = {
            let mut state = self.state.write();
            let mut seen: HashSet<u64> = state
                .ideas
                .iter()
                .filter_map(|i| i.content.original_id)
                .collect();
            for new in &batch {
                if let Some(original_id) = new.original_id {
                    if !seen.insert(original_id) {
                        return Err(StoreError::Duplicate(format!("originalId {original_id}")));
                    }
                }
            }

            let now = Utc::now();
            let inserted: Vec<Idea> = batch
                .into_iter()
                .map(|new| Idea::new(Uuid::new_v4(), new, now))
                .collect();
            state.ideas.extend(inserted.iter().cloned());
            inserted
        };

        self.persist().await?;
        tracing::debug!(count = inserted.len(), "bulk insert");
        Ok(inserted)
    }

    /// Delete every idea matching `filter`, with its reviews. Returns the count.
    pub async fn delete_ideas(&self, filter: &IdeaFilter) -> Result<usize, StoreError> {
        let removed = {
            let mut state = self.state.write();
            let removed: HashSet<IdeaId> = state
                .ideas
                .iter()
                .filter(|i| filter.matches(i))
                .map(|i| i.id)
                .collect();
            if !removed.is_empty() {
                state.ideas.retain(|i| !removed.contains(&i.id));
                detach_ideas(&mut state, &removed);
            }
            removed.len()
        };

        if removed > 0 {
            self.persist().await?;
        }
        tracing::debug!(count = removed, "bulk delete");
        Ok(removed)
    }

    pub async fn delete_idea(&self, id: IdeaId) -> Result<Idea, StoreError> {
        let idea = {
            let mut state = self.state.write();
            let pos = state
                .ideas
                .iter()
                .position(|i| i.id == id)
                .ok_or(StoreError::NotFound { kind: "idea", id })?;
            let idea = state.ideas.remove(pos);
            detach_ideas(&mut state, &HashSet::from([id]));
            idea
        };
        self.persist().await?;
        Ok(idea)
    }

    pub async fn update_idea(&self, id: IdeaId, patch: IdeaPatch) -> Result<Idea, StoreError> {
        let idea = self.modify_idea(id, |idea| {
            let mut content = idea.content.clone();
            patch.apply_to(&mut content);
            content.validate()?;
            idea.content = content;
            idea.updated_at = Utc::now();
            Ok(())
        })?;
        self.persist().await?;
        Ok(idea)
    }

    /// Read-path side effect: bump the view counter.
    pub async fn record_view(&self, id: IdeaId) -> Result<Idea, StoreError> {
        let idea = self.modify_idea(id, |idea| {
            idea.content.views = idea.content.views.saturating_add(1);
            Ok(())
        })?;
        self.persist().await?;
        Ok(idea)
    }

    /// Like or unlike; returns the idea and whether `user` now likes it.
    pub async fn toggle_like(&self, id: IdeaId, user: UserId) -> Result<(Idea, bool), StoreError> {
        let mut liked = false;
        let idea = self.modify_idea(id, |idea| {
            liked = idea.liked_by.insert(user);
            if liked {
                idea.content.likes = idea.content.likes.saturating_add(1);
            } else {
                idea.liked_by.remove(&user);
                idea.content.likes = idea.content.likes.saturating_sub(1);
            }
            Ok(())
        })?;
        self.persist().await?;
        Ok((idea, liked))
    }

    /// Save or unsave for `user`; keeps `savedBy` and the user's
    /// `savedIdeas` in step. Returns whether the idea is now saved.
    pub async fn toggle_save(&self, id: IdeaId, user: UserId) -> Result<bool, StoreError> {
        let saved = {
            let mut state = self.state.write();
            let user_pos = state
                .users
                .iter()
                .position(|u| u.id == user)
                .ok_or(StoreError::NotFound {
                    kind: "user",
                    id: user,
                })?;
            let idea = state
                .ideas
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or(StoreError::NotFound { kind: "idea", id })?;

            let saved = idea.saved_by.insert(user);
            if !saved {
                idea.saved_by.remove(&user);
            }

            let stats = &mut state.users[user_pos].stats;
            stats.saved_ideas.retain(|i| *i != id);
            if saved {
                stats.saved_ideas.push(id);
            }
            saved
        };
        self.persist().await?;
        Ok(saved)
    }

    fn modify_idea(
        &self,
        id: IdeaId,
        f: impl FnOnce(&mut Idea) -> Result<(), ValidationError>,
    ) -> Result<Idea, StoreError> {
        let mut state = self.state.write();
        let idea = state
            .ideas
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound { kind: "idea", id })?;
        f(idea)?;
        Ok(idea.clone())
    }

    pub fn get_idea(&self, id: IdeaId) -> Option<Idea> {
        self.state.read().ideas.iter().find(|i| i.id == id).cloned()
    }

    pub fn count_ideas(&self, filter: &IdeaFilter) -> usize {
        self.state
            .read()
            .ideas
            .iter()
            .filter(|i| filter.matches(i))
            .count()
    }

    pub fn query_ideas(&self, query: &IdeaQuery) -> Page<Idea> {
        query::run_query(self.state.read().ideas.iter(), query)
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        new.validate()?;
        let user = {
            let mut state = self.state.write();
            let email = normalize_email(&new.email);
            if state.users.iter().any(|u| u.email == email) {
                return Err(StoreError::Duplicate(format!("email {email}")));
            }
            let user = User::new(Uuid::new_v4(), new, Utc::now());
            state.users.push(user.clone());
            user
        };
        self.persist().await?;
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Option<User> {
        self.state.read().users.iter().find(|u| u.id == id).cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let email = normalize_email(email);
        self.state
            .read()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn update_profile(&self, id: UserId, update: Profile) -> Result<User, StoreError> {
        let user = self.modify_user(id, |user| {
            let mut profile = user.profile.clone();
            profile.merge(update);
            let mut candidate = user.clone();
            candidate.stats.completion_percentage = profile.completion_percentage();
            candidate.profile = profile;
            candidate.validate()?;
            *user = candidate;
            Ok(())
        })?;
        self.persist().await?;
        Ok(user)
    }

    /// Replace the stored hash; the caller hashes.
    pub async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<User, StoreError> {
        let user = self.modify_user(id, |user| {
            user.password_hash = password_hash;
            Ok(())
        })?;
        self.persist().await?;
        Ok(user)
    }

    fn modify_user(
        &self,
        id: UserId,
        f: impl FnOnce(&mut User) -> Result<(), ValidationError>,
    ) -> Result<User, StoreError> {
        let mut state = self.state.write();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound { kind: "user", id })?;
        f(user)?;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    // ========================================================================
    // Reviews
    // ========================================================================

    /// One review per user per idea; new reviews start `pending`.
    pub async fn create_review(&self, new: NewReview) -> Result<Review, StoreError> {
        new.validate()?;
        let review = {
            let mut state = self.state.write();
            if !state.ideas.iter().any(|i| i.id == new.idea_id) {
                return Err(StoreError::NotFound {
                    kind: "idea",
                    id: new.idea_id,
                });
            }
            if state
                .reviews
                .iter()
                .any(|r| r.content.idea_id == new.idea_id && r.content.user_id == new.user_id)
            {
                return Err(StoreError::Duplicate(format!(
                    "review by user {} on idea {}",
                    new.user_id, new.idea_id
                )));
            }
            let review = Review::new(Uuid::new_v4(), new, Utc::now());
            state.reviews.push(review.clone());
            review
        };
        self.persist().await?;
        Ok(review)
    }

    pub fn get_review(&self, id: ReviewId) -> Option<Review> {
        self.state.read().reviews.iter().find(|r| r.id == id).cloned()
    }

    /// Newest first. Without `include_unmoderated` only approved reviews are returned.
    pub fn reviews_for_idea(&self, idea: IdeaId, include_unmoderated: bool) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .state
            .read()
            .reviews
            .iter()
            .filter(|r| r.content.idea_id == idea && (include_unmoderated || r.is_visible()))
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews
    }

    /// Mean rating over approved reviews.
    pub fn average_rating(&self, idea: IdeaId) -> Option<f64> {
        let state = self.state.read();
        let ratings: Vec<u8> = state
            .reviews
            .iter()
            .filter(|r| r.content.idea_id == idea && r.is_visible())
            .map(|r| r.content.rating)
            .collect();
        if ratings.is_empty() {
            return None;
        }
        Some(ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64)
    }

    pub async fn set_review_status(
        &self,
        id: ReviewId,
        status: ReviewStatus,
    ) -> Result<Review, StoreError> {
        let review = self.modify_review(id, |r| r.status = status)?;
        self.persist().await?;
        Ok(review)
    }

    pub async fn mark_review_helpful(&self, id: ReviewId) -> Result<Review, StoreError> {
        let review = self.modify_review(id, |r| r.helpful = r.helpful.saturating_add(1))?;
        self.persist().await?;
        Ok(review)
    }

    fn modify_review(&self, id: ReviewId, f: impl FnOnce(&mut Review)) -> Result<Review, StoreError> {
        let mut state = self.state.write();
        let review = state
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { kind: "review", id })?;
        f(review);
        review.updated_at = Utc::now();
        Ok(review.clone())
    }
}

/// Drop reviews and saved-list entries that point at removed ideas.
fn detach_ideas(state: &mut Collections, removed: &HashSet<IdeaId>) {
    state
        .reviews
        .retain(|r| !removed.contains(&r.content.idea_id));
    for user in &mut state.users {
        user.stats.saved_ideas.retain(|i| !removed.contains(i));
        user.stats.purchased.retain(|i| !removed.contains(i));
    }
}
