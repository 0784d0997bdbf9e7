//! Accounts.
//!
//! `User` is the stored form and carries the password hash. Anything that
//! leaves the process goes through [`PublicUser`], which has no such field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::labels::{AgeBracket, Area, Caste, Gender, IncomeBracket, Role};
use crate::validate::{self, ValidationError};
use crate::{IdeaId, UserId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<AgeBracket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<IncomeBracket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caste: Option<Caste>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Area>,
}

impl Profile {
    const FIELDS: u32 = 6;

    /// Share of profile fields that are filled in, rounded down.
    pub fn completion_percentage(&self) -> u8 {
        let filled = [
            self.phone.as_deref().is_some_and(|p| !p.trim().is_empty()),
            self.age.is_some(),
            self.income.is_some(),
            self.gender.is_some(),
            self.caste.is_some(),
            self.area.is_some(),
        ]
        .into_iter()
        .filter(|f| *f)
        .count() as u32;
        (filled * 100 / Self::FIELDS) as u8
    }

    /// Overlay the fields set in `update`.
    pub fn merge(&mut self, update: Profile) {
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        if update.age.is_some() {
            self.age = update.age;
        }
        if update.income.is_some() {
            self.income = update.income;
        }
        if update.gender.is_some() {
            self.gender = update.gender;
        }
        if update.caste.is_some() {
            self.caste = update.caste;
        }
        if update.area.is_some() {
            self.area = update.area;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileStats {
    pub balance_icoins: u64,
    pub saved_ideas: Vec<IdeaId>,
    pub purchased: Vec<IdeaId>,
    pub completion_percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::required_text("name", &self.name, validate::NAME_MAX)?;
        validate::email("email", &self.email)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Stored lower-cased; uniqueness is case-insensitive.
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub stats: ProfileStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name.trim().to_string(),
            email: normalize_email(&new.email),
            password_hash: new.password_hash,
            role: new.role,
            profile: Profile::default(),
            stats: ProfileStats::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::required_text("name", &self.name, validate::NAME_MAX)?;
        validate::email("email", &self.email)?;
        validate::phone("profile.phone", self.profile.phone.as_deref())?;
        Ok(())
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser::from(self)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Outward view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile: Profile,
    pub stats: ProfileStats,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            profile: user.profile.clone(),
            stats: user.stats.clone(),
            created_at: user.created_at,
        }
    }
}
