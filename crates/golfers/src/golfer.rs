use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fairway_core::{DomainError, DomainResult, Entity, GolferId};

use crate::email::Email;

const MAX_NAME_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 20;

/// Entity: Golfer (a customer who books tee times).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Golfer {
    id: GolferId,
    name: String,
    email: Email,
    phone: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Command: RegisterGolfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterGolfer {
    pub golfer_id: GolferId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateGolfer (full replacement of the profile fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGolfer {
    pub golfer_id: GolferId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Golfer {
    /// Validate a registration and build the new golfer.
    ///
    /// Email uniqueness is a storage concern and is enforced there.
    pub fn register(cmd: &RegisterGolfer) -> DomainResult<Self> {
        Ok(Self {
            id: cmd.golfer_id,
            name: normalize_name(&cmd.name)?,
            email: Email::parse(&cmd.email)?,
            phone: normalize_phone(cmd.phone.as_deref())?,
            notes: normalize_optional(cmd.notes.as_deref()),
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
        })
    }

    /// Rebuild a golfer from persisted columns.
    pub fn restore(
        id: GolferId,
        name: String,
        email: Email,
        phone: Option<String>,
        notes: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            phone,
            notes,
            created_at,
            updated_at,
        }
    }

    /// Decide the profile after an edit. Does not mutate `self`.
    pub fn updated(&self, cmd: &UpdateGolfer) -> DomainResult<Self> {
        if cmd.golfer_id != self.id {
            return Err(DomainError::validation("golfer_id mismatch"));
        }

        Ok(Self {
            id: self.id,
            name: normalize_name(&cmd.name)?,
            email: Email::parse(&cmd.email)?,
            phone: normalize_phone(cmd.phone.as_deref())?,
            notes: normalize_optional(cmd.notes.as_deref()),
            created_at: self.created_at,
            updated_at: cmd.occurred_at,
        })
    }

    pub fn id_typed(&self) -> GolferId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Golfer {
    type Id = GolferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn normalize_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn normalize_phone(raw: Option<&str>) -> DomainResult<Option<String>> {
    let phone = normalize_optional(raw);
    if let Some(p) = &phone {
        if p.chars().count() > MAX_PHONE_LEN {
            return Err(DomainError::validation(format!(
                "phone cannot exceed {MAX_PHONE_LEN} characters"
            )));
        }
    }
    Ok(phone)
}

// Blank optional text is stored as absent.
fn normalize_optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
