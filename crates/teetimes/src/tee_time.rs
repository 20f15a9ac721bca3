use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fairway_core::{AggregateRoot, DomainError, DomainResult, TeeTimeId};

/// Players per tee time when staff don't say otherwise.
pub const DEFAULT_CAPACITY: u32 = 4;

pub const DEFAULT_COURSE_SECTION: &str = "Main Course";

const MAX_COURSE_SECTION_LEN: usize = 50;

/// Aggregate root: TeeTime.
///
/// Invariant: `available_slots + booked players == capacity`, hence
/// `available_slots <= capacity`. Only [`TeeTime::reserve`] and
/// [`TeeTime::release`] move `available_slots`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeeTime {
    id: TeeTimeId,
    start_time: DateTime<Utc>,
    course_section: String,
    capacity: u32,
    available_slots: u32,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Command: ScheduleTeeTime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTeeTime {
    pub tee_time_id: TeeTimeId,
    pub start_time: DateTime<Utc>,
    /// `None` means [`DEFAULT_COURSE_SECTION`].
    pub course_section: Option<String>,
    pub capacity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RescheduleTeeTime.
///
/// Edits schedule fields only. Available slots are never set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleTeeTime {
    pub tee_time_id: TeeTimeId,
    pub start_time: DateTime<Utc>,
    pub course_section: String,
    /// Optional new capacity (if None, keep existing).
    pub capacity: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

impl TeeTime {
    /// Validate a scheduling request and build a fully available tee time.
    pub fn schedule(cmd: &ScheduleTeeTime) -> DomainResult<Self> {
        let course_section = match cmd.course_section.as_deref() {
            Some(raw) => normalize_course_section(raw)?,
            None => DEFAULT_COURSE_SECTION.to_string(),
        };
        ensure_capacity(cmd.capacity)?;

        Ok(Self {
            id: cmd.tee_time_id,
            start_time: cmd.start_time,
            course_section,
            capacity: cmd.capacity,
            available_slots: cmd.capacity,
            version: 1,
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
        })
    }

    /// Rebuild a tee time from persisted columns.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: TeeTimeId,
        start_time: DateTime<Utc>,
        course_section: String,
        capacity: u32,
        available_slots: u32,
        version: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            start_time,
            course_section,
            capacity,
            available_slots,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn id_typed(&self) -> TeeTimeId {
        self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn course_section(&self) -> &str {
        &self.course_section
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available_slots(&self) -> u32 {
        self.available_slots
    }

    /// Players currently holding slots on this tee time.
    pub fn booked_players(&self) -> u32 {
        self.capacity.saturating_sub(self.available_slots)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_full(&self) -> bool {
        self.available_slots == 0
    }

    /// Decide the tee time after `players` take slots.
    ///
    /// Fails with `CapacityExceeded` (and leaves nothing changed) when fewer
    /// than `players` slots remain.
    pub fn reserve(&self, players: u32, at: DateTime<Utc>) -> DomainResult<Self> {
        if players == 0 {
            return Err(DomainError::validation("number_of_players must be at least 1"));
        }
        if self.available_slots < players {
            return Err(DomainError::capacity_exceeded(players, self.available_slots));
        }

        Ok(self.next(self.available_slots - players, at))
    }

    /// Decide the tee time after `players` give their slots back.
    ///
    /// Unconditional: a release never fails. It saturates at `capacity`, and
    /// stores re-derive the count from the booking set on write anyway.
    pub fn release(&self, players: u32, at: DateTime<Utc>) -> Self {
        let available = self
            .available_slots
            .saturating_add(players)
            .min(self.capacity);
        self.next(available, at)
    }

    /// Decide the tee time after a schedule edit.
    ///
    /// A capacity change keeps every existing booking, so the new capacity
    /// must cover the players already booked.
    pub fn rescheduled(&self, cmd: &RescheduleTeeTime) -> DomainResult<Self> {
        if cmd.tee_time_id != self.id {
            return Err(DomainError::validation("tee_time_id mismatch"));
        }

        let course_section = normalize_course_section(&cmd.course_section)?;
        let capacity = cmd.capacity.unwrap_or(self.capacity);
        ensure_capacity(capacity)?;

        let booked = self.booked_players();
        if capacity < booked {
            return Err(DomainError::validation(format!(
                "capacity cannot drop below the {booked} players already booked"
            )));
        }

        Ok(Self {
            id: self.id,
            start_time: cmd.start_time,
            course_section,
            capacity,
            available_slots: capacity - booked,
            version: self.version + 1,
            created_at: self.created_at,
            updated_at: cmd.occurred_at,
        })
    }

    fn next(&self, available_slots: u32, at: DateTime<Utc>) -> Self {
        Self {
            available_slots,
            version: self.version + 1,
            updated_at: at,
            ..self.clone()
        }
    }
}

impl AggregateRoot for TeeTime {
    type Id = TeeTimeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn ensure_capacity(capacity: u32) -> DomainResult<()> {
    if capacity == 0 {
        return Err(DomainError::validation("capacity must be at least 1"));
    }
    Ok(())
}

fn normalize_course_section(raw: &str) -> DomainResult<String> {
    let section = raw.trim();
    if section.is_empty() {
        return Err(DomainError::validation("course_section cannot be empty"));
    }
    if section.chars().count() > MAX_COURSE_SECTION_LEN {
        return Err(DomainError::validation(format!(
            "course_section cannot exceed {MAX_COURSE_SECTION_LEN} characters"
        )));
    }
    Ok(section.to_string())
}
