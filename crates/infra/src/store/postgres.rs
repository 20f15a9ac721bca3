//! Postgres-backed booking store.
//!
//! Every write runs in one transaction. Tee time writes first take a row lock
//! (`SELECT ... FOR UPDATE`) and compare the stored `version` against the
//! caller's [`ExpectedVersion`]; the slot count is then re-derived in SQL from
//! the `bookings` table before commit.
//!
//! Row locks are always taken in the order golfer, tee times (by id), bookings.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | Constraint | StoreError |
//! |-----------------------|------------|------------|
//! | `23505` unique violation | `golfers_email_key` | `UniqueViolation(GolferEmail)` |
//! | `23505` unique violation | `tee_times_start_time_key` | `UniqueViolation(TeeTimeStartTime)` |
//! | `23505` unique violation | any other (primary keys) | `Concurrency` |
//! | `23514` check violation | `tee_times_slots_check` etc. | `Concurrency` |
//! | `23503` foreign key violation | `bookings_golfer_id_fkey` | `NotFound("golfer")` |
//! | `23503` foreign key violation | `bookings_tee_time_id_fkey` | `NotFound("tee time")` |
//! | `40001` serialization failure | | `Concurrency` |
//! | `40P01` deadlock detected | | `Concurrency` |
//! | anything else | | `Backend` |

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};

use fairway_bookings::{Booking, BookingDetail, PlayerCount};
use fairway_core::{AggregateRoot, BookingId, ExpectedVersion, GolferId, TeeTimeId};
use fairway_golfers::{Email, Golfer};
use fairway_teetimes::TeeTime;

use super::{BookingStore, Removal, StoreError, StoreResult, UniqueKey};

/// Schema statements, applied in order by [`PostgresBookingStore::migrate`].
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS golfers (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        email       TEXT NOT NULL,
        phone       TEXT,
        notes       TEXT,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL,
        CONSTRAINT golfers_email_key UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tee_times (
        id               UUID PRIMARY KEY,
        start_time       TIMESTAMPTZ NOT NULL,
        course_section   TEXT NOT NULL,
        capacity         BIGINT NOT NULL,
        available_slots  BIGINT NOT NULL,
        version          BIGINT NOT NULL,
        created_at       TIMESTAMPTZ NOT NULL,
        updated_at       TIMESTAMPTZ NOT NULL,
        CONSTRAINT tee_times_start_time_key UNIQUE (start_time),
        CONSTRAINT tee_times_capacity_check CHECK (capacity >= 1),
        CONSTRAINT tee_times_slots_check CHECK (available_slots >= 0 AND available_slots <= capacity)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id                 UUID PRIMARY KEY,
        tee_time_id        UUID NOT NULL,
        golfer_id          UUID NOT NULL,
        number_of_players  BIGINT NOT NULL,
        booking_time       TIMESTAMPTZ NOT NULL,
        CONSTRAINT bookings_tee_time_id_fkey FOREIGN KEY (tee_time_id) REFERENCES tee_times (id),
        CONSTRAINT bookings_golfer_id_fkey FOREIGN KEY (golfer_id) REFERENCES golfers (id),
        CONSTRAINT bookings_players_check CHECK (number_of_players >= 1)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS bookings_tee_time_id_idx ON bookings (tee_time_id)",
    "CREATE INDEX IF NOT EXISTS bookings_golfer_id_idx ON bookings (golfer_id)",
    "CREATE INDEX IF NOT EXISTS bookings_booking_time_idx ON bookings (booking_time, id)",
];

const TEE_TIME_COLUMNS: &str =
    "id, start_time, course_section, capacity, available_slots, version, created_at, updated_at";

/// Postgres-backed [`BookingStore`].
///
/// Uses the SQLx connection pool, so it is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresBookingStore {
    pool: Arc<PgPool>,
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables, constraints and indexes if they are missing.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

#[async_trait::async_trait]
impl BookingStore for PostgresBookingStore {
    #[instrument(skip(self, golfer), fields(golfer_id = %golfer.id_typed()), err)]
    async fn insert_golfer(&self, golfer: &Golfer) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO golfers (id, name, email, phone, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(golfer.id_typed().as_uuid())
        .bind(golfer.name())
        .bind(golfer.email().as_str())
        .bind(golfer.phone())
        .bind(golfer.notes())
        .bind(golfer.created_at())
        .bind(golfer.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_golfer", e))?;
        Ok(())
    }

    #[instrument(skip(self, golfer), fields(golfer_id = %golfer.id_typed()), err)]
    async fn update_golfer(&self, golfer: &Golfer) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE golfers
            SET name = $2, email = $3, phone = $4, notes = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(golfer.id_typed().as_uuid())
        .bind(golfer.name())
        .bind(golfer.email().as_str())
        .bind(golfer.phone())
        .bind(golfer.notes())
        .bind(golfer.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_golfer", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("golfer"));
        }
        Ok(())
    }

    #[instrument(
        skip(self),
        fields(golfer_id = %golfer_id, bookings_removed = tracing::field::Empty),
        err
    )]
    async fn delete_golfer(&self, golfer_id: GolferId, at: DateTime<Utc>) -> StoreResult<Removal> {
        let mut tx = self.begin().await?;

        let exists = sqlx::query("SELECT id FROM golfers WHERE id = $1 FOR UPDATE")
            .bind(golfer_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_golfer", e))?;
        if exists.is_none() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound("golfer"));
        }

        // The golfer lock blocks new bookings for this golfer, so the set of
        // affected tee times is stable from here on.
        let held = sqlx::query("SELECT DISTINCT tee_time_id FROM bookings WHERE golfer_id = $1")
            .bind(golfer_id.as_uuid())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("load_golfer_bookings", e))?;
        let tee_time_ids: BTreeSet<uuid::Uuid> = held
            .iter()
            .map(|row| row.try_get("tee_time_id"))
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("load_golfer_bookings", e))?;
        for tee_time_id in &tee_time_ids {
            lock_tee_time(&mut tx, TeeTimeId::from_uuid(*tee_time_id), ExpectedVersion::Any).await?;
        }

        let removed = sqlx::query("DELETE FROM bookings WHERE golfer_id = $1")
            .bind(golfer_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_golfer_bookings", e))?;
        let bookings_removed = removed.rows_affected() as usize;

        for tee_time_id in tee_time_ids {
            sqlx::query("UPDATE tee_times SET version = version + 1, updated_at = $2 WHERE id = $1")
                .bind(tee_time_id)
                .bind(at)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("release_tee_time", e))?;
            derive_slots(&mut tx, TeeTimeId::from_uuid(tee_time_id)).await?;
        }

        sqlx::query("DELETE FROM golfers WHERE id = $1")
            .bind(golfer_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_golfer", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("bookings_removed", bookings_removed);
        Ok(Removal { bookings_removed })
    }

    #[instrument(skip(self), fields(golfer_id = %golfer_id), err)]
    async fn golfer(&self, golfer_id: GolferId) -> StoreResult<Option<Golfer>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, phone, notes, created_at, updated_at
            FROM golfers
            WHERE id = $1
            "#,
        )
        .bind(golfer_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_golfer", e))?;

        row.map(|row| Golfer::try_from(decode_row::<GolferRow>(&row)?))
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_golfers(&self) -> StoreResult<Vec<Golfer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, phone, notes, created_at, updated_at
            FROM golfers
            ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_golfers", e))?;

        rows.iter()
            .map(|row| Golfer::try_from(decode_row::<GolferRow>(row)?))
            .collect()
    }

    #[instrument(skip(self, tee_time), fields(tee_time_id = %tee_time.id_typed()), err)]
    async fn insert_tee_time(&self, tee_time: &TeeTime) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tee_times (
                id,
                start_time,
                course_section,
                capacity,
                available_slots,
                version,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $4, $5, $6, $7)
            "#,
        )
        .bind(tee_time.id_typed().as_uuid())
        .bind(tee_time.start_time())
        .bind(tee_time.course_section())
        .bind(i64::from(tee_time.capacity()))
        .bind(tee_time.version() as i64)
        .bind(tee_time.created_at())
        .bind(tee_time.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_tee_time", e))?;
        Ok(())
    }

    #[instrument(
        skip(self, tee_time),
        fields(tee_time_id = %tee_time.id_typed(), expected_version = ?expected),
        err
    )]
    async fn update_tee_time(
        &self,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime> {
        let mut tx = self.begin().await?;
        lock_tee_time(&mut tx, tee_time.id_typed(), expected).await?;

        sqlx::query(
            r#"
            UPDATE tee_times
            SET start_time = $2, course_section = $3, capacity = $4, version = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(tee_time.id_typed().as_uuid())
        .bind(tee_time.start_time())
        .bind(tee_time.course_section())
        .bind(i64::from(tee_time.capacity()))
        .bind(tee_time.version() as i64)
        .bind(tee_time.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_tee_time", e))?;

        let stored = derive_slots(&mut tx, tee_time.id_typed()).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(stored)
    }

    #[instrument(skip(self), fields(tee_time_id = %tee_time_id), err)]
    async fn delete_tee_time(&self, tee_time_id: TeeTimeId) -> StoreResult<Removal> {
        let mut tx = self.begin().await?;
        lock_tee_time(&mut tx, tee_time_id, ExpectedVersion::Any).await?;

        let removed = sqlx::query("DELETE FROM bookings WHERE tee_time_id = $1")
            .bind(tee_time_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_tee_time_bookings", e))?;
        sqlx::query("DELETE FROM tee_times WHERE id = $1")
            .bind(tee_time_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_tee_time", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(Removal {
            bookings_removed: removed.rows_affected() as usize,
        })
    }

    #[instrument(skip(self), fields(tee_time_id = %tee_time_id), err)]
    async fn tee_time(&self, tee_time_id: TeeTimeId) -> StoreResult<Option<TeeTime>> {
        let row = sqlx::query(&format!("SELECT {TEE_TIME_COLUMNS} FROM tee_times WHERE id = $1"))
            .bind(tee_time_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_tee_time", e))?;

        row.map(|row| TeeTime::try_from(decode_row::<TeeTimeRow>(&row)?))
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_tee_times(&self) -> StoreResult<Vec<TeeTime>> {
        let rows = sqlx::query(&format!(
            "SELECT {TEE_TIME_COLUMNS} FROM tee_times ORDER BY start_time ASC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tee_times", e))?;

        rows.iter()
            .map(|row| TeeTime::try_from(decode_row::<TeeTimeRow>(row)?))
            .collect()
    }

    #[instrument(skip(self), fields(booking_id = %booking_id), err)]
    async fn booking(&self, booking_id: BookingId) -> StoreResult<Option<Booking>> {
        let row = sqlx::query(
            r#"
            SELECT id, tee_time_id, golfer_id, number_of_players, booking_time
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(booking_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_booking", e))?;

        row.map(|row| Booking::try_from(decode_row::<BookingRow>(&row)?))
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_bookings(&self) -> StoreResult<Vec<BookingDetail>> {
        // One statement, so the join sees a single snapshot.
        let rows = sqlx::query(
            r#"
            SELECT
                b.id, b.tee_time_id, b.golfer_id, b.number_of_players, b.booking_time,
                t.start_time AS t_start_time, t.course_section AS t_course_section,
                t.capacity AS t_capacity, t.available_slots AS t_available_slots,
                t.version AS t_version, t.created_at AS t_created_at, t.updated_at AS t_updated_at,
                g.name AS g_name, g.email AS g_email, g.phone AS g_phone, g.notes AS g_notes,
                g.created_at AS g_created_at, g.updated_at AS g_updated_at
            FROM bookings b
            JOIN tee_times t ON t.id = b.tee_time_id
            JOIN golfers g ON g.id = b.golfer_id
            ORDER BY b.booking_time ASC, b.id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_bookings", e))?;

        rows.iter().map(decode_booking_detail).collect()
    }

    #[instrument(
        skip(self, booking, tee_time),
        fields(
            booking_id = %booking.id_typed(),
            tee_time_id = %tee_time.id_typed(),
            expected_version = ?expected
        ),
        err
    )]
    async fn commit_booking(
        &self,
        booking: &Booking,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime> {
        if booking.tee_time_id() != tee_time.id_typed() {
            return Err(StoreError::Backend(
                "booking and tee time do not belong together".to_string(),
            ));
        }

        let mut tx = self.begin().await?;
        lock_golfer_key(&mut tx, booking.golfer_id()).await?;
        lock_tee_time(&mut tx, tee_time.id_typed(), expected).await?;

        sqlx::query(
            r#"
            INSERT INTO bookings (id, tee_time_id, golfer_id, number_of_players, booking_time)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(booking.id_typed().as_uuid())
        .bind(booking.tee_time_id().as_uuid())
        .bind(booking.golfer_id().as_uuid())
        .bind(i64::from(booking.number_of_players().get()))
        .bind(booking.booking_time())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_booking", e))?;

        bump_version(&mut tx, tee_time).await?;
        // An oversubscribed tee time fails `tee_times_slots_check` here.
        let stored = derive_slots(&mut tx, tee_time.id_typed()).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(stored)
    }

    #[instrument(
        skip(self, tee_time),
        fields(
            booking_id = %booking_id,
            tee_time_id = %tee_time.id_typed(),
            expected_version = ?expected
        ),
        err
    )]
    async fn remove_booking(
        &self,
        booking_id: BookingId,
        tee_time: &TeeTime,
        expected: ExpectedVersion,
    ) -> StoreResult<TeeTime> {
        let mut tx = self.begin().await?;
        lock_tee_time(&mut tx, tee_time.id_typed(), expected).await?;

        let removed = sqlx::query("DELETE FROM bookings WHERE id = $1 AND tee_time_id = $2")
            .bind(booking_id.as_uuid())
            .bind(tee_time.id_typed().as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_booking", e))?;
        if removed.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound("booking"));
        }

        bump_version(&mut tx, tee_time).await?;
        let stored = derive_slots(&mut tx, tee_time.id_typed()).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(stored)
    }
}

/// Share-lock the golfer row the way the bookings foreign key would, but
/// before any tee time is locked.
async fn lock_golfer_key(
    tx: &mut Transaction<'static, Postgres>,
    golfer_id: GolferId,
) -> StoreResult<()> {
    let row = sqlx::query("SELECT id FROM golfers WHERE id = $1 FOR KEY SHARE")
        .bind(golfer_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_golfer", e))?;
    match row {
        Some(_) => Ok(()),
        None => Err(StoreError::NotFound("golfer")),
    }
}

/// Lock the tee time row and check its version.
async fn lock_tee_time(
    tx: &mut Transaction<'static, Postgres>,
    tee_time_id: TeeTimeId,
    expected: ExpectedVersion,
) -> StoreResult<u64> {
    let row = sqlx::query("SELECT version FROM tee_times WHERE id = $1 FOR UPDATE")
        .bind(tee_time_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_tee_time", e))?;

    let Some(row) = row else {
        return Err(StoreError::NotFound("tee time"));
    };
    let current: i64 = row
        .try_get("version")
        .map_err(|e| map_sqlx_error("lock_tee_time", e))?;
    let current = current as u64;

    if !expected.matches(current) {
        return Err(StoreError::Concurrency(format!(
            "tee time {tee_time_id}: expected {expected:?}, found {current}"
        )));
    }
    Ok(current)
}

async fn bump_version(tx: &mut Transaction<'static, Postgres>, tee_time: &TeeTime) -> StoreResult<()> {
    sqlx::query("UPDATE tee_times SET version = $2, updated_at = $3 WHERE id = $1")
        .bind(tee_time.id_typed().as_uuid())
        .bind(tee_time.version() as i64)
        .bind(tee_time.updated_at())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("update_tee_time_version", e))?;
    Ok(())
}

/// Recompute `available_slots` from the bookings table and return the row.
async fn derive_slots(
    tx: &mut Transaction<'static, Postgres>,
    tee_time_id: TeeTimeId,
) -> StoreResult<TeeTime> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE tee_times t
        SET available_slots = t.capacity - COALESCE(
            (SELECT SUM(b.number_of_players) FROM bookings b WHERE b.tee_time_id = t.id),
            0
        )
        WHERE t.id = $1
        RETURNING {TEE_TIME_COLUMNS}
        "#
    ))
    .bind(tee_time_id.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("derive_available_slots", e))?;

    decode_row::<TeeTimeRow>(&row)?.try_into()
}

fn decode_booking_detail(row: &PgRow) -> StoreResult<BookingDetail> {
    let booking = decode_row::<BookingRow>(row)?;
    let decode = |e: sqlx::Error| StoreError::Backend(format!("failed to decode row: {e}"));
    let tee_time = TeeTimeRow {
        id: booking.tee_time_id,
        start_time: row.try_get("t_start_time").map_err(decode)?,
        course_section: row.try_get("t_course_section").map_err(decode)?,
        capacity: row.try_get("t_capacity").map_err(decode)?,
        available_slots: row.try_get("t_available_slots").map_err(decode)?,
        version: row.try_get("t_version").map_err(decode)?,
        created_at: row.try_get("t_created_at").map_err(decode)?,
        updated_at: row.try_get("t_updated_at").map_err(decode)?,
    };
    let golfer = GolferRow {
        id: booking.golfer_id,
        name: row.try_get("g_name").map_err(decode)?,
        email: row.try_get("g_email").map_err(decode)?,
        phone: row.try_get("g_phone").map_err(decode)?,
        notes: row.try_get("g_notes").map_err(decode)?,
        created_at: row.try_get("g_created_at").map_err(decode)?,
        updated_at: row.try_get("g_updated_at").map_err(decode)?,
    };

    Ok(BookingDetail {
        booking: Booking::try_from(booking)?,
        tee_time: TeeTime::try_from(tee_time)?,
        golfer: Golfer::try_from(golfer)?,
    })
}

fn decode_row<'r, T: FromRow<'r, PgRow>>(row: &'r PgRow) -> StoreResult<T> {
    T::from_row(row).map_err(|e| StoreError::Backend(format!("failed to decode row: {e}")))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match (db_err.code().as_deref(), db_err.constraint()) {
                (Some("23505"), Some("golfers_email_key")) => {
                    StoreError::UniqueViolation(UniqueKey::GolferEmail)
                }
                (Some("23505"), Some("tee_times_start_time_key")) => {
                    StoreError::UniqueViolation(UniqueKey::TeeTimeStartTime)
                }
                // Primary key collisions, slot checks and aborted lock waits
                // are lost races.
                (Some("23505"), _)
                | (Some("23514"), _)
                | (Some("40001"), _)
                | (Some("40P01"), _) => {
                    StoreError::Concurrency(msg)
                }
                (Some("23503"), Some("bookings_golfer_id_fkey")) => StoreError::NotFound("golfer"),
                (Some("23503"), Some("bookings_tee_time_id_fkey")) => {
                    StoreError::NotFound("tee time")
                }
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

// SQLx row types

#[derive(Debug)]
struct GolferRow {
    id: uuid::Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for GolferRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(GolferRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<GolferRow> for Golfer {
    type Error = StoreError;

    fn try_from(row: GolferRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email)
            .map_err(|e| StoreError::Backend(format!("stored golfer {}: {e}", row.id)))?;
        Ok(Golfer::restore(
            GolferId::from_uuid(row.id),
            row.name,
            email,
            row.phone,
            row.notes,
            row.created_at,
            row.updated_at,
        ))
    }
}

#[derive(Debug)]
struct TeeTimeRow {
    id: uuid::Uuid,
    start_time: DateTime<Utc>,
    course_section: String,
    capacity: i64,
    available_slots: i64,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TeeTimeRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TeeTimeRow {
            id: row.try_get("id")?,
            start_time: row.try_get("start_time")?,
            course_section: row.try_get("course_section")?,
            capacity: row.try_get("capacity")?,
            available_slots: row.try_get("available_slots")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<TeeTimeRow> for TeeTime {
    type Error = StoreError;

    fn try_from(row: TeeTimeRow) -> Result<Self, Self::Error> {
        let out_of_range =
            |column: &str| StoreError::Backend(format!("stored tee time {}: {column} out of range", row.id));
        let capacity = u32::try_from(row.capacity).map_err(|_| out_of_range("capacity"))?;
        let available_slots =
            u32::try_from(row.available_slots).map_err(|_| out_of_range("available_slots"))?;
        let version = u64::try_from(row.version).map_err(|_| out_of_range("version"))?;

        Ok(TeeTime::restore(
            TeeTimeId::from_uuid(row.id),
            row.start_time,
            row.course_section,
            capacity,
            available_slots,
            version,
            row.created_at,
            row.updated_at,
        ))
    }
}

#[derive(Debug)]
struct BookingRow {
    id: uuid::Uuid,
    tee_time_id: uuid::Uuid,
    golfer_id: uuid::Uuid,
    number_of_players: i64,
    booking_time: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for BookingRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BookingRow {
            id: row.try_get("id")?,
            tee_time_id: row.try_get("tee_time_id")?,
            golfer_id: row.try_get("golfer_id")?,
            number_of_players: row.try_get("number_of_players")?,
            booking_time: row.try_get("booking_time")?,
        })
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let players = PlayerCount::new(row.number_of_players)
            .map_err(|e| StoreError::Backend(format!("stored booking {}: {e}", row.id)))?;
        Ok(Booking::restore(
            BookingId::from_uuid(row.id),
            TeeTimeId::from_uuid(row.tee_time_id),
            GolferId::from_uuid(row.golfer_id),
            players,
            row.booking_time,
        ))
    }
}
