//! Parcel store contract and SQLite implementation.
//!
//! # Responsibility
//! - Map `Parcel` records to and from rows of the `parcel` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `number` is assigned by SQLite on insert and never reused.
//! - `created_at` and `client` are written once by `add` and never updated.
//! - Mutations that match no row report `RepoError::NotFound`.
//! - No status-transition or address policy is enforced here; the `*_if`
//!   variants only compare against a caller-supplied status in the same
//!   statement as the write.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

const PARCEL_COLUMNS: [&str; 5] = ["number", "client", "status", "address", "created_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Parcel store error.
///
/// `NotFound` is the only "absent" signal and `StatusMismatch` the only
/// failed precondition; every other variant is a backing store failure.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(ParcelNumber),
    StatusMismatch {
        number: ParcelNumber,
        expected: ParcelStatus,
        actual: ParcelStatus,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Returns whether this error means the requested parcel does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::StatusMismatch {
                number,
                expected,
                actual,
            } => write!(
                f,
                "parcel {number} is `{actual}`, expected `{expected}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted parcel data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access contract for parcel records.
pub trait ParcelStore {
    /// Persists a new parcel and returns its assigned number.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;
    /// Loads one parcel or fails with `RepoError::NotFound`.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Loads every parcel owned by `client`; empty when there are none.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()>;
    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()>;
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
    /// Updates the address only while the parcel is still in `expected`.
    fn set_address_if(
        &self,
        number: ParcelNumber,
        address: &str,
        expected: ParcelStatus,
    ) -> RepoResult<()>;
    /// Moves `from -> to` only if the parcel is still in `from`.
    fn set_status_if(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> RepoResult<()>;
    /// Deletes the parcel only while it is still in `expected`.
    fn delete_if(&self, number: ParcelNumber, expected: ParcelStatus) -> RepoResult<()>;
}

/// SQLite-backed parcel store borrowing a caller-owned connection.
pub struct SqliteParcelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelStore<'conn> {
    /// Constructs a store from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the `parcel`
    ///   table does not have the expected shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_parcel_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ParcelStore for SqliteParcelStore<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        self.conn.execute(
            "INSERT INTO parcel (client, status, address, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                parcel.client,
                parcel.status.as_str(),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"))?;

        let row = stmt
            .query_row([number], |row| Ok(parse_parcel_row(row)))
            .optional()?;

        match row {
            Some(parcel) => parcel,
            None => Err(RepoError::NotFound(number)),
        }
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{PARCEL_SELECT_SQL} WHERE client = ?1 ORDER BY number ASC;"
        ))?;

        let mut rows = stmt.query([client])?;
        let mut parcels = Vec::new();
        while let Some(row) = rows.next()? {
            parcels.push(parse_parcel_row(row)?);
        }

        Ok(parcels)
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET address = ?2 WHERE number = ?1;",
            params![number, address],
        )?;
        require_changed(changed, number)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?2 WHERE number = ?1;",
            params![number, status.as_str()],
        )?;
        require_changed(changed, number)
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM parcel WHERE number = ?1;", [number])?;
        require_changed(changed, number)
    }

    fn set_address_if(
        &self,
        number: ParcelNumber,
        address: &str,
        expected: ParcelStatus,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET address = ?2 WHERE number = ?1 AND status = ?3;",
            params![number, address, expected.as_str()],
        )?;
        self.require_changed_if(changed, number, expected)
    }

    fn set_status_if(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?2 WHERE number = ?1 AND status = ?3;",
            params![number, to.as_str(), from.as_str()],
        )?;
        self.require_changed_if(changed, number, from)
    }

    fn delete_if(&self, number: ParcelNumber, expected: ParcelStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM parcel WHERE number = ?1 AND status = ?2;",
            params![number, expected.as_str()],
        )?;
        self.require_changed_if(changed, number, expected)
    }
}

impl SqliteParcelStore<'_> {
    /// Explains a conditional write that matched no row.
    fn require_changed_if(
        &self,
        changed: usize,
        number: ParcelNumber,
        expected: ParcelStatus,
    ) -> RepoResult<()> {
        if changed > 0 {
            return Ok(());
        }
        let actual = self.get(number)?.status;
        Err(RepoError::StatusMismatch {
            number,
            expected,
            actual,
        })
    }
}

fn require_changed(changed: usize, number: ParcelNumber) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(number));
    }
    Ok(())
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let status_text: String = row.get("status")?;
    let status = status_text.parse::<ParcelStatus>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid parcel status `{status_text}` in parcel.status"
        ))
    })?;

    Ok(Parcel {
        number: row.get("number")?,
        client: row.get("client")?,
        status,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    })
}

fn ensure_parcel_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "parcel")? {
        return Err(RepoError::MissingRequiredTable("parcel"));
    }

    for column in PARCEL_COLUMNS {
        if !table_has_column(conn, "parcel", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "parcel",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
