//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for parcel records.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return a semantic `NotFound` error in addition to DB
//!   transport errors.

pub mod parcel_repo;
