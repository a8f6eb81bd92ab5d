//! Parcel domain model.
//!
//! # Responsibility
//! - Define canonical data structures shared by storage and services.
//!
//! # Invariants
//! - Every persisted parcel is identified by a storage-assigned `ParcelNumber`.

pub mod parcel;
