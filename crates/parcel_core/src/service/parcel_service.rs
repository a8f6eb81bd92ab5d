//! Parcel use-case service.
//!
//! # Responsibility
//! - Provide registration, tracking and lifecycle entry points.
//! - Enforce lifecycle policy the store leaves to its callers.
//!
//! # Invariants
//! - Status only moves forward: `registered -> sent -> delivered`.
//! - Address changes and deletion are allowed only while `registered`.
//! - Service layer remains storage-agnostic.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelStore, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from parcel lifecycle operations.
#[derive(Debug)]
pub enum ServiceError {
    /// New address is blank after trim.
    BlankAddress,
    /// Operation requires `registered`, parcel is in another state.
    NotRegistered {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    /// Parcel has no further status to advance to.
    AlreadyDelivered(ParcelNumber),
    /// Store-level failure, including `RepoError::NotFound`.
    Repo(RepoError),
}

impl ServiceError {
    /// Returns whether the underlying cause is a missing parcel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_not_found())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankAddress => write!(f, "parcel address must not be blank"),
            Self::NotRegistered { number, status } => write!(
                f,
                "parcel {number} is `{status}`; only registered parcels can be changed"
            ),
            Self::AlreadyDelivered(number) => write!(f, "parcel {number} is already delivered"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapping a parcel store.
pub struct ParcelService<S: ParcelStore> {
    store: S,
}

impl<S: ParcelStore> ParcelService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new parcel for `client` and returns the stored record.
    pub fn register(&self, client: ClientId, address: &str) -> ServiceResult<Parcel> {
        let address = normalize_address(address)?;
        let mut parcel = Parcel::new(client, address);
        parcel.number = self.store.add(&parcel)?;

        info!(
            "event=parcel_register module=service status=ok number={} client={}",
            parcel.number, parcel.client
        );
        Ok(parcel)
    }

    pub fn parcel(&self, number: ParcelNumber) -> ServiceResult<Parcel> {
        Ok(self.store.get(number)?)
    }

    pub fn client_parcels(&self, client: ClientId) -> ServiceResult<Vec<Parcel>> {
        Ok(self.store.get_by_client(client)?)
    }

    /// Advances the parcel to its next lifecycle status and returns it.
    ///
    /// The write only applies if no other writer moved the parcel since it
    /// was read; otherwise `RepoError::StatusMismatch` is returned.
    pub fn next_status(&self, number: ParcelNumber) -> ServiceResult<ParcelStatus> {
        let current = self.store.get(number)?.status;
        let next = current
            .next()
            .ok_or(ServiceError::AlreadyDelivered(number))?;
        self.store.set_status_if(number, current, next)?;

        info!(
            "event=parcel_status module=service status=ok number={} from={} to={}",
            number, current, next
        );
        Ok(next)
    }

    /// Replaces the delivery address of a registered parcel.
    pub fn change_address(&self, number: ParcelNumber, address: &str) -> ServiceResult<()> {
        let address = normalize_address(address)?;
        self.store
            .set_address_if(number, address, ParcelStatus::Registered)
            .map_err(not_registered)?;

        info!("event=parcel_address module=service status=ok number={number}");
        Ok(())
    }

    /// Deletes a registered parcel. Parcels already sent are kept.
    pub fn delete(&self, number: ParcelNumber) -> ServiceResult<()> {
        self.store
            .delete_if(number, ParcelStatus::Registered)
            .map_err(not_registered)?;

        info!("event=parcel_delete module=service status=ok number={number}");
        Ok(())
    }
}

fn not_registered(err: RepoError) -> ServiceError {
    match err {
        RepoError::StatusMismatch { number, actual, .. } => ServiceError::NotRegistered {
            number,
            status: actual,
        },
        other => ServiceError::Repo(other),
    }
}

fn normalize_address(address: &str) -> ServiceResult<&str> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BlankAddress);
    }
    Ok(trimmed)
}
