//! Handle registry: the host-side map from handles to ciphertext records.
//!
//! Each admitted or derived handle owns exactly one record carrying its
//! kind, its backing plaintext (the simulation stand-in for the real
//! ciphertext), and the contract that created it. The registry enforces
//! handle uniqueness and a configurable capacity bound.

use std::collections::HashMap;

use thiserror::Error;

use crate::handle::{CiphertextKind, Handle, Principal};

/// Errors raised by registry insertion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry is full.
    #[error("handle registry capacity exceeded: limit {limit}")]
    CapacityExceeded {
        /// The configured capacity.
        limit: usize,
    },

    /// A record already exists for this handle.
    #[error("duplicate handle: {handle}")]
    DuplicateHandle {
        /// The colliding handle.
        handle: Handle,
    },
}

/// The ciphertext record backing one handle.
#[derive(Debug, Clone)]
pub struct CiphertextRecord {
    /// The plaintext type of the ciphertext.
    pub kind: CiphertextKind,
    /// The contract that created the handle (the grant-issuance holder).
    pub holder: Principal,
    /// The backing plaintext, masked to the kind's width.
    ///
    /// In the real system this is an opaque ciphertext; the simulation
    /// keeps the plaintext private to the host so that nothing outside
    /// the permission gate can observe it.
    value: u128,
}

impl CiphertextRecord {
    pub(crate) fn new(kind: CiphertextKind, holder: Principal, value: u128) -> Self {
        Self {
            kind,
            holder,
            value: value & kind.mask(),
        }
    }

    /// The backing plaintext. Host-internal; release goes through the gate.
    pub(crate) const fn value(&self) -> u128 {
        self.value
    }
}

/// Map from handles to ciphertext records, bounded by capacity.
#[derive(Debug)]
pub struct HandleRegistry {
    records: HashMap<Handle, CiphertextRecord>,
    capacity: usize,
}

impl HandleRegistry {
    /// Creates an empty registry holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: HashMap::new(),
            capacity,
        }
    }

    /// Inserts a record for a freshly minted handle.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` when the registry is full and
    /// `DuplicateHandle` when the handle already has a record.
    pub fn insert(&mut self, handle: Handle, record: CiphertextRecord) -> Result<(), RegistryError> {
        if self.records.contains_key(&handle) {
            return Err(RegistryError::DuplicateHandle { handle });
        }
        if self.records.len() >= self.capacity {
            return Err(RegistryError::CapacityExceeded {
                limit: self.capacity,
            });
        }
        self.records.insert(handle, record);
        Ok(())
    }

    /// Looks up the record for a handle.
    #[must_use]
    pub fn get(&self, handle: &Handle) -> Option<&CiphertextRecord> {
        self.records.get(handle)
    }

    /// Returns `true` if the handle has a record.
    #[must_use]
    pub fn contains(&self, handle: &Handle) -> bool {
        self.records.contains_key(handle)
    }

    /// Number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no handles are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
