//! Shared/personal overlay over a folder snapshot.
//!
//! The resolver never talks to a store. It is built from the records of one
//! `(environment, path)` folder and answers lookups against that snapshot,
//! so repeated calls always agree.

use std::collections::BTreeMap;

use crate::error::{Result, SecretError};
use crate::types::{SecretRecord, SecretType};

/// Which record a name lookup selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// The personal record if present, otherwise the shared one.
    PersonalFirst,
    /// Exactly the record of this type.
    Only(SecretType),
}

impl Precedence {
    /// Lookup rule for reads. Asking for shared reads the shared record
    /// only; personal or unspecified lets a personal value shadow it.
    pub fn for_read(requested: Option<SecretType>) -> Self {
        match requested {
            Some(SecretType::Shared) => Self::Only(SecretType::Shared),
            Some(SecretType::Personal) | None => Self::PersonalFirst,
        }
    }

    /// Lookup rule for update/delete. An explicit type targets exactly that
    /// record so shared and personal values stay independently mutable.
    pub fn for_write(requested: Option<SecretType>) -> Self {
        match requested {
            Some(secret_type) => Self::Only(secret_type),
            None => Self::PersonalFirst,
        }
    }

    /// Lookup rule for `${NAME}` references. The referrer's own type does
    /// not matter: a personal override is visible everywhere in the folder.
    pub fn for_references() -> Self {
        Self::PersonalFirst
    }
}

#[derive(Debug, Default)]
struct Slot {
    shared: Option<SecretRecord>,
    personal: Option<SecretRecord>,
}

/// Read-only overlay of one folder's shared and personal records.
#[derive(Debug)]
pub struct OverlayResolver {
    environment: String,
    path: String,
    slots: BTreeMap<String, Slot>,
}

impl OverlayResolver {
    /// Build from a snapshot. Records outside `(environment, path)` are
    /// ignored; a later duplicate of the same `(name, type)` replaces an
    /// earlier one.
    pub fn new(
        environment: impl Into<String>,
        path: impl Into<String>,
        records: impl IntoIterator<Item = SecretRecord>,
    ) -> Self {
        let environment = environment.into();
        let path = path.into();
        let mut slots: BTreeMap<String, Slot> = BTreeMap::new();

        for record in records {
            if !record.scope.same_folder(&environment, &path) {
                continue;
            }
            let slot = slots.entry(record.name.clone()).or_default();
            match record.scope.secret_type {
                SecretType::Shared => slot.shared = Some(record),
                SecretType::Personal => slot.personal = Some(record),
            }
        }

        Self {
            environment,
            path,
            slots,
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Select the visible record for `name`.
    pub fn resolve_single(&self, name: &str, precedence: Precedence) -> Result<&SecretRecord> {
        let found = self.slots.get(name).and_then(|slot| match precedence {
            Precedence::PersonalFirst => slot.personal.as_ref().or(slot.shared.as_ref()),
            Precedence::Only(SecretType::Shared) => slot.shared.as_ref(),
            Precedence::Only(SecretType::Personal) => slot.personal.as_ref(),
        });

        found.ok_or_else(|| SecretError::NotFound {
            name: name.to_string(),
            environment: self.environment.clone(),
            path: self.path.clone(),
        })
    }

    /// Every record in the folder, shared and personal, without
    /// deduplication. Ordered by name, shared before personal.
    pub fn resolve_all(&self) -> Vec<&SecretRecord> {
        self.slots
            .values()
            .flat_map(|slot| slot.shared.iter().chain(slot.personal.iter()))
            .collect()
    }

    /// One record per name, personal preferred.
    pub fn resolve_effective(&self) -> Vec<&SecretRecord> {
        self.slots
            .values()
            .filter_map(|slot| slot.personal.as_ref().or(slot.shared.as_ref()))
            .collect()
    }

    /// Number of records (not names) in the snapshot.
    pub fn len(&self) -> usize {
        self.slots
            .values()
            .map(|s| usize::from(s.shared.is_some()) + usize::from(s.personal.is_some()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
