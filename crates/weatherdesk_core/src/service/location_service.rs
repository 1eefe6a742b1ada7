//! Saved location use-case service.
//!
//! # Responsibility
//! - Save favorites and the detected current location.
//! - Serve the favorites list in dropdown order.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Writes that return a record read it back from storage.

use crate::model::location::{LocationId, LocationPatch, NewLocation, SavedLocation};
use crate::repo::location_repo::{LocationListQuery, LocationOrder, LocationRepository};
use crate::repo::{RepoError, RepoResult};

/// Use-case service wrapper for saved location operations.
pub struct LocationService<R: LocationRepository> {
    repo: R,
}

impl<R: LocationRepository> LocationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves a location and returns the stored record.
    ///
    /// A location saved with `is_current = true` replaces the previous
    /// current location.
    pub fn save_location(&self, location: &NewLocation) -> RepoResult<SavedLocation> {
        let id = self.repo.create_location(location)?;
        self.require_location(id)
    }

    /// Lists saved locations with the current one first, newest next.
    pub fn favorites(&self, limit: Option<u32>) -> RepoResult<Vec<SavedLocation>> {
        self.repo.list_locations(&LocationListQuery {
            order: LocationOrder::CurrentFirst,
            limit,
            ..LocationListQuery::default()
        })
    }

    pub fn current_location(&self) -> RepoResult<Option<SavedLocation>> {
        let mut current = self.repo.list_locations(&LocationListQuery {
            current_only: true,
            order: LocationOrder::CurrentFirst,
            limit: Some(1),
            offset: 0,
        })?;
        Ok(current.pop())
    }

    pub fn get_location(&self, id: LocationId) -> RepoResult<Option<SavedLocation>> {
        self.repo.get_location(id)
    }

    pub fn list_locations(&self, query: &LocationListQuery) -> RepoResult<Vec<SavedLocation>> {
        self.repo.list_locations(query)
    }

    /// Applies a partial update and returns the updated record.
    pub fn update_location(
        &self,
        id: LocationId,
        patch: &LocationPatch,
    ) -> RepoResult<SavedLocation> {
        self.repo.update_location(id, patch)?;
        self.require_location(id)
    }

    pub fn delete_location(&self, id: LocationId) -> RepoResult<()> {
        self.repo.delete_location(id)
    }

    fn require_location(&self, id: LocationId) -> RepoResult<SavedLocation> {
        self.repo.get_location(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("saved location {id} missing after write"))
        })
    }
}
