//! The grid registry — catalog, authorized devices, and membership.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::error::{MarketError, Result};
use crate::event::MarketEvent;
use crate::grid::types::{Grid, GridId};

/// Name of the grid seeded at construction.
pub const SEED_GRID_NAME: &str = "Grid-1";
/// Country code of the seeded grid.
pub const SEED_GRID_COUNTRY_CODE: &str = "SE";
/// Country name of the seeded grid.
pub const SEED_GRID_COUNTRY_NAME: &str = "Sweden";

/// Registry of grids, authorized devices, and one-grid-per-user
/// membership.
///
/// Exactly one grid is seeded at construction so the registry is never
/// empty. Grids are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRegistry {
    /// This store's own address.
    account: AccountId,
    /// Administrator (the constructing identity).
    admin: AccountId,
    /// Identities permitted to create grids besides the administrator.
    devices: HashSet<AccountId>,
    /// All grids, keyed by id.
    grids: HashMap<GridId, Grid>,
    /// Grid ids in insertion order.
    grid_order: Vec<GridId>,
    /// At most one entry per user, never removed once set.
    membership: HashMap<AccountId, GridId>,
    /// Emitted events, in emission order.
    events: Vec<MarketEvent>,
}

impl GridRegistry {
    /// Create a registry owned by `admin`, addressable as `account`,
    /// seeded with the default grid.
    pub fn new(account: AccountId, admin: AccountId) -> Self {
        let mut registry = Self {
            account,
            admin: admin.clone(),
            devices: HashSet::new(),
            grids: HashMap::new(),
            grid_order: Vec::new(),
            membership: HashMap::new(),
            events: Vec::new(),
        };
        registry.insert_grid(
            SEED_GRID_NAME,
            SEED_GRID_COUNTRY_CODE,
            SEED_GRID_COUNTRY_NAME,
            admin,
        );
        registry
    }

    /// This store's own address.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    fn insert_grid(
        &mut self,
        name: &str,
        country_code: &str,
        country_name: &str,
        created_by: AccountId,
    ) -> GridId {
        let id = GridId::derive(name, country_code);
        let grid = Grid {
            id: id.clone(),
            name: name.to_string(),
            country_code: country_code.to_string(),
            country_name: country_name.to_string(),
            member_count: 0,
            created_by: created_by.clone(),
            exists: true,
        };
        self.grid_order.push(id.clone());
        self.grids.insert(id.clone(), grid);
        self.events.push(MarketEvent::GridCreated {
            grid_id: id.clone(),
            created_by,
        });
        id
    }

    /// Register a new grid and return its content-addressed id.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` unless the caller is the administrator or
    /// an authorized device, and `DuplicateGridId` if a grid with the
    /// same `(name, country_code)` already exists.
    pub fn create_grid(
        &mut self,
        caller: &AccountId,
        name: &str,
        country_code: &str,
        country_name: &str,
    ) -> Result<GridId> {
        if caller != &self.admin && !self.devices.contains(caller) {
            return Err(MarketError::NotAuthorized);
        }
        let id = GridId::derive(name, country_code);
        if self.grids.contains_key(&id) {
            return Err(MarketError::DuplicateGridId(id));
        }
        Ok(self.insert_grid(name, country_code, country_name, caller.clone()))
    }

    /// Add `device` to the authorized-device set.
    ///
    /// # Errors
    ///
    /// Returns `NotAdmin` if the caller is not the administrator.
    pub fn add_authorized_device(&mut self, caller: &AccountId, device: AccountId) -> Result<()> {
        if caller != &self.admin {
            return Err(MarketError::NotAdmin);
        }
        self.devices.insert(device.clone());
        self.events.push(MarketEvent::DeviceAuthorized { device });
        Ok(())
    }

    /// All grid ids, in insertion order.
    pub fn grid_ids(&self) -> &[GridId] {
        &self.grid_order
    }

    /// All grid records, in the same order as [`grid_ids`].
    ///
    /// [`grid_ids`]: GridRegistry::grid_ids
    pub fn grids(&self) -> Vec<Grid> {
        self.grid_order
            .iter()
            .filter_map(|id| self.grids.get(id))
            .cloned()
            .collect()
    }

    /// Whether a grid with `grid_id` exists.
    pub fn contains_grid(&self, grid_id: &GridId) -> bool {
        self.grids.contains_key(grid_id)
    }

    /// Connect the caller to a grid.
    ///
    /// # Errors
    ///
    /// Returns `NoGridFound` for an unknown id and `UserAlreadyInGrid`
    /// if the caller already holds a membership — in any grid, including
    /// this one.
    pub fn join_grid(&mut self, caller: &AccountId, grid_id: &GridId) -> Result<()> {
        let grid = self
            .grids
            .get_mut(grid_id)
            .ok_or(MarketError::NoGridFound)?;
        if self.membership.contains_key(caller) {
            return Err(MarketError::UserAlreadyInGrid);
        }
        grid.member_count += 1;
        self.membership.insert(caller.clone(), grid_id.clone());
        self.events.push(MarketEvent::MemberJoined {
            grid_id: grid_id.clone(),
            user: caller.clone(),
        });
        Ok(())
    }

    /// Whether `user` holds a membership.
    ///
    /// # Errors
    ///
    /// Returns `NoUserInGrid` if `user` never joined a grid.
    pub fn is_connected(&self, user: &AccountId) -> Result<bool> {
        if self.membership.contains_key(user) {
            Ok(true)
        } else {
            Err(MarketError::NoUserInGrid)
        }
    }

    /// The full grid record `user` belongs to.
    ///
    /// # Errors
    ///
    /// Returns `NoUserInGrid` if `user` never joined a grid.
    pub fn user_grid(&self, user: &AccountId) -> Result<&Grid> {
        let id = self.membership.get(user).ok_or(MarketError::NoUserInGrid)?;
        // Grids are never deleted, so a held membership always resolves.
        self.grids.get(id).ok_or(MarketError::NoGridFound)
    }

    /// Events emitted so far, in emission order.
    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<MarketEvent> {
        std::mem::take(&mut self.events)
    }
}
