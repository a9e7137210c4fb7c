//! Interned identifier types.
//!
//! Stops and routes are referenced by dense indices into the routing
//! dataset's vectors. The external string ids stay on the records
//! themselves; everything on the query path works with these copies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a stop in the routing dataset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopId(pub u32);

impl StopId {
    /// Returns the index as a `usize` for direct vector access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a route in the routing dataset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub u32);

impl RouteId {
    /// Returns the index as a `usize` for direct vector access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteId({})", self.0)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
