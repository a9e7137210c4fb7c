//! Domain error types.
//!
//! These errors represent validation failures in journey construction.
//! They are distinct from dataset-load errors and query-level errors.

use thiserror::Error;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Journey has no segments
    #[error("journey must have at least one segment")]
    EmptyJourney,

    /// Consecutive segments don't share an endpoint
    #[error("segments {0} and {1} do not connect")]
    DisconnectedSegments(usize, usize),

    /// Journey arrival precedes its departure
    #[error("journey arrives before it departs")]
    ArrivalBeforeDeparture,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            DomainError::EmptyJourney.to_string(),
            "journey must have at least one segment"
        );
        assert_eq!(
            DomainError::DisconnectedSegments(0, 1).to_string(),
            "segments 0 and 1 do not connect"
        );
    }
}
