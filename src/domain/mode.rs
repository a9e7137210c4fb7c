//! Shared micro-mobility modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The micro-mobility vehicle kinds the planner can route over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MobilityMode {
    /// Docked bike-share.
    Bike,
    /// Free-floating electric kick scooter.
    Kickboard,
    /// Free-floating electric bike.
    Ebike,
}

impl MobilityMode {
    /// All modes, in a stable order.
    pub const ALL: [MobilityMode; 3] = [
        MobilityMode::Bike,
        MobilityMode::Kickboard,
        MobilityMode::Ebike,
    ];

    /// Lowercase label used in serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            MobilityMode::Bike => "bike",
            MobilityMode::Kickboard => "kickboard",
            MobilityMode::Ebike => "ebike",
        }
    }
}

impl fmt::Display for MobilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&MobilityMode::Kickboard).unwrap(),
            "\"kickboard\""
        );
        let parsed: MobilityMode = serde_json::from_str("\"ebike\"").unwrap();
        assert_eq!(parsed, MobilityMode::Ebike);
    }

    #[test]
    fn all_covers_every_mode() {
        assert_eq!(MobilityMode::ALL.len(), 3);
    }
}
