//! User preference profile.
//!
//! A `RoutePreference` weights the four ranking axes (time, transfers,
//! walking, cost) and records per-mode mobility affinity plus walking
//! limits. Preferences arrive from callers as structs or JSON; unknown
//! JSON keys are rejected rather than silently dropped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MobilityMode;

/// Error returned for an out-of-range or degenerate preference profile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreferenceError {
    /// A weight or preference value lies outside [0, 1]
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    /// All four axis weights are zero
    #[error("at least one axis weight must be positive")]
    AllWeightsZero,

    /// A walking limit is not a positive finite number of meters
    #[error("{field} must be positive meters, got {value}")]
    InvalidWalkLimit { field: &'static str, value: f64 },
}

/// Per-mode mobility affinity in [0, 1]; higher means preferred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MobilityPreference {
    pub bike: f64,
    pub kickboard: f64,
    pub ebike: f64,
}

impl Default for MobilityPreference {
    fn default() -> Self {
        Self {
            bike: 0.8,
            kickboard: 0.6,
            ebike: 0.7,
        }
    }
}

impl MobilityPreference {
    /// Affinity for a mode.
    pub fn for_mode(&self, mode: MobilityMode) -> f64 {
        match mode {
            MobilityMode::Bike => self.bike,
            MobilityMode::Kickboard => self.kickboard,
            MobilityMode::Ebike => self.ebike,
        }
    }
}

/// Query-time ranking preferences.
///
/// The four axis weights are relative; `validated()` normalizes them to
/// sum to 1. Serde rejects unknown keys, so a typo in a JSON profile is an
/// error instead of a silently ignored field.
///
/// # Examples
///
/// ```
/// use journey_planner::domain::RoutePreference;
///
/// let pref: RoutePreference =
///     serde_json::from_str(r#"{ "time_weight": 0.7, "cost_weight": 0.3 }"#).unwrap();
/// assert!(pref.validated().is_ok());
///
/// // Unknown keys are rejected at construction.
/// assert!(serde_json::from_str::<RoutePreference>(r#"{ "speed_weight": 1.0 }"#).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RoutePreference {
    /// Importance of total travel time.
    pub time_weight: f64,

    /// Importance of transfer count.
    pub transfer_weight: f64,

    /// Importance of walking distance.
    pub walk_weight: f64,

    /// Importance of fare cost.
    pub cost_weight: f64,

    /// Per-mode mobility affinity.
    pub mobility_preference: MobilityPreference,

    /// Longest acceptable pure-walk journey, meters.
    pub max_walk_distance: f64,

    /// Longest acceptable walk to reach a stop or vehicle, meters.
    pub max_walk_to_stop: f64,
}

impl Default for RoutePreference {
    fn default() -> Self {
        Self {
            time_weight: 0.4,
            transfer_weight: 0.3,
            walk_weight: 0.2,
            cost_weight: 0.1,
            mobility_preference: MobilityPreference::default(),
            max_walk_distance: 800.0,
            max_walk_to_stop: 500.0,
        }
    }
}

impl RoutePreference {
    /// Validate ranges and return a copy with the axis weights normalized
    /// to sum to 1.
    pub fn validated(&self) -> Result<Self, PreferenceError> {
        let weights = [
            ("time_weight", self.time_weight),
            ("transfer_weight", self.transfer_weight),
            ("walk_weight", self.walk_weight),
            ("cost_weight", self.cost_weight),
        ];
        for (field, value) in weights {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(PreferenceError::OutOfRange { field, value });
            }
        }

        let prefs = [
            ("mobility_preference.bike", self.mobility_preference.bike),
            (
                "mobility_preference.kickboard",
                self.mobility_preference.kickboard,
            ),
            ("mobility_preference.ebike", self.mobility_preference.ebike),
        ];
        for (field, value) in prefs {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(PreferenceError::OutOfRange { field, value });
            }
        }

        let limits = [
            ("max_walk_distance", self.max_walk_distance),
            ("max_walk_to_stop", self.max_walk_to_stop),
        ];
        for (field, value) in limits {
            if !value.is_finite() || value <= 0.0 {
                return Err(PreferenceError::InvalidWalkLimit { field, value });
            }
        }

        let sum = self.time_weight + self.transfer_weight + self.walk_weight + self.cost_weight;
        if sum <= 0.0 {
            return Err(PreferenceError::AllWeightsZero);
        }

        Ok(Self {
            time_weight: self.time_weight / sum,
            transfer_weight: self.transfer_weight / sum,
            walk_weight: self.walk_weight / sum,
            cost_weight: self.cost_weight / sum,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_already_normalized() {
        let pref = RoutePreference::default().validated().unwrap();
        let sum = pref.time_weight + pref.transfer_weight + pref.walk_weight + pref.cost_weight;
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(pref.time_weight, 0.4);
    }

    #[test]
    fn normalization_scales_weights() {
        let pref = RoutePreference {
            time_weight: 1.0,
            transfer_weight: 1.0,
            walk_weight: 0.0,
            cost_weight: 0.0,
            ..Default::default()
        };
        let v = pref.validated().unwrap();
        assert!((v.time_weight - 0.5).abs() < 1e-12);
        assert!((v.transfer_weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_weight() {
        let pref = RoutePreference {
            time_weight: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            pref.validated(),
            Err(PreferenceError::OutOfRange { field: "time_weight", .. })
        ));
    }

    #[test]
    fn rejects_all_zero_weights() {
        let pref = RoutePreference {
            time_weight: 0.0,
            transfer_weight: 0.0,
            walk_weight: 0.0,
            cost_weight: 0.0,
            ..Default::default()
        };
        assert!(matches!(pref.validated(), Err(PreferenceError::AllWeightsZero)));
    }

    #[test]
    fn rejects_negative_walk_limit() {
        let pref = RoutePreference {
            max_walk_distance: -10.0,
            ..Default::default()
        };
        assert!(matches!(
            pref.validated(),
            Err(PreferenceError::InvalidWalkLimit { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_mobility_preference() {
        let pref = RoutePreference {
            mobility_preference: MobilityPreference {
                kickboard: 2.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(pref.validated().is_err());
    }

    #[test]
    fn unknown_json_keys_rejected() {
        let err = serde_json::from_str::<RoutePreference>(r#"{ "nonsense": 1 }"#);
        assert!(err.is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let pref: RoutePreference = serde_json::from_str(r#"{ "walk_weight": 0.9 }"#).unwrap();
        assert_eq!(pref.walk_weight, 0.9);
        assert_eq!(pref.max_walk_distance, 800.0);
    }

    #[test]
    fn mode_lookup() {
        let mp = MobilityPreference::default();
        assert_eq!(mp.for_mode(MobilityMode::Bike), 0.8);
        assert_eq!(mp.for_mode(MobilityMode::Kickboard), 0.6);
        assert_eq!(mp.for_mode(MobilityMode::Ebike), 0.7);
    }
}
