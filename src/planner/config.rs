//! Planner configuration.

/// Tunables for the multimodal planner.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum transit boardings per journey (search rounds).
    pub max_rounds: usize,

    /// Maximum number of journeys to return.
    pub max_results: usize,

    /// Mobility vehicles considered per mode per side in hybrid
    /// expansion, ranked by road distance from the endpoint.
    pub hybrid_vehicles_per_mode: usize,

    /// Transit stops considered per access/egress vehicle, ranked by road
    /// distance from the vehicle.
    pub hybrid_stops_per_vehicle: usize,

    /// Chebyshev zone radius around the origin/destination zone from
    /// which hybrid vehicles are drawn.
    pub hybrid_zone_radius: u32,

    /// Hybrid expansion runs only when the strategy's mobility weight
    /// exceeds this floor.
    pub hybrid_mobility_floor: f64,

    /// Journeys sharing a transit sequence within this many seconds of
    /// total time are duplicates.
    pub dedup_window_secs: u32,

    /// Scale on the preference-weighted axis sum (α).
    pub score_alpha: f64,

    /// Scale on the mobility-affinity bonus (β).
    pub mobility_bonus_weight: f64,

    /// Scale on the strategy-alignment bonus (γ).
    pub strategy_bonus_weight: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            max_results: 5,
            hybrid_vehicles_per_mode: 5,
            hybrid_stops_per_vehicle: 5,
            hybrid_zone_radius: 1,
            hybrid_mobility_floor: 0.2,
            dedup_window_secs: 30,
            score_alpha: 1.0,
            mobility_bonus_weight: 0.2,
            strategy_bonus_weight: 0.3,
        }
    }
}
