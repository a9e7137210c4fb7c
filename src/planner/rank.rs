//! Journey scoring and ranking.
//!
//! Candidates are first stripped of dominated journeys, then scored by
//! preference-weighted normalized axes minus mobility and strategy
//! bonuses, deduplicated, and returned best-first. Lower scores are
//! better.

use serde::Serialize;

use crate::domain::{Journey, RoutePreference};
use crate::zone::Strategy;

use super::config::PlannerConfig;

/// A journey with its preference score. Lower is better.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredJourney {
    pub journey: Journey,
    pub score: f64,
}

/// Remove dominated journeys.
///
/// A journey is dominated if another journey is no worse on every ranking
/// axis (total time, transfers, walk meters, cost) and strictly better on
/// at least one.
pub fn remove_dominated(journeys: Vec<Journey>) -> Vec<Journey> {
    if journeys.len() <= 1 {
        return journeys;
    }

    let mut result: Vec<Journey> = Vec::with_capacity(journeys.len());

    for journey in journeys {
        let dominated = result.iter().any(|existing| dominates(existing, &journey));
        if !dominated {
            result.retain(|existing| !dominates(&journey, existing));
            result.push(journey);
        }
    }

    result
}

fn dominates(a: &Journey, b: &Journey) -> bool {
    a.total_secs() <= b.total_secs()
        && a.transfer_count() <= b.transfer_count()
        && a.walk_meters() <= b.walk_meters()
        && a.cost() <= b.cost()
        && (a.total_secs() < b.total_secs()
            || a.transfer_count() < b.transfer_count()
            || a.walk_meters() < b.walk_meters()
            || a.cost() < b.cost())
}

/// Score every candidate against the field.
///
/// `score = α·Σ wᵢ·normalize(axisᵢ) − β·mobility_bonus − γ·strategy_bonus`
/// where each axis normalizes by the candidate maximum (clamped to [0,1]),
/// the mobility bonus is the mean mode affinity over ride segments, and
/// the strategy bonus rewards journeys whose mode split matches the
/// strategy weights.
pub fn score_journeys(
    journeys: Vec<Journey>,
    preference: &RoutePreference,
    strategy: Strategy,
    config: &PlannerConfig,
) -> Vec<ScoredJourney> {
    let max_time = journeys.iter().map(Journey::total_secs).max().unwrap_or(0) as f64;
    let max_transfers = journeys
        .iter()
        .map(Journey::transfer_count)
        .max()
        .unwrap_or(0) as f64;
    let max_walk = journeys
        .iter()
        .map(Journey::walk_meters)
        .fold(0.0f64, f64::max);
    let max_cost = journeys.iter().map(Journey::cost).max().unwrap_or(0) as f64;

    journeys
        .into_iter()
        .map(|journey| {
            let axes = preference.time_weight * normalize(journey.total_secs() as f64, max_time)
                + preference.transfer_weight
                    * normalize(journey.transfer_count() as f64, max_transfers)
                + preference.walk_weight * normalize(journey.walk_meters(), max_walk)
                + preference.cost_weight * normalize(journey.cost() as f64, max_cost);

            let score = config.score_alpha * axes
                - config.mobility_bonus_weight * mobility_bonus(&journey, preference)
                - config.strategy_bonus_weight * strategy_bonus(&journey, strategy);

            ScoredJourney { journey, score }
        })
        .collect()
}

fn normalize(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Mean mode affinity over the journey's mobility segments; 0 without any.
fn mobility_bonus(journey: &Journey, preference: &RoutePreference) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for segment in journey.rides() {
        if let Some(mode) = segment.ride_mode() {
            sum += preference.mobility_preference.for_mode(mode);
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// How well the journey's time split matches the strategy weights.
fn strategy_bonus(journey: &Journey, strategy: Strategy) -> f64 {
    let total = journey.total_secs() as f64;
    if total <= 0.0 {
        return 0.0;
    }
    strategy.mobility_weight * (journey.mobility_secs() as f64 / total)
        + strategy.transit_weight * (journey.transit_secs() as f64 / total)
}

/// Drop near-identical journeys, keeping the better-scored one.
///
/// Two journeys are duplicates when they board the same transit routes in
/// the same order, use the same ride modes in the same order, and their
/// total times differ by at most `window_secs`. Expects input sorted by
/// ascending score.
pub fn deduplicate(scored: Vec<ScoredJourney>, window_secs: u32) -> Vec<ScoredJourney> {
    let mut result: Vec<ScoredJourney> = Vec::with_capacity(scored.len());

    for candidate in scored {
        let duplicate = result.iter().any(|kept| {
            kept.journey.transit_sequence() == candidate.journey.transit_sequence()
                && ride_modes(&kept.journey) == ride_modes(&candidate.journey)
                && kept.journey.total_secs().abs_diff(candidate.journey.total_secs())
                    <= window_secs
        });
        if !duplicate {
            result.push(candidate);
        }
    }

    result
}

fn ride_modes(journey: &Journey) -> Vec<crate::domain::MobilityMode> {
    journey.rides().filter_map(|s| s.ride_mode()).collect()
}
