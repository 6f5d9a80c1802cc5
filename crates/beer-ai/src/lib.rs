#![deny(warnings)]

//! Ordering policy for AI-controlled roles.
//!
//! Each behavior profile is a parameter tuple fed to one shared heuristic:
//! forecast demand, aim for a few weeks of cover plus part of the backlog,
//! correct part of the inventory gap, smooth against the previous order,
//! bound the week-over-week swing, then perturb with seeded noise.

use beer_core::{AiProfile, ProfileOverride, RoleState};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Demand assumed when an observed or average demand is unusable.
pub const FALLBACK_DEMAND: f64 = 4.0;

/// Parameter tuple driving [`decide_order`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileParams {
    /// Target weeks of demand held as safety stock.
    pub cover_weeks: f64,
    /// How strongly backorder inflates the target.
    pub backlog_weight: f64,
    /// Share of the inventory gap corrected per round.
    pub inv_adjust_weight: f64,
    /// Weight retained from the previous order.
    pub smoothing: f64,
    /// Symmetric multiplicative noise fraction.
    pub noise_level: f64,
}

impl ProfileParams {
    /// Default parameters of a named profile.
    pub fn for_profile(profile: AiProfile) -> Self {
        match profile {
            AiProfile::Panic => Self {
                cover_weeks: 3.0,
                backlog_weight: 1.6,
                inv_adjust_weight: 0.9,
                smoothing: 0.3,
                noise_level: 0.25,
            },
            AiProfile::Safe => Self {
                cover_weeks: 2.0,
                backlog_weight: 1.2,
                inv_adjust_weight: 0.7,
                smoothing: 0.6,
                noise_level: 0.15,
            },
            AiProfile::Calm => Self {
                cover_weeks: 1.2,
                backlog_weight: 0.7,
                inv_adjust_weight: 0.5,
                smoothing: 0.8,
                noise_level: 0.07,
            },
        }
    }

    /// Replace each parameter the override supplies.
    pub fn merged(self, o: &ProfileOverride) -> Self {
        Self {
            cover_weeks: o.cover_weeks.unwrap_or(self.cover_weeks),
            backlog_weight: o.backlog_weight.unwrap_or(self.backlog_weight),
            inv_adjust_weight: o.inv_adjust_weight.unwrap_or(self.inv_adjust_weight),
            smoothing: o.smoothing.unwrap_or(self.smoothing),
            noise_level: o.noise_level.unwrap_or(self.noise_level),
        }
    }

    /// Profile defaults with an optional per-role override applied.
    pub fn resolve(profile: AiProfile, o: Option<&ProfileOverride>) -> Self {
        let base = Self::for_profile(profile);
        match o {
            Some(o) => base.merged(o),
            None => base,
        }
    }

    /// Same parameters without noise.
    pub fn without_noise(self) -> Self {
        Self { noise_level: 0.0, ..self }
    }
}

/// Average demand estimate from a role's order history.
pub fn average_demand(state: &RoleState) -> f64 {
    state.average_order().unwrap_or(FALLBACK_DEMAND)
}

fn usable(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        FALLBACK_DEMAND
    }
}

/// Order quantity before noise and rounding.
///
/// When the role has a nonzero previous order the result lies within
/// `[0.5, 1.5]` times that order; otherwise within the same band around
/// the (guarded) demand.
pub fn planned_order(state: &RoleState, demand: f64, avg_demand: f64, p: &ProfileParams) -> f64 {
    let demand = usable(demand);
    let avg_demand = usable(avg_demand);

    let forecast = 0.6 * demand + 0.4 * avg_demand;
    // Not `clamp`: the upper bound may fall below current demand.
    let forecast = demand.max(forecast.min(avg_demand * 1.5));

    let target_stock = forecast * p.cover_weeks;
    let capped_backlog = f64::from(state.backorder).min(avg_demand * 2.0);
    let gap = target_stock + p.backlog_weight * capped_backlog - f64::from(state.inventory);

    let order_base = demand + p.inv_adjust_weight * gap.max(-demand);
    let last = f64::from(state.last_order);
    let order = p.smoothing * last + (1.0 - p.smoothing) * order_base;

    let previous = if state.last_order != 0 { last } else { demand };
    (previous * 0.5).max(order.min(previous * 1.5))
}

/// Decide a non-negative integer order for an AI role.
///
/// Example:
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let q = decide_order(&state, 8.0, 6.0, &ProfileParams::for_profile(AiProfile::Safe), &mut rng);
pub fn decide_order<R: Rng + ?Sized>(
    state: &RoleState,
    demand: f64,
    avg_demand: f64,
    p: &ProfileParams,
    rng: &mut R,
) -> u32 {
    let mut order = planned_order(state, demand, avg_demand, p);
    if p.noise_level > 0.0 {
        let u: f64 = rng.gen_range(-1.0..1.0);
        order *= 1.0 + u * p.noise_level;
    }
    let qty = order.round().max(0.0) as u32;
    trace!(role = %state.role, demand, avg_demand, qty, "policy decision");
    qty
}
