#![deny(warnings)]

//! Economic models: cost accrual and customer demand for the beer game.
//!
//! This module provides validated utilities for:
//! - Per-round holding and backorder cost charged to a role
//! - The exogenous customer demand schedule seen by the retailer

use beer_core::{GameConfig, RoleState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Customer demand during the opening weeks of the classic schedule.
pub const OPENING_DEMAND: u32 = 4;
/// Number of weeks the opening demand lasts.
pub const OPENING_WEEKS: u32 = 4;
/// Customer demand after the step.
pub const STEPPED_DEMAND: u32 = 8;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Unit costs must be non-negative.
    #[error("invalid unit cost: {0}")]
    NegativeCost(Decimal),
    /// An explicit demand schedule must cover every round.
    #[error("demand schedule covers {given} rounds but the game has {needed}")]
    ScheduleTooShort {
        /// Rounds covered by the schedule.
        given: usize,
        /// Rounds in the game.
        needed: u32,
    },
}

/// Unit cost rates applied to every role at settlement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostRates {
    /// Cost per unit of inventory per round.
    pub holding: Decimal,
    /// Cost per unit of backorder per round.
    pub backorder: Decimal,
}

impl CostRates {
    /// Build validated rates.
    ///
    /// Example:
    /// let rates = CostRates::new(Decimal::ONE, Decimal::new(2, 0)).unwrap();
    /// assert_eq!(rates.round_cost(3, 1), Decimal::new(5, 0));
    pub fn new(holding: Decimal, backorder: Decimal) -> Result<Self, EconError> {
        if holding < Decimal::ZERO {
            return Err(EconError::NegativeCost(holding));
        }
        if backorder < Decimal::ZERO {
            return Err(EconError::NegativeCost(backorder));
        }
        Ok(Self { holding, backorder })
    }

    /// Rates configured for a game.
    pub fn from_config(config: &GameConfig) -> Result<Self, EconError> {
        Self::new(config.unit_holding_cost, config.unit_backorder_cost)
    }

    /// Cost of holding `inventory` units while owing `backorder` units.
    pub fn round_cost(&self, inventory: u32, backorder: u32) -> Decimal {
        Decimal::from(inventory) * self.holding + Decimal::from(backorder) * self.backorder
    }

    /// Charge a role for the round just played and return the charge.
    pub fn charge(&self, state: &mut RoleState) -> Decimal {
        state.accrue_cost(self.holding, self.backorder)
    }
}

/// Exogenous customer demand, one entry per round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDemand {
    per_round: Vec<u32>,
}

impl CustomerDemand {
    /// Classic step schedule: 4 units for the first four rounds, 8 after.
    ///
    /// Example:
    /// let d = CustomerDemand::classic(6);
    /// assert_eq!(d.as_slice(), &[4, 4, 4, 4, 8, 8]);
    pub fn classic(total_rounds: u32) -> Self {
        Self::step(total_rounds, OPENING_DEMAND, OPENING_WEEKS, STEPPED_DEMAND)
    }

    /// `before` units for the first `weeks` rounds, `after` units afterwards.
    pub fn step(total_rounds: u32, before: u32, weeks: u32, after: u32) -> Self {
        let per_round = (1..=total_rounds)
            .map(|r| if r <= weeks { before } else { after })
            .collect();
        Self { per_round }
    }

    /// Explicit schedule; must cover at least `total_rounds` rounds.
    pub fn explicit(per_round: Vec<u32>, total_rounds: u32) -> Result<Self, EconError> {
        if per_round.len() < total_rounds as usize {
            return Err(EconError::ScheduleTooShort {
                given: per_round.len(),
                needed: total_rounds,
            });
        }
        Ok(Self { per_round })
    }

    /// Schedule configured for a game: the explicit one when given, the
    /// classic step otherwise.
    pub fn from_config(config: &GameConfig) -> Result<Self, EconError> {
        match &config.customer_demand {
            Some(seq) => Self::explicit(seq.clone(), config.total_rounds),
            None => Ok(Self::classic(config.total_rounds)),
        }
    }

    /// Demand for a 1-based round; zero outside the schedule.
    pub fn at(&self, round: u32) -> u32 {
        if round == 0 {
            return 0;
        }
        self.per_round
            .get(round as usize - 1)
            .copied()
            .unwrap_or(0)
    }

    /// The whole schedule.
    pub fn as_slice(&self) -> &[u32] {
        &self.per_round
    }

    /// Total demand over the schedule.
    pub fn total(&self) -> u64 {
        self.per_round.iter().map(|&d| u64::from(d)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beer_core::{Controller, Role};
    use proptest::prelude::*;

    #[test]
    fn classic_schedule_steps_after_four_weeks() {
        let d = CustomerDemand::classic(6);
        assert_eq!(d.as_slice(), &[4, 4, 4, 4, 8, 8]);
        assert_eq!(d.at(1), 4);
        assert_eq!(d.at(5), 8);
        assert_eq!(d.at(0), 0);
        assert_eq!(d.at(7), 0);
        assert_eq!(d.total(), 32);
    }

    #[test]
    fn short_games_keep_opening_demand() {
        assert_eq!(CustomerDemand::classic(2).as_slice(), &[4, 4]);
    }

    #[test]
    fn explicit_schedule_must_cover_game() {
        let err = CustomerDemand::explicit(vec![4, 4], 3).unwrap_err();
        assert_eq!(err, EconError::ScheduleTooShort { given: 2, needed: 3 });
        let cfg = GameConfig {
            total_rounds: 3,
            customer_demand: Some(vec![1, 2, 3]),
            ..GameConfig::default()
        };
        assert_eq!(CustomerDemand::from_config(&cfg).unwrap().at(3), 3);
    }

    #[test]
    fn rates_reject_negative_costs() {
        assert!(CostRates::new(Decimal::new(-1, 0), Decimal::ONE).is_err());
        assert!(CostRates::new(Decimal::ONE, Decimal::new(-1, 1)).is_err());
        let cfg = GameConfig::default();
        let rates = CostRates::from_config(&cfg).unwrap();
        assert_eq!(rates.round_cost(3, 1), Decimal::new(5, 0));
    }

    #[test]
    fn charge_updates_role_total() {
        let rates = CostRates::new(Decimal::ONE, Decimal::new(2, 0)).unwrap();
        let mut s = RoleState::opening(Role::Retailer, Controller::Player, &GameConfig::default());
        s.backorder = 3;
        assert_eq!(rates.charge(&mut s), Decimal::new(18, 0));
        assert_eq!(s.total_cost, Decimal::new(18, 0));
    }

    proptest! {
        #[test]
        fn cost_is_monotonic(inv in 0u32..10_000, back in 0u32..10_000) {
            let rates = CostRates::new(Decimal::ONE, Decimal::new(2, 0)).unwrap();
            prop_assert!(rates.round_cost(inv + 1, back) > rates.round_cost(inv, back));
            prop_assert!(rates.round_cost(inv, back + 1) > rates.round_cost(inv, back));
        }
    }
}
