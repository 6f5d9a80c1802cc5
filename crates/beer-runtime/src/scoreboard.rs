//! End-of-game ranking and per-role time series.

use crate::RoundRecord;
use beer_core::{Role, RoleState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One role's final result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalScore {
    /// Seat in the chain.
    pub role: Role,
    /// Display name of the seat.
    pub name: String,
    /// Cost accumulated over the game.
    pub total_cost: Decimal,
    /// Backorder left after the last round.
    pub final_backorder: u32,
    /// Whether the player held this seat.
    pub is_player: bool,
}

/// Rank roles by accumulated cost, cheapest first. Ties keep chain order.
pub fn final_scores(roles: &[RoleState]) -> Vec<FinalScore> {
    let mut scores: Vec<FinalScore> = roles
        .iter()
        .map(|s| FinalScore {
            role: s.role,
            name: s.role.name().to_string(),
            total_cost: s.total_cost,
            final_backorder: s.backorder,
            is_player: s.is_player(),
        })
        .collect();
    scores.sort_by(|a, b| a.total_cost.cmp(&b.total_cost));
    scores
}

/// Chart-ready history of one role, one entry per settled round.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleSeries {
    /// Role the columns describe; `None` for an empty default.
    pub role: Option<Role>,
    /// Round numbers.
    pub rounds: Vec<u32>,
    /// Inventory after settlement.
    pub inventory: Vec<u32>,
    /// Backorder after settlement.
    pub backorder: Vec<u32>,
    /// Order or production quantity placed.
    pub orders: Vec<u32>,
    /// Cost accumulated up to each round.
    pub cumulative_cost: Vec<Decimal>,
}

impl RoleSeries {
    /// Extract `role`'s columns from a round history.
    pub fn from_history(role: Role, history: &[RoundRecord]) -> Self {
        let mut series = Self {
            role: Some(role),
            ..Self::default()
        };
        for record in history {
            let line = record.for_role(role);
            series.rounds.push(record.round);
            series.inventory.push(line.inventory);
            series.backorder.push(line.backorder);
            series.orders.push(line.ordered);
            series.cumulative_cost.push(line.total_cost);
        }
        series
    }

    /// Largest order placed, if any round was played.
    pub fn peak_order(&self) -> Option<u32> {
        self.orders.iter().copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Setup, Simulation};
    use beer_core::{Controller, GameConfig};

    fn state(role: Role, cost: i64, backorder: u32) -> RoleState {
        let mut s = RoleState::opening(role, Controller::Ai(Default::default()), &GameConfig::default());
        s.total_cost = Decimal::new(cost, 0);
        s.backorder = backorder;
        s
    }

    #[test]
    fn scores_sorted_by_cost() {
        let roles = [
            state(Role::Retailer, 90, 3),
            state(Role::SecondarySupplier, 20, 0),
            state(Role::PrimarySupplier, 55, 1),
            state(Role::Factory, 20, 7),
        ];
        let scores = final_scores(&roles);
        let order: Vec<Role> = scores.iter().map(|s| s.role).collect();
        assert_eq!(
            order,
            vec![Role::SecondarySupplier, Role::Factory, Role::PrimarySupplier, Role::Retailer]
        );
        assert_eq!(scores[1].final_backorder, 7);
        assert_eq!(scores[3].name, "Retailer");
        assert!(scores.windows(2).all(|w| w[0].total_cost <= w[1].total_cost));
    }

    #[test]
    fn scores_flag_the_player() {
        let mut sim = Simulation::initialize(Setup::with_player(Role::Factory)).unwrap();
        sim.confirm_shipping(0).unwrap();
        sim.confirm_ordering(4).unwrap();
        sim.finish_round().unwrap();
        let scores = sim.final_scores();
        assert_eq!(scores.len(), 4);
        let players: Vec<Role> = scores.iter().filter(|s| s.is_player).map(|s| s.role).collect();
        assert_eq!(players, vec![Role::Factory]);
    }

    #[test]
    fn series_follow_history() {
        let mut sim = Simulation::initialize(Setup::unattended().config(GameConfig {
            total_rounds: 6,
            ..GameConfig::default()
        }))
        .unwrap();
        sim.run_to_completion().unwrap();
        let series = sim.series(Role::PrimarySupplier);
        assert_eq!(series.rounds, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(series.orders, sim.role(Role::PrimarySupplier).order_history);
        assert_eq!(series.cumulative_cost.last(), Some(&sim.role(Role::PrimarySupplier).total_cost));
        assert_eq!(series.peak_order(), series.orders.iter().copied().max());
        assert!(series.cumulative_cost.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(RoleSeries::from_history(Role::Retailer, &[]).peak_order(), None);
    }
}
