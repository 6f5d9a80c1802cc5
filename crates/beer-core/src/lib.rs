#![deny(warnings)]

//! Core domain models and invariants for the beer distribution game.
//!
//! This crate defines the fixed supply-chain topology, the per-role ledger
//! mutated by the round engine, and the validated game configuration shared
//! by the policy and runtime crates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Units seeded into every opening pipeline slot.
pub const OPENING_PIPELINE_UNITS: u32 = 4;
/// Opening inventory for the retailer and both suppliers.
pub const OPENING_INVENTORY: u32 = 12;
/// Opening inventory for the factory.
pub const OPENING_FACTORY_INVENTORY: u32 = 4;

/// A seat in the chain factory → primary supplier → secondary supplier →
/// retailer → customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Sells to the external customer.
    Retailer,
    /// Supplies the retailer.
    SecondarySupplier,
    /// Supplies the secondary supplier.
    PrimarySupplier,
    /// Produces goods; has no upstream.
    Factory,
}

impl Role {
    /// All roles, most downstream first.
    pub const ALL: [Role; 4] = [
        Role::Retailer,
        Role::SecondarySupplier,
        Role::PrimarySupplier,
        Role::Factory,
    ];

    /// All roles, most upstream first.
    pub const UPSTREAM_FIRST: [Role; 4] = [
        Role::Factory,
        Role::PrimarySupplier,
        Role::SecondarySupplier,
        Role::Retailer,
    ];

    /// Position in [`Role::ALL`].
    pub fn index(self) -> usize {
        match self {
            Role::Retailer => 0,
            Role::SecondarySupplier => 1,
            Role::PrimarySupplier => 2,
            Role::Factory => 3,
        }
    }

    /// The party this role ships to. `None` for the retailer, whose
    /// shipments leave the chain.
    pub fn downstream(self) -> Option<Role> {
        match self {
            Role::Retailer => None,
            Role::SecondarySupplier => Some(Role::Retailer),
            Role::PrimarySupplier => Some(Role::SecondarySupplier),
            Role::Factory => Some(Role::PrimarySupplier),
        }
    }

    /// The party this role orders from. `None` for the factory.
    pub fn upstream(self) -> Option<Role> {
        match self {
            Role::Retailer => Some(Role::SecondarySupplier),
            Role::SecondarySupplier => Some(Role::PrimarySupplier),
            Role::PrimarySupplier => Some(Role::Factory),
            Role::Factory => None,
        }
    }

    /// Machine-readable key, e.g. `"secondary-supplier"`.
    pub fn key(self) -> &'static str {
        match self {
            Role::Retailer => "retailer",
            Role::SecondarySupplier => "secondary-supplier",
            Role::PrimarySupplier => "primary-supplier",
            Role::Factory => "factory",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Role::Retailer => "Retailer",
            Role::SecondarySupplier => "Secondary Supplier",
            Role::PrimarySupplier => "Primary Supplier",
            Role::Factory => "Factory",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retailer" => Ok(Role::Retailer),
            "secondary-supplier" | "supplier2" => Ok(Role::SecondarySupplier),
            "primary-supplier" | "supplier1" => Ok(Role::PrimarySupplier),
            "factory" => Ok(Role::Factory),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

/// Named behavior profile for AI-controlled roles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProfile {
    /// Overreacts to demand swings and shortages.
    Panic,
    /// Holds a moderate safety stock.
    #[default]
    Safe,
    /// Runs lean and changes orders slowly.
    Calm,
}

impl AiProfile {
    /// Every profile, in declaration order.
    pub const ALL: [AiProfile; 3] = [AiProfile::Panic, AiProfile::Safe, AiProfile::Calm];
}

impl fmt::Display for AiProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AiProfile::Panic => "panic",
            AiProfile::Safe => "safe",
            AiProfile::Calm => "calm",
        })
    }
}

impl FromStr for AiProfile {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panic" => Ok(AiProfile::Panic),
            "safe" => Ok(AiProfile::Safe),
            // Older setups called the lean profile "aggressive".
            "calm" | "aggressive" => Ok(AiProfile::Calm),
            other => Err(ValidationError::UnknownProfile(other.to_string())),
        }
    }
}

/// Who decides a role's shipments and orders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Controller {
    /// Quantities come from player commands.
    Player,
    /// Quantities come from the ordering policy with this profile.
    Ai(AiProfile),
}

/// Ordered delay line of unit batches: push at the tail, pop at the head.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline(VecDeque<u32>);

impl Pipeline {
    /// Empty pipeline.
    pub fn new() -> Self {
        Self(VecDeque::new())
    }

    /// Pipeline holding `slots` batches of `units` each.
    pub fn seeded(slots: u32, units: u32) -> Self {
        Self((0..slots).map(|_| units).collect())
    }

    /// Append a batch at the tail.
    pub fn push_tail(&mut self, units: u32) {
        self.0.push_back(units);
    }

    /// Remove and return the head batch, if any.
    pub fn pop_head(&mut self) -> Option<u32> {
        self.0.pop_front()
    }

    /// Head batch without removing it.
    pub fn head(&self) -> Option<u32> {
        self.0.front().copied()
    }

    /// Number of batches in flight.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no batch is in flight.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all batches.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&u| u64::from(u)).sum()
    }

    /// Batches from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Copy of the batches from head to tail.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

/// Per-parameter overrides merged over a profile's defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverride {
    /// Target weeks of demand held as safety stock.
    pub cover_weeks: Option<f64>,
    /// How strongly backorder inflates the target.
    pub backlog_weight: Option<f64>,
    /// Share of the inventory gap corrected per round.
    pub inv_adjust_weight: Option<f64>,
    /// Weight retained from the previous order, in [0, 1].
    pub smoothing: Option<f64>,
    /// Symmetric noise fraction, in [0, 1).
    pub noise_level: Option<f64>,
}

impl ProfileOverride {
    /// Check that every supplied value is usable by the policy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let weights = [
            ("cover_weeks", self.cover_weeks),
            ("backlog_weight", self.backlog_weight),
            ("inv_adjust_weight", self.inv_adjust_weight),
        ];
        for (name, value) in weights {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ValidationError::InvalidParameter(name));
                }
            }
        }
        if let Some(s) = self.smoothing {
            if !(0.0..=1.0).contains(&s) {
                return Err(ValidationError::InvalidParameter("smoothing"));
            }
        }
        if let Some(n) = self.noise_level {
            if !(0.0..1.0).contains(&n) {
                return Err(ValidationError::InvalidParameter("noise_level"));
            }
        }
        Ok(())
    }
}

/// Game configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of rounds (weeks) to play.
    pub total_rounds: u32,
    /// Rounds a shipment spends in transit (>= 1).
    pub transport_delay: u32,
    /// Rounds a delivered shipment spends in intake before it is stock.
    pub receiving_time: u32,
    /// Rounds a factory production run takes (>= 1).
    pub production_time: u32,
    /// Cost per unit held in inventory per round.
    pub unit_holding_cost: Decimal,
    /// Cost per unit of backorder per round.
    pub unit_backorder_cost: Decimal,
    /// Seed for the policy's noise RNG.
    pub rng_seed: u64,
    /// Explicit customer demand per round; the classic step schedule when absent.
    pub customer_demand: Option<Vec<u32>>,
    /// Per-role policy parameter overrides.
    pub ai_overrides: BTreeMap<Role, ProfileOverride>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_rounds: 30,
            transport_delay: 1,
            receiving_time: 1,
            production_time: 1,
            unit_holding_cost: Decimal::ONE,
            unit_backorder_cost: Decimal::new(2, 0),
            rng_seed: 42,
            customer_demand: None,
            ai_overrides: BTreeMap::new(),
        }
    }
}

impl GameConfig {
    /// Validate round counts, lead times and overrides.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.total_rounds == 0 {
            return Err(ValidationError::NoRounds);
        }
        if self.transport_delay == 0 {
            return Err(ValidationError::ZeroLeadTime("transport_delay"));
        }
        if self.production_time == 0 {
            return Err(ValidationError::ZeroLeadTime("production_time"));
        }
        if self.unit_holding_cost < Decimal::ZERO || self.unit_backorder_cost < Decimal::ZERO {
            return Err(ValidationError::NegativeCost);
        }
        for o in self.ai_overrides.values() {
            o.validate()?;
        }
        Ok(())
    }

    /// Rounds between a shipment leaving the shipper and landing in the
    /// receiver's inventory (or between a production order and finished
    /// stock, for the factory).
    pub fn lead_time(&self, role: Role) -> u32 {
        match role {
            Role::Factory => self.production_time,
            _ => self.transport_delay + self.receiving_time,
        }
    }
}

/// Validation errors for configuration and setup.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A game needs at least one round.
    #[error("total rounds must be at least 1")]
    NoRounds,
    /// Transit and production delays must be at least one round.
    #[error("{0} must be at least 1 round")]
    ZeroLeadTime(&'static str),
    /// Unit costs must be non-negative.
    #[error("unit costs must be non-negative")]
    NegativeCost,
    /// Policy parameter outside its allowed range.
    #[error("invalid profile parameter: {0}")]
    InvalidParameter(&'static str),
    /// Unrecognised role name.
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// Unrecognised behavior profile name.
    #[error("unknown AI profile: {0}")]
    UnknownProfile(String),
}

/// Mutable ledger for one role, created at game start and kept for the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleState {
    /// Seat in the chain.
    pub role: Role,
    /// Player or AI profile.
    pub controller: Controller,
    /// Units on hand.
    pub inventory: u32,
    /// Unmet demand owed downstream.
    pub backorder: u32,
    /// Delivered batches completing intake. Always empty for the factory.
    pub receiving: Pipeline,
    /// Shipments in flight, or production runs for the factory.
    pub transit: Pipeline,
    /// Demand visible this round.
    pub current_demand: u32,
    /// Most recent order or production quantity.
    pub last_order: u32,
    /// Every order placed, oldest first.
    pub order_history: Vec<u32>,
    /// Accumulated holding and backorder cost.
    pub total_cost: Decimal,
}

impl RoleState {
    /// Opening position for `role` under `config`.
    pub fn opening(role: Role, controller: Controller, config: &GameConfig) -> Self {
        let (inventory, receiving, transit) = match role {
            Role::Factory => (
                OPENING_FACTORY_INVENTORY,
                Pipeline::new(),
                Pipeline::seeded(config.production_time, OPENING_PIPELINE_UNITS),
            ),
            _ => (
                OPENING_INVENTORY,
                Pipeline::seeded(config.receiving_time, OPENING_PIPELINE_UNITS),
                Pipeline::seeded(config.transport_delay, OPENING_PIPELINE_UNITS),
            ),
        };
        Self {
            role,
            controller,
            inventory,
            backorder: 0,
            receiving,
            transit,
            current_demand: 0,
            last_order: 0,
            order_history: Vec::new(),
            total_cost: Decimal::ZERO,
        }
    }

    /// Whether a player decides this role's quantities.
    pub fn is_player(&self) -> bool {
        self.controller == Controller::Player
    }

    /// Add delivered or produced units to inventory.
    pub fn receive(&mut self, amount: u32) {
        self.inventory = self.inventory.saturating_add(amount);
    }

    /// Ship up to `requested` from inventory; any shortfall joins the backorder.
    pub fn fulfill(&mut self, requested: u32) -> u32 {
        let shipped = requested.min(self.inventory);
        self.inventory -= shipped;
        self.backorder = self.backorder.saturating_add(requested - shipped);
        shipped
    }

    /// This round's demand plus carried-over backorder.
    pub fn total_need(&self) -> u32 {
        self.current_demand.saturating_add(self.backorder)
    }

    /// Ship against [`RoleState::total_need`], capped by `limit` and by
    /// inventory. Whatever remains unshipped becomes the new backorder.
    pub fn ship_against_need(&mut self, limit: Option<u32>) -> u32 {
        let need = self.total_need();
        let shipped = limit.unwrap_or(need).min(need).min(self.inventory);
        self.inventory -= shipped;
        self.backorder = need - shipped;
        shipped
    }

    /// Charge this round's holding and backorder cost and return it.
    pub fn accrue_cost(&mut self, unit_holding_cost: Decimal, unit_backorder_cost: Decimal) -> Decimal {
        let cost = Decimal::from(self.inventory) * unit_holding_cost
            + Decimal::from(self.backorder) * unit_backorder_cost;
        self.total_cost += cost;
        cost
    }

    /// Remember an order placed this round.
    pub fn record_order(&mut self, amount: u32) {
        self.last_order = amount;
        self.order_history.push(amount);
    }

    /// Mean of all past orders, or `None` before the first order.
    pub fn average_order(&self) -> Option<f64> {
        if self.order_history.is_empty() {
            return None;
        }
        let sum: f64 = self.order_history.iter().map(|&o| f64::from(o)).sum();
        Some(sum / self.order_history.len() as f64)
    }

    /// Units held in inventory or either pipeline.
    pub fn units_on_hand_and_inbound(&self) -> u64 {
        u64::from(self.inventory) + self.receiving.total() + self.transit.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn retailer() -> RoleState {
        RoleState::opening(Role::Retailer, Controller::Player, &GameConfig::default())
    }

    #[test]
    fn topology_is_linear() {
        assert_eq!(Role::Factory.upstream(), None);
        assert_eq!(Role::Retailer.downstream(), None);
        for role in Role::ALL {
            if let Some(down) = role.downstream() {
                assert_eq!(down.upstream(), Some(role));
            }
            assert_eq!(Role::ALL[role.index()], role);
        }
    }

    #[test]
    fn role_and_profile_parse() {
        assert_eq!("supplier2".parse::<Role>().unwrap(), Role::SecondarySupplier);
        assert_eq!(" Factory ".parse::<Role>().unwrap(), Role::Factory);
        assert!("warehouse".parse::<Role>().is_err());
        assert_eq!("aggressive".parse::<AiProfile>().unwrap(), AiProfile::Calm);
        assert!(matches!(
            "reckless".parse::<AiProfile>(),
            Err(ValidationError::UnknownProfile(_))
        ));
    }

    #[test]
    fn opening_positions_follow_lead_times() {
        let cfg = GameConfig {
            transport_delay: 2,
            receiving_time: 1,
            production_time: 3,
            ..GameConfig::default()
        };
        let s = RoleState::opening(Role::PrimarySupplier, Controller::Ai(AiProfile::Safe), &cfg);
        assert_eq!(s.inventory, 12);
        assert_eq!(s.receiving.to_vec(), vec![4]);
        assert_eq!(s.transit.to_vec(), vec![4, 4]);
        let f = RoleState::opening(Role::Factory, Controller::Ai(AiProfile::Calm), &cfg);
        assert_eq!(f.inventory, 4);
        assert!(f.receiving.is_empty());
        assert_eq!(f.transit.to_vec(), vec![4, 4, 4]);
        assert_eq!(cfg.lead_time(Role::Retailer), 3);
        assert_eq!(cfg.lead_time(Role::Factory), 3);
    }

    #[test]
    fn pipeline_is_fifo() {
        let mut p = Pipeline::new();
        p.push_tail(1);
        p.push_tail(0);
        p.push_tail(7);
        assert_eq!(p.total(), 8);
        assert_eq!(p.pop_head(), Some(1));
        assert_eq!(p.head(), Some(0));
        assert_eq!(p.to_vec(), vec![0, 7]);
    }

    #[test]
    fn fulfill_caps_at_inventory() {
        let mut s = retailer();
        s.inventory = 3;
        assert_eq!(s.fulfill(8), 3);
        assert_eq!(s.inventory, 0);
        assert_eq!(s.backorder, 5);
    }

    #[test]
    fn ship_against_need_replaces_backorder() {
        let mut s = retailer();
        s.inventory = 10;
        s.backorder = 6;
        s.current_demand = 8;
        assert_eq!(s.ship_against_need(None), 10);
        assert_eq!(s.backorder, 4);
        s.inventory = 20;
        assert_eq!(s.ship_against_need(Some(1)), 1);
        assert_eq!(s.backorder, 11);
    }

    #[test]
    fn cost_accrues() {
        let mut s = retailer();
        s.inventory = 5;
        s.backorder = 2;
        let c = s.accrue_cost(Decimal::new(5, 1), Decimal::ONE);
        assert_eq!(c, Decimal::new(45, 1));
        s.accrue_cost(Decimal::new(5, 1), Decimal::ONE);
        assert_eq!(s.total_cost, Decimal::new(9, 0));
    }

    #[test]
    fn order_history_average() {
        let mut s = retailer();
        assert_eq!(s.average_order(), None);
        s.record_order(4);
        s.record_order(8);
        assert_eq!(s.last_order, 8);
        assert_eq!(s.average_order(), Some(6.0));
    }

    #[test]
    fn config_validation() {
        assert!(GameConfig::default().validate().is_ok());
        let bad = GameConfig { total_rounds: 0, ..GameConfig::default() };
        assert_eq!(bad.validate(), Err(ValidationError::NoRounds));
        let bad = GameConfig { transport_delay: 0, ..GameConfig::default() };
        assert_eq!(bad.validate(), Err(ValidationError::ZeroLeadTime("transport_delay")));
        let mut bad = GameConfig::default();
        bad.ai_overrides.insert(
            Role::Factory,
            ProfileOverride { smoothing: Some(1.5), ..ProfileOverride::default() },
        );
        assert_eq!(bad.validate(), Err(ValidationError::InvalidParameter("smoothing")));
    }

    #[test]
    fn config_serde_roundtrip() {
        let mut cfg = GameConfig::default();
        cfg.ai_overrides.insert(
            Role::SecondarySupplier,
            ProfileOverride { cover_weeks: Some(2.5), ..ProfileOverride::default() },
        );
        let s = serde_json::to_string(&cfg).unwrap();
        assert!(s.contains("secondary-supplier"));
        let back: GameConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(back, cfg);
    }

    proptest! {
        #[test]
        fn fulfill_never_overdraws(inv in 0u32..1_000, backlog in 0u32..1_000, req in 0u32..1_000) {
            let mut s = retailer();
            s.inventory = inv;
            s.backorder = backlog;
            let shipped = s.fulfill(req);
            prop_assert!(shipped <= inv);
            prop_assert_eq!(s.inventory, inv - shipped);
            prop_assert_eq!(s.backorder, backlog + (req - shipped));
        }

        #[test]
        fn shipping_settles_backorder(inv in 0u32..1_000, backlog in 0u32..1_000, demand in 0u32..1_000) {
            let mut s = retailer();
            s.inventory = inv;
            s.backorder = backlog;
            s.current_demand = demand;
            let shipped = s.ship_against_need(None);
            prop_assert!(shipped <= inv);
            prop_assert_eq!(s.backorder, (demand + backlog).saturating_sub(shipped));
        }
    }
}
