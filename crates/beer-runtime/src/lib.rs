#![deny(warnings)]

//! Round engine for the beer distribution game.
//!
//! A [`Simulation`] owns the four role ledgers and drives each round through
//! a fixed phase sequence, one explicit command per step:
//!
//! 1. **Receive** ([`Simulation::start_round`], from round 2 on): intake
//!    batches become stock, transit batches move to intake (factory
//!    production goes straight to stock).
//! 2. **Demand**: the retailer sees customer demand, every other role sees
//!    its downstream neighbour's previous order.
//! 3. **Ship** ([`Simulation::confirm_shipping`]): each role ships against
//!    demand plus backorder, limited by inventory.
//! 4. **Order** ([`Simulation::confirm_ordering`]): the player's quantity or
//!    the ordering policy's decision is recorded; factory orders start
//!    production.
//! 5. **Settle** ([`Simulation::finish_round`]): costs accrue and the round
//!    record is appended to the history.

use beer_ai::{average_demand, decide_order, ProfileParams, FALLBACK_DEMAND};
use beer_core::{AiProfile, Controller, GameConfig, Role, RoleState, ValidationError};
use beer_econ::{CostRates, CustomerDemand, EconError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod scoreboard;

pub use scoreboard::{FinalScore, RoleSeries};

/// Who sits where, and the rules of the game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Setup {
    /// Role controlled by commands; `None` lets the AI play every seat.
    pub player: Option<Role>,
    /// Behavior profile per AI seat. Missing seats play [`AiProfile::Safe`].
    pub ai_profiles: BTreeMap<Role, AiProfile>,
    /// Game rules.
    pub config: GameConfig,
}

impl Setup {
    /// Player in `role`, every other seat on the default profile.
    pub fn with_player(role: Role) -> Self {
        Self {
            player: Some(role),
            ..Self::default()
        }
    }

    /// No player; the AI plays all four seats.
    pub fn unattended() -> Self {
        Self::default()
    }

    /// Assign `profile` to an AI seat.
    pub fn profile(mut self, role: Role, profile: AiProfile) -> Self {
        self.ai_profiles.insert(role, profile);
        self
    }

    /// Same profile for every seat.
    pub fn all_profiles(mut self, profile: AiProfile) -> Self {
        for role in Role::ALL {
            self.ai_profiles.insert(role, profile);
        }
        self
    }

    /// Draw a profile for every seat.
    pub fn random_profiles<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        for role in Role::ALL {
            let profile = AiProfile::ALL[rng.gen_range(0..AiProfile::ALL.len())];
            self.ai_profiles.insert(role, profile);
        }
        self
    }

    /// Replace the game rules.
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    fn controller(&self, role: Role) -> Controller {
        if self.player == Some(role) {
            Controller::Player
        } else {
            Controller::Ai(self.ai_profiles.get(&role).copied().unwrap_or_default())
        }
    }
}

/// Errors that prevent a game from starting.
#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    /// Rules failed validation.
    #[error(transparent)]
    Config(#[from] ValidationError),
    /// Costs or demand schedule failed validation.
    #[error(transparent)]
    Econ(#[from] EconError),
}

/// Where the current round stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Waiting for shipments to be confirmed.
    Shipping,
    /// Waiting for orders to be confirmed.
    Ordering,
    /// Waiting for the round to be settled.
    Settling,
    /// Round settled; the next one has not started.
    Settled,
    /// Final round settled.
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Shipping => "shipping",
            Phase::Ordering => "ordering",
            Phase::Settling => "settling",
            Phase::Settled => "settled",
            Phase::GameOver => "game over",
        })
    }
}

/// Refusals returned by commands. A refused command changes nothing.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    /// Quantities cannot be negative.
    #[error("quantity cannot be negative: {0}")]
    NegativeQuantity(i64),
    /// Quantity does not fit in a unit count.
    #[error("quantity is too large: {0}")]
    QuantityTooLarge(i64),
    /// Cannot ship more than is on hand.
    #[error("cannot ship {requested} units with {inventory} in inventory")]
    ShipExceedsInventory {
        /// Units the player asked to ship.
        requested: u32,
        /// Units on hand.
        inventory: u32,
    },
    /// Blank or non-numeric quantity.
    #[error("a quantity is required")]
    MissingQuantity,
    /// Command issued in the wrong phase.
    #[error("cannot {command} during the {phase} phase")]
    OutOfPhase {
        /// The refused command.
        command: &'static str,
        /// Phase at the time of the command.
        phase: Phase,
    },
    /// The final round has been settled.
    #[error("the game is over")]
    GameOver,
    /// Unattended play was requested while a player holds a seat.
    #[error("{0} is player-controlled")]
    PlayerSeated(Role),
}

/// Parse a player-entered quantity. Blank or non-numeric text is refused.
pub fn parse_quantity(input: &str) -> Result<i64, CommandError> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| CommandError::MissingQuantity)
}

fn to_units(amount: i64) -> Result<u32, CommandError> {
    let units = if amount < 0 {
        Err(CommandError::NegativeQuantity(amount))
    } else {
        u32::try_from(amount).map_err(|_| CommandError::QuantityTooLarge(amount))
    };
    if let Err(e) = &units {
        warn!(%e, "quantity refused");
    }
    units
}

/// One role's line in a round record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleRoundStats {
    /// Role the line belongs to.
    pub role: Role,
    /// Units moved into inventory this round.
    pub received: u32,
    /// Demand visible this round.
    pub demand: u32,
    /// Units shipped downstream this round.
    pub shipped: u32,
    /// Order or production quantity placed this round.
    pub ordered: u32,
    /// Inventory after settlement.
    pub inventory: u32,
    /// Backorder after settlement.
    pub backorder: u32,
    /// Cost charged this round.
    pub cost: Decimal,
    /// Cost accumulated so far.
    pub total_cost: Decimal,
}

/// Immutable record of a settled round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: u32,
    /// Customer demand seen by the retailer.
    pub customer_demand: u32,
    /// One line per role, in [`Role::ALL`] order.
    pub roles: [RoleRoundStats; 4],
}

impl RoundRecord {
    /// Line for `role`.
    pub fn for_role(&self, role: Role) -> &RoleRoundStats {
        &self.roles[role.index()]
    }
}

/// Read-only view of a role for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleSnapshot {
    /// Seat in the chain.
    pub role: Role,
    /// Player or AI profile.
    pub controller: Controller,
    /// Units on hand.
    pub inventory: u32,
    /// Unmet demand owed downstream.
    pub backorder: u32,
    /// Intake queue, head first.
    pub receiving: Vec<u32>,
    /// Transit or production queue, head first.
    pub transit: Vec<u32>,
    /// Demand visible this round.
    pub current_demand: u32,
    /// Most recent order or production quantity.
    pub last_order: u32,
    /// Accumulated cost.
    pub total_cost: Decimal,
}

impl From<&RoleState> for RoleSnapshot {
    fn from(s: &RoleState) -> Self {
        Self {
            role: s.role,
            controller: s.controller,
            inventory: s.inventory,
            backorder: s.backorder,
            receiving: s.receiving.to_vec(),
            transit: s.transit.to_vec(),
            current_demand: s.current_demand,
            last_order: s.last_order,
            total_cost: s.total_cost,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct RoundTally {
    received: [u32; 4],
    shipped: [u32; 4],
    ordered: [u32; 4],
}

/// One in-memory run of the game.
#[derive(Clone, Debug)]
pub struct Simulation {
    config: GameConfig,
    player: Option<Role>,
    roles: [RoleState; 4],
    demand: CustomerDemand,
    rates: CostRates,
    round: u32,
    phase: Phase,
    tally: RoundTally,
    history: Vec<RoundRecord>,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Validate the setup, lay out the opening position and open round 1.
    ///
    /// Round 1 is played on the opening position as seeded: its receive
    /// phase is skipped.
    pub fn initialize(setup: Setup) -> Result<Self, SetupError> {
        setup.config.validate()?;
        let rates = CostRates::from_config(&setup.config)?;
        let demand = CustomerDemand::from_config(&setup.config)?;
        let roles = Role::ALL.map(|r| RoleState::opening(r, setup.controller(r), &setup.config));
        let mut sim = Self {
            rng: ChaCha8Rng::seed_from_u64(setup.config.rng_seed),
            config: setup.config,
            player: setup.player,
            roles,
            demand,
            rates,
            round: 1,
            phase: Phase::Shipping,
            tally: RoundTally::default(),
            history: Vec::new(),
        };
        info!(player = ?sim.player, rounds = sim.config.total_rounds, "game initialized");
        sim.observe_demand();
        Ok(sim)
    }

    /// Current 1-based round.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Number of rounds in the game.
    pub fn total_rounds(&self) -> u32 {
        self.config.total_rounds
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the final round has been settled.
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Seat held by the player, if any.
    pub fn player(&self) -> Option<Role> {
        self.player
    }

    /// Rules in force.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Customer demand schedule.
    pub fn customer_demand(&self) -> &CustomerDemand {
        &self.demand
    }

    /// Ledger of one role.
    pub fn role(&self, role: Role) -> &RoleState {
        &self.roles[role.index()]
    }

    /// Ledgers of every role, in [`Role::ALL`] order.
    pub fn roles(&self) -> &[RoleState] {
        &self.roles
    }

    /// Snapshot of one role.
    pub fn snapshot(&self, role: Role) -> RoleSnapshot {
        RoleSnapshot::from(self.role(role))
    }

    /// Snapshot of every role, in [`Role::ALL`] order.
    pub fn snapshots(&self) -> Vec<RoleSnapshot> {
        self.roles.iter().map(RoleSnapshot::from).collect()
    }

    /// Settled rounds, oldest first.
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    /// Roles ranked by accumulated cost, cheapest first.
    pub fn final_scores(&self) -> Vec<FinalScore> {
        scoreboard::final_scores(&self.roles)
    }

    /// Per-round chart data for one role.
    pub fn series(&self, role: Role) -> RoleSeries {
        RoleSeries::from_history(role, &self.history)
    }

    /// Ship for the round. The player's `amount` is capped by what is owed;
    /// every AI seat ships as much of what it owes as it can.
    ///
    /// Returns `Ok(false)` when shipping was already confirmed this round.
    /// Without a player seat `amount` is ignored.
    pub fn confirm_shipping(&mut self, amount: i64) -> Result<bool, CommandError> {
        match self.phase {
            Phase::Shipping => {}
            Phase::Ordering | Phase::Settling => return Ok(false),
            Phase::GameOver => return Err(CommandError::GameOver),
            phase => return Err(self.refuse("confirm shipping", phase)),
        }
        let limit = match self.player {
            Some(role) => {
                let units = to_units(amount)?;
                let inventory = self.role(role).inventory;
                if units > inventory {
                    warn!(units, inventory, "shipment refused");
                    return Err(CommandError::ShipExceedsInventory { requested: units, inventory });
                }
                Some(units)
            }
            None => None,
        };
        self.ship_phase(limit);
        self.phase = Phase::Ordering;
        Ok(true)
    }

    /// Place orders for the round. The player's `amount` is recorded as is;
    /// every AI seat asks the ordering policy.
    ///
    /// Returns `Ok(false)` when ordering was already confirmed this round.
    /// Without a player seat `amount` is ignored.
    pub fn confirm_ordering(&mut self, amount: i64) -> Result<bool, CommandError> {
        match self.phase {
            Phase::Ordering => {}
            Phase::Settling => return Ok(false),
            Phase::GameOver => return Err(CommandError::GameOver),
            phase => return Err(self.refuse("confirm ordering", phase)),
        }
        let units = match self.player {
            Some(_) => Some(to_units(amount)?),
            None => None,
        };
        self.order_phase(units);
        self.phase = Phase::Settling;
        Ok(true)
    }

    /// Settle the round: accrue costs and append the round record.
    ///
    /// Returns `Ok(true)` once the final round is settled.
    pub fn finish_round(&mut self) -> Result<bool, CommandError> {
        match self.phase {
            Phase::Settling => {}
            Phase::GameOver => return Err(CommandError::GameOver),
            phase => return Err(self.refuse("finish the round", phase)),
        }
        let record = self.settle();
        info!(
            round = record.round,
            customer_demand = record.customer_demand,
            "round settled"
        );
        self.history.push(record);
        self.tally = RoundTally::default();
        if self.round >= self.config.total_rounds {
            self.phase = Phase::GameOver;
            info!(rounds = self.round, "game over");
            return Ok(true);
        }
        self.round += 1;
        self.phase = Phase::Settled;
        Ok(false)
    }

    /// Open the next round: receive goods and observe demand.
    pub fn start_round(&mut self) -> Result<(), CommandError> {
        match self.phase {
            Phase::Settled => {}
            Phase::GameOver => return Err(CommandError::GameOver),
            phase => return Err(self.refuse("start a round", phase)),
        }
        self.receive_phase();
        self.observe_demand();
        self.phase = Phase::Shipping;
        Ok(())
    }

    /// Play the rest of the current round with no player seat.
    ///
    /// Returns `Ok(true)` once the final round is settled.
    pub fn play_unattended_round(&mut self) -> Result<bool, CommandError> {
        if let Some(role) = self.player {
            return Err(CommandError::PlayerSeated(role));
        }
        if self.phase == Phase::Settled {
            self.start_round()?;
        }
        self.confirm_shipping(0)?;
        self.confirm_ordering(0)?;
        self.finish_round()
    }

    /// Play every remaining round with no player seat.
    pub fn run_to_completion(&mut self) -> Result<(), CommandError> {
        while !self.play_unattended_round()? {}
        Ok(())
    }

    fn refuse(&self, command: &'static str, phase: Phase) -> CommandError {
        let e = CommandError::OutOfPhase { command, phase };
        warn!(round = self.round, %e, "command refused");
        e
    }

    fn receive_phase(&mut self) {
        let direct_intake = self.config.receiving_time == 0;
        for role in Role::ALL {
            let state = &mut self.roles[role.index()];
            let mut received = 0;
            if role != Role::Factory {
                if let Some(units) = state.receiving.pop_head() {
                    state.receive(units);
                    received += units;
                }
            }
            if let Some(units) = state.transit.pop_head() {
                if role == Role::Factory || direct_intake {
                    state.receive(units);
                    received += units;
                } else {
                    state.receiving.push_tail(units);
                }
            }
            debug!(round = self.round, %role, received, inventory = state.inventory, "received");
            self.tally.received[role.index()] = received;
        }
    }

    fn observe_demand(&mut self) {
        let customer = self.demand.at(self.round);
        for role in Role::ALL {
            let demand = match role.downstream() {
                None => customer,
                Some(down) if self.round > 1 => self.roles[down.index()].last_order,
                Some(_) => 0,
            };
            self.roles[role.index()].current_demand = demand;
        }
    }

    fn ship_phase(&mut self, player_limit: Option<u32>) {
        for role in Role::UPSTREAM_FIRST {
            let limit = if self.player == Some(role) { player_limit } else { None };
            let state = &mut self.roles[role.index()];
            let shipped = state.ship_against_need(limit);
            debug!(
                round = self.round,
                %role,
                shipped,
                backorder = state.backorder,
                inventory = state.inventory,
                "shipped"
            );
            self.tally.shipped[role.index()] = shipped;
            if let Some(down) = role.downstream() {
                self.roles[down.index()].transit.push_tail(shipped);
            }
        }
    }

    fn order_phase(&mut self, player_units: Option<u32>) {
        for role in Role::ALL {
            let i = role.index();
            let state = &self.roles[i];
            let qty = match state.controller {
                Controller::Player => player_units.unwrap_or_default(),
                Controller::Ai(profile) => {
                    let demand = match state.current_demand {
                        0 if role != Role::Retailer => FALLBACK_DEMAND,
                        d => f64::from(d),
                    };
                    let params = ProfileParams::resolve(profile, self.config.ai_overrides.get(&role));
                    decide_order(state, demand, average_demand(state), &params, &mut self.rng)
                }
            };
            let state = &mut self.roles[i];
            state.record_order(qty);
            if role == Role::Factory {
                state.transit.push_tail(qty);
            }
            debug!(round = self.round, %role, ordered = qty, "ordered");
            self.tally.ordered[i] = qty;
        }
    }

    fn settle(&mut self) -> RoundRecord {
        let rates = self.rates;
        let tally = &self.tally;
        let roles = Role::ALL.map(|role| {
            let i = role.index();
            let state = &mut self.roles[i];
            let cost = rates.charge(state);
            RoleRoundStats {
                role,
                received: tally.received[i],
                demand: state.current_demand,
                shipped: tally.shipped[i],
                ordered: tally.ordered[i],
                inventory: state.inventory,
                backorder: state.backorder,
                cost,
                total_cost: state.total_cost,
            }
        });
        RoundRecord {
            round: self.round,
            customer_demand: self.demand.at(self.round),
            roles,
        }
    }
}
