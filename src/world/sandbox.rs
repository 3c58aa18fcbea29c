//! In-memory stand-in for the game host: actors, terrain heights, balances,
//! upgrade levels, and a record of every move and notification.

use crate::relocation::events::RelocationEvent;
use crate::relocation::host::{
    GateDecision, HeightLookup, Liveness, MovementBackend, NotificationSink, SubmissionGate,
};
use crate::relocation::request::ActorId;
use crate::upgrades::spawner::UpgradeLevels;
use crate::world::board::GroupId;
use crate::world::position::{Location, WorldId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SandboxWorld {
    actors: HashMap<ActorId, Location>,
    surface: HashMap<(WorldId, i32, i32), i32>,
    default_surface: i32,
    balances: HashMap<ActorId, u64>,
    levels: HashMap<(GroupId, String), u32>,
    reject_moves: bool,
    moves: Vec<(ActorId, Location)>,
    events: Vec<(ActorId, RelocationEvent)>,
}

impl SandboxWorld {
    pub fn new(default_surface: i32) -> Self {
        Self {
            default_surface,
            ..Self::default()
        }
    }

    pub fn join(&mut self, actor: ActorId, location: Location) {
        self.actors.insert(actor, location);
    }

    pub fn leave(&mut self, actor: ActorId) -> Option<Location> {
        self.actors.remove(&actor)
    }

    /// Moves an actor directly, bypassing the movement backend.
    pub fn teleport(&mut self, actor: ActorId, location: Location) -> bool {
        match self.actors.get_mut(&actor) {
            Some(current) => {
                *current = location;
                true
            }
            None => false,
        }
    }

    pub fn location(&self, actor: ActorId) -> Option<Location> {
        self.actors.get(&actor).copied()
    }

    pub fn set_surface(&mut self, world: WorldId, x: i32, z: i32, y: i32) {
        self.surface.insert((world, x, z), y);
    }

    pub fn set_balance(&mut self, actor: ActorId, balance: u64) {
        self.balances.insert(actor, balance);
    }

    pub fn balance(&self, actor: ActorId) -> u64 {
        self.balances.get(&actor).copied().unwrap_or(0)
    }

    pub fn set_upgrade_level(&mut self, group: GroupId, upgrade: &str, level: u32) {
        self.levels.insert((group, upgrade.to_string()), level);
    }

    pub fn set_reject_moves(&mut self, reject: bool) {
        self.reject_moves = reject;
    }

    pub fn moves(&self) -> &[(ActorId, Location)] {
        &self.moves
    }

    pub fn events(&self) -> &[(ActorId, RelocationEvent)] {
        &self.events
    }

    pub fn events_for(&self, actor: ActorId) -> Vec<RelocationEvent> {
        self.events
            .iter()
            .filter(|(target, _)| *target == actor)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Hands over every notification recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<(ActorId, RelocationEvent)> {
        std::mem::take(&mut self.events)
    }
}

impl SubmissionGate for SandboxWorld {
    fn authorize(&mut self, actor: ActorId, cost: u64) -> GateDecision {
        if cost == 0 {
            return GateDecision::Allow;
        }
        let balance = self.balance(actor);
        if balance < cost {
            return GateDecision::Deny {
                reason: format!("costs {}, balance is {}", cost, balance),
            };
        }
        self.balances.insert(actor, balance - cost);
        GateDecision::Allow
    }
}

impl Liveness for SandboxWorld {
    fn is_actor_present(&self, actor: ActorId) -> bool {
        self.actors.contains_key(&actor)
    }

    fn actor_location(&self, actor: ActorId) -> Option<Location> {
        self.location(actor)
    }
}

impl HeightLookup for SandboxWorld {
    fn highest_solid_y(&self, world: WorldId, x: i32, z: i32) -> i32 {
        self.surface
            .get(&(world, x, z))
            .copied()
            .unwrap_or(self.default_surface)
    }
}

impl MovementBackend for SandboxWorld {
    fn attempt_move(&mut self, actor: ActorId, destination: Location) -> bool {
        if self.reject_moves || !self.teleport(actor, destination) {
            return false;
        }
        self.moves.push((actor, destination));
        true
    }
}

impl NotificationSink for SandboxWorld {
    fn notify(&mut self, actor: ActorId, event: RelocationEvent) {
        self.events.push((actor, event));
    }
}

impl UpgradeLevels for SandboxWorld {
    fn upgrade_level(&self, group: GroupId, upgrade: &str) -> u32 {
        self.levels
            .get(&(group, upgrade.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: WorldId = WorldId(0);

    #[test]
    fn gate_charges_only_when_affordable() {
        let mut world = SandboxWorld::new(64);
        let actor = ActorId(1);
        assert_eq!(world.authorize(actor, 0), GateDecision::Allow);
        assert!(matches!(world.authorize(actor, 5), GateDecision::Deny { .. }));

        world.set_balance(actor, 8);
        assert_eq!(world.authorize(actor, 5), GateDecision::Allow);
        assert_eq!(world.balance(actor), 3);
    }

    #[test]
    fn movement_requires_present_actor() {
        let mut world = SandboxWorld::new(64);
        let actor = ActorId(1);
        let target = Location::at_block(WORLD, 8, 64, 8);
        assert!(!world.attempt_move(actor, target));

        world.join(actor, Location::new(WORLD, 0.0, 64.0, 0.0));
        assert!(world.attempt_move(actor, target));
        assert_eq!(world.location(actor), Some(target));

        world.set_reject_moves(true);
        assert!(!world.attempt_move(actor, Location::at_block(WORLD, 24, 64, 8)));
        assert_eq!(world.moves().len(), 1);
    }

    #[test]
    fn heights_fall_back_to_default() {
        let mut world = SandboxWorld::new(62);
        world.set_surface(WORLD, 8, 8, 90);
        assert_eq!(world.highest_solid_y(WORLD, 8, 8), 90);
        assert_eq!(world.highest_solid_y(WORLD, 9, 8), 62);
        assert_eq!(world.highest_solid_y(WorldId(1), 8, 8), 62);
    }

    #[test]
    fn drain_empties_event_log() {
        let mut world = SandboxWorld::new(64);
        world.notify(ActorId(1), RelocationEvent::Cancelled);
        assert_eq!(world.drain_events().len(), 1);
        assert!(world.events().is_empty());
    }
}
