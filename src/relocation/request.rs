use crate::world::position::{Location, WorldId};
use crate::world::ring::RingSearch;
use crate::world::time::GameTick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Searching,
    Resolved,
    Cancelled,
    Expired,
}

/// A live relocation request. Lives in the scheduler's table only while its
/// status is `Pending` or `Searching`.
#[derive(Debug, Clone)]
pub struct RelocationRequest {
    pub actor: ActorId,
    pub ticket: u64,
    pub requested_world: WorldId,
    pub requested_position: Location,
    pub created_at: GameTick,
    pub fire_at: GameTick,
    pub status: RequestStatus,
    pub search: Option<RingSearch>,
}

impl RelocationRequest {
    pub fn new(
        actor: ActorId,
        ticket: u64,
        position: Location,
        created_at: GameTick,
        fire_at: GameTick,
    ) -> Self {
        Self {
            actor,
            ticket,
            requested_world: position.world,
            requested_position: position,
            created_at,
            fire_at,
            status: RequestStatus::Pending,
            search: None,
        }
    }

    /// Whether `current` is close enough to where the request was made.
    pub fn still_within(&self, current: &Location, max_displacement: f64) -> bool {
        current.world == self.requested_world
            && self.requested_position.distance(current) <= max_displacement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_within_checks_world_then_distance() {
        let origin = Location::new(WorldId(0), 10.0, 64.0, 10.0);
        let request = RelocationRequest::new(
            ActorId(1),
            1,
            origin,
            GameTick(0),
            GameTick(20),
        );
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.still_within(&Location::new(WorldId(0), 16.0, 64.0, 18.0), 10.0));
        assert!(!request.still_within(&Location::new(WorldId(0), 21.0, 64.0, 10.0), 10.0));
        assert!(!request.still_within(&Location::new(WorldId(1), 10.0, 64.0, 10.0), 10.0));
    }
}
