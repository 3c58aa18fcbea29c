//! Seams between the relocation scheduler and the game host.

use crate::relocation::events::RelocationEvent;
use crate::relocation::request::ActorId;
use crate::world::position::{Location, WorldId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny { reason: String },
}

/// Permission and economy check run before a request is accepted. Charging
/// `cost` is the gate's side effect; a denial leaves no scheduler state.
pub trait SubmissionGate {
    fn authorize(&mut self, actor: ActorId, cost: u64) -> GateDecision;
}

pub trait Liveness {
    fn is_actor_present(&self, actor: ActorId) -> bool;

    /// Where the actor stands now, if the host knows.
    fn actor_location(&self, actor: ActorId) -> Option<Location>;
}

pub trait HeightLookup {
    /// Y of the topmost solid surface in a block column.
    fn highest_solid_y(&self, world: WorldId, x: i32, z: i32) -> i32;
}

pub trait MovementBackend {
    /// Moves the actor; `false` means the backend declined the destination.
    fn attempt_move(&mut self, actor: ActorId, destination: Location) -> bool;
}

pub trait NotificationSink {
    fn notify(&mut self, actor: ActorId, event: RelocationEvent);
}

/// Everything the scheduler needs from its host.
pub trait RelocationHost:
    SubmissionGate + Liveness + HeightLookup + MovementBackend + NotificationSink
{
}

impl<T> RelocationHost for T where
    T: SubmissionGate + Liveness + HeightLookup + MovementBackend + NotificationSink
{
}
