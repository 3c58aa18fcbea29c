use crate::world::position::{AreaCoordinate, Location};
use std::time::Duration;
use thiserror::Error;

/// Why a request did not end in a relocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelocationError {
    #[error("a relocation is already pending, {remaining:?} left")]
    DuplicateRequest { remaining: Duration },

    #[error("moved more than {max_displacement} blocks or changed world before the search began")]
    OutOfBounds { max_displacement: f64 },

    #[error("no unclaimed area within {radius} tiles")]
    SearchExhausted { radius: u32 },

    #[error("movement to {destination} was rejected")]
    MovementRejected { destination: Location },

    #[error("actor is no longer present")]
    ActorGone,

    #[error("submission refused: {reason}")]
    Denied { reason: String },

    #[error("no relocation request to cancel")]
    NotFound,
}

/// Structured status events handed to the notification sink.
#[derive(Debug, Clone, PartialEq)]
pub enum RelocationEvent {
    Started { wait: Duration },
    AlreadyPending { wait: Duration },
    Resolved { tile: AreaCoordinate, destination: Location },
    Expired { reason: RelocationError },
    Cancelled,
}

impl std::fmt::Display for RelocationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RelocationEvent::Started { wait } => {
                write!(f, "relocating in {}s", wait.as_secs())
            }
            RelocationEvent::AlreadyPending { wait } => {
                write!(f, "already relocating, {}s left", wait.as_secs())
            }
            RelocationEvent::Resolved { destination, .. } => {
                write!(f, "relocated to {}", destination)
            }
            RelocationEvent::Expired { reason } => write!(f, "relocation failed: {}", reason),
            RelocationEvent::Cancelled => write!(f, "relocation cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::position::WorldId;

    #[test]
    fn events_render_for_console() {
        let started = RelocationEvent::Started {
            wait: Duration::from_secs(30),
        };
        assert_eq!(started.to_string(), "relocating in 30s");

        let expired = RelocationEvent::Expired {
            reason: RelocationError::SearchExhausted { radius: 2 },
        };
        assert_eq!(
            expired.to_string(),
            "relocation failed: no unclaimed area within 2 tiles"
        );

        let destination = Location::at_block(WorldId(0), 8, 70, 8);
        let resolved = RelocationEvent::Resolved {
            tile: AreaCoordinate::new(WorldId(0), 0, 0),
            destination,
        };
        assert_eq!(resolved.to_string(), "relocated to 0:(8,70,8)");
    }
}
