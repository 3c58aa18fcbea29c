use crate::config::{ConfigError, RelocationSettings};
use crate::relocation::events::{RelocationError, RelocationEvent};
use crate::relocation::host::{GateDecision, NotificationSink, RelocationHost};
use crate::relocation::request::{ActorId, RelocationRequest, RequestStatus};
use crate::world::board::OwnershipBoard;
use crate::world::cron::{CronEntry, CronSystem};
use crate::world::position::{AreaCoordinate, Location};
use crate::world::ring::{search_step, RingSearch, SearchStep};
use crate::world::time::{GameClock, GameTick};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What one call to [`RelocationScheduler::tick`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: GameTick,
    pub fired: usize,
    pub stale_timers: usize,
    pub tiles_examined: u64,
    pub resolved: Vec<ActorId>,
    pub expired: Vec<(ActorId, RelocationError)>,
}

impl TickReport {
    fn new(tick: GameTick) -> Self {
        Self {
            tick,
            fired: 0,
            stale_timers: 0,
            tiles_examined: 0,
            resolved: Vec::new(),
            expired: Vec::new(),
        }
    }
}

/// Drives stuck-relocation requests: one live request per actor, a delay,
/// re-validation of the actor's position, then an outward search for an
/// unclaimed tile spread across ticks.
pub struct RelocationScheduler {
    settings: RelocationSettings,
    search_radius: u32,
    delay_ticks: u64,
    board: Arc<dyn OwnershipBoard>,
    clock: GameClock,
    requests: HashMap<ActorId, RelocationRequest>,
    timers: CronSystem<ActorId>,
    next_ticket: u64,
}

impl RelocationScheduler {
    pub fn new(
        settings: RelocationSettings,
        board: Arc<dyn OwnershipBoard>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let search_radius =
            u32::try_from(settings.search_radius).map_err(|_| ConfigError::Invalid {
                field: "search_radius",
                reason: format!("out of range: {}", settings.search_radius),
            })?;
        let clock = GameClock::new(settings.tick_rate());
        let delay_ticks = clock.rate().ticks_covering(settings.delay());
        Ok(Self {
            settings,
            search_radius,
            delay_ticks,
            board,
            clock,
            requests: HashMap::new(),
            timers: CronSystem::new(),
            next_ticket: 0,
        })
    }

    pub fn now(&self) -> GameTick {
        self.clock.now()
    }

    pub fn delay_ticks(&self) -> u64 {
        self.delay_ticks
    }

    pub fn status(&self, actor: ActorId) -> Option<RequestStatus> {
        self.requests.get(&actor).map(|request| request.status)
    }

    pub fn live_requests(&self) -> usize {
        self.requests.len()
    }

    /// Time left before the search begins; zero once it is running.
    pub fn remaining_wait(&self, actor: ActorId) -> Option<Duration> {
        self.requests
            .get(&actor)
            .map(|request| self.wait_for(request))
    }

    fn wait_for(&self, request: &RelocationRequest) -> Duration {
        match request.status {
            RequestStatus::Pending => self.clock.time_until(request.fire_at),
            _ => Duration::ZERO,
        }
    }

    /// Accepts a relocation request for `actor` unless one is already live.
    /// Returns the wait before the search begins.
    pub fn submit<H>(&mut self, actor: ActorId, host: &mut H) -> Result<Duration, RelocationError>
    where
        H: RelocationHost + ?Sized,
    {
        let now = self.clock.now();
        match self.requests.entry(actor) {
            Entry::Occupied(entry) => {
                let remaining = match entry.get().status {
                    RequestStatus::Pending => self.clock.time_until(entry.get().fire_at),
                    _ => Duration::ZERO,
                };
                debug!(%actor, ?remaining, "duplicate relocation request");
                host.notify(actor, RelocationEvent::AlreadyPending { wait: remaining });
                Err(RelocationError::DuplicateRequest { remaining })
            }
            Entry::Vacant(slot) => {
                let position = if host.is_actor_present(actor) {
                    host.actor_location(actor)
                } else {
                    None
                };
                let Some(position) = position else {
                    return Err(RelocationError::ActorGone);
                };
                if let GateDecision::Deny { reason } = host.authorize(actor, self.settings.cost) {
                    debug!(%actor, %reason, "relocation request refused by gate");
                    return Err(RelocationError::Denied { reason });
                }

                self.next_ticket += 1;
                let ticket = self.next_ticket;
                let fire_at = now.after(self.delay_ticks);
                slot.insert(RelocationRequest::new(actor, ticket, position, now, fire_at));
                self.timers.set(actor, ticket, self.delay_ticks, now);

                let wait = self.clock.time_until(fire_at);
                debug!(%actor, %position, fire_at = fire_at.0, "relocation request accepted");
                host.notify(actor, RelocationEvent::Started { wait });
                Ok(wait)
            }
        }
    }

    /// Drops the live request for `actor`, abandoning its timer or search.
    /// Returns the state the request was in.
    pub fn cancel<S>(
        &mut self,
        actor: ActorId,
        sink: &mut S,
    ) -> Result<RequestStatus, RelocationError>
    where
        S: NotificationSink + ?Sized,
    {
        let request = self.release(actor).ok_or(RelocationError::NotFound)?;
        debug!(%actor, status = ?request.status, "relocation request cancelled");
        sink.notify(actor, RelocationEvent::Cancelled);
        Ok(request.status)
    }

    /// Drops every live request without notifying anyone.
    pub fn clear(&mut self) -> usize {
        let dropped = self.requests.len();
        self.requests.clear();
        self.timers.clear();
        if dropped > 0 {
            debug!(dropped, "relocation requests cleared");
        }
        dropped
    }

    /// Advances the clock one tick: fires due timers, then gives every running
    /// search one slice of work.
    pub fn tick<H>(&mut self, host: &mut H) -> TickReport
    where
        H: RelocationHost + ?Sized,
    {
        let now = self.clock.step();
        let mut report = TickReport::new(now);

        while let Some(timer) = self.timers.pop_ready(now) {
            self.fire(timer, host, &mut report);
        }
        report.stale_timers += self.timers.take_discarded();

        let mut searching: Vec<ActorId> = self
            .requests
            .values()
            .filter(|request| request.status == RequestStatus::Searching)
            .map(|request| request.actor)
            .collect();
        searching.sort();
        for actor in searching {
            self.advance_search(actor, host, &mut report);
        }

        report
    }

    fn fire<H>(&mut self, timer: CronEntry<ActorId>, host: &mut H, report: &mut TickReport)
    where
        H: RelocationHost + ?Sized,
    {
        let actor = timer.key;
        let Some(request) = self.requests.get(&actor) else {
            report.stale_timers += 1;
            return;
        };
        if request.ticket != timer.ticket || request.status != RequestStatus::Pending {
            debug!(%actor, ticket = timer.ticket, "ignoring stale relocation timer");
            report.stale_timers += 1;
            return;
        }
        report.fired += 1;

        let current = if host.is_actor_present(actor) {
            host.actor_location(actor)
        } else {
            None
        };
        let Some(current) = current else {
            self.expire(actor, RelocationError::ActorGone, host, report);
            return;
        };
        if !request.still_within(&current, self.settings.max_displacement) {
            let reason = RelocationError::OutOfBounds {
                max_displacement: self.settings.max_displacement,
            };
            self.expire(actor, reason, host, report);
            return;
        }

        let center = AreaCoordinate::containing(&current);
        if let Some(request) = self.requests.get_mut(&actor) {
            request.status = RequestStatus::Searching;
            request.search = Some(RingSearch::new(center, self.search_radius));
        }
        debug!(%actor, %center, radius = self.search_radius, "relocation search started");
    }

    fn advance_search<H>(&mut self, actor: ActorId, host: &mut H, report: &mut TickReport)
    where
        H: RelocationHost + ?Sized,
    {
        let board = &self.board;
        let Some(search) = self
            .requests
            .get_mut(&actor)
            .and_then(|request| request.search.as_mut())
        else {
            return;
        };
        let before = search.visited();
        let step = search_step(search, self.settings.tiles_per_tick, |tile| {
            board.is_unclaimed(tile)
        });
        report.tiles_examined += search.visited() - before;

        match step {
            SearchStep::Pending => {}
            SearchStep::Exhausted => {
                let reason = RelocationError::SearchExhausted {
                    radius: self.search_radius,
                };
                self.expire(actor, reason, host, report);
            }
            SearchStep::Found(tile) => self.relocate(actor, tile, host, report),
        }
    }

    fn relocate<H>(
        &mut self,
        actor: ActorId,
        tile: AreaCoordinate,
        host: &mut H,
        report: &mut TickReport,
    ) where
        H: RelocationHost + ?Sized,
    {
        // Slot is released before the backend runs.
        self.release(actor);

        let (x, z) = tile.center_block();
        let y = host.highest_solid_y(tile.world, x, z);
        let destination = Location::at_block(tile.world, x, y, z);

        if host.attempt_move(actor, destination) {
            info!(%actor, %tile, %destination, "relocated stuck actor");
            report.resolved.push(actor);
            host.notify(actor, RelocationEvent::Resolved { tile, destination });
        } else {
            warn!(%actor, %destination, "movement backend rejected relocation");
            let reason = RelocationError::MovementRejected { destination };
            report.expired.push((actor, reason.clone()));
            host.notify(actor, RelocationEvent::Expired { reason });
        }
    }

    fn expire<S>(
        &mut self,
        actor: ActorId,
        reason: RelocationError,
        sink: &mut S,
        report: &mut TickReport,
    ) where
        S: NotificationSink + ?Sized,
    {
        self.release(actor);
        debug!(%actor, %reason, "relocation request expired");
        report.expired.push((actor, reason.clone()));
        sink.notify(actor, RelocationEvent::Expired { reason });
    }

    fn release(&mut self, actor: ActorId) -> Option<RelocationRequest> {
        self.timers.stop(actor, self.clock.now());
        self.requests.remove(&actor)
    }
}
