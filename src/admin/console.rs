//! Line-oriented driver that plays the game host against the sandbox world.

use crate::admin::commands::{parse_console_command, ConsoleCommand};
use crate::config::{ConfigError, FileConfig};
use crate::relocation::events::RelocationError;
use crate::relocation::scheduler::RelocationScheduler;
use crate::upgrades::spawner::{SpawnerUpgrade, SPAWNER_UPGRADE};
use crate::world::board::{claim_square, MemoryBoard, OwnerRef, OwnershipBoard};
use crate::world::sandbox::SandboxWorld;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_SURFACE: i32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFlow {
    Continue,
    Shutdown,
}

pub struct Console {
    board: Arc<MemoryBoard>,
    scheduler: RelocationScheduler,
    spawner: SpawnerUpgrade,
    world: SandboxWorld,
}

impl Console {
    pub fn new(config: &FileConfig) -> Result<Self, ConfigError> {
        let board = Arc::new(MemoryBoard::new());
        let scheduler = RelocationScheduler::new(config.relocation.clone(), board.clone())?;
        let spawner = SpawnerUpgrade::new(&config.upgrades, board.clone());
        Ok(Self {
            board,
            scheduler,
            spawner,
            world: SandboxWorld::new(DEFAULT_SURFACE),
        })
    }

    pub fn scheduler(&self) -> &RelocationScheduler {
        &self.scheduler
    }

    pub fn world(&self) -> &SandboxWorld {
        &self.world
    }

    /// Parses and applies one input line. Plain text is ignored.
    pub fn handle_line(&mut self, line: &str, out: &mut Vec<String>) -> ConsoleFlow {
        match parse_console_command(line) {
            Ok(Some(command)) => self.execute(command, out),
            Ok(None) => ConsoleFlow::Continue,
            Err(err) => {
                out.push(format!("error: {}", err));
                ConsoleFlow::Continue
            }
        }
    }

    pub fn execute(&mut self, command: ConsoleCommand, out: &mut Vec<String>) -> ConsoleFlow {
        match command {
            ConsoleCommand::Join { actor, location } => {
                self.world.join(actor, location);
                out.push(format!("{} joined at {}", actor, location));
            }
            ConsoleCommand::Move { actor, location } => {
                if self.world.teleport(actor, location) {
                    out.push(format!("{} now at {}", actor, location));
                } else {
                    out.push(format!("{} is not online", actor));
                }
            }
            ConsoleCommand::Leave { actor } => {
                if self.world.leave(actor).is_some() {
                    out.push(format!("{} left", actor));
                } else {
                    out.push(format!("{} is not online", actor));
                }
            }
            ConsoleCommand::Fund { actor, amount } => {
                let balance = self.world.balance(actor).saturating_add(amount);
                self.world.set_balance(actor, balance);
                out.push(format!("{} balance {}", actor, balance));
            }
            ConsoleCommand::Stuck { actor } => {
                match self.scheduler.submit(actor, &mut self.world) {
                    Ok(_) | Err(RelocationError::DuplicateRequest { .. }) => {}
                    Err(err) => {
                        info!(%actor, %err, "relocation request not accepted");
                        out.push(format!("{}: {}", actor, err));
                    }
                }
            }
            ConsoleCommand::Cancel { actor } => {
                if let Err(err) = self.scheduler.cancel(actor, &mut self.world) {
                    out.push(format!("{}: {}", actor, err));
                }
            }
            ConsoleCommand::Status { actor } => match self.scheduler.status(actor) {
                Some(status) => {
                    let wait = self.scheduler.remaining_wait(actor).unwrap_or_default();
                    out.push(format!("{}: {:?}, {}s left", actor, status, wait.as_secs()));
                }
                None => out.push(format!("{}: no relocation pending", actor)),
            },
            ConsoleCommand::Claim { tile, group } => {
                let previous = self.board.claim(tile, group);
                out.push(format!(
                    "{} claimed by group {} (was {})",
                    tile,
                    group.0,
                    describe(previous)
                ));
            }
            ConsoleCommand::Unclaim { tile } => {
                let previous = self.board.unclaim(tile);
                out.push(format!("{} released (was {})", tile, describe(previous)));
            }
            ConsoleCommand::Fill {
                center,
                radius,
                group,
            } => {
                let changed = claim_square(&*self.board, center, radius, group);
                out.push(format!(
                    "group {} claimed {} tiles around {}",
                    group.0, changed, center
                ));
            }
            ConsoleCommand::Claims { group } => {
                let tiles = self.board.claims_of(group);
                let listed: Vec<String> = tiles.iter().map(ToString::to_string).collect();
                out.push(format!(
                    "group {} holds {} of {} claimed tiles: {}",
                    group.0,
                    tiles.len(),
                    self.board.claimed_count(),
                    listed.join(" ")
                ));
            }
            ConsoleCommand::Owner { tile } => {
                out.push(format!("{} owner: {}", tile, describe(self.board.owner_at(tile))));
            }
            ConsoleCommand::Level { group, level } => {
                self.world.set_upgrade_level(group, SPAWNER_UPGRADE, level);
                out.push(format!("group {} spawner level {}", group.0, level));
            }
            ConsoleCommand::Spawn { tile, base_delay } => {
                let delay = self.spawner.spawn_delay(tile, base_delay, &self.world);
                out.push(format!("{} spawn delay {} ticks", tile, delay));
            }
            ConsoleCommand::Height { world, x, z, y } => {
                self.world.set_surface(world, x, z, y);
                out.push(format!("surface at {}:({},{}) is {}", world.0, x, z, y));
            }
            ConsoleCommand::Reject { enabled } => {
                self.world.set_reject_moves(enabled);
                out.push(format!("movement rejection {}", if enabled { "on" } else { "off" }));
            }
            ConsoleCommand::Tick { count } => {
                let mut resolved = 0;
                let mut expired = 0;
                for _ in 0..count {
                    let report = self.scheduler.tick(&mut self.world);
                    resolved += report.resolved.len();
                    expired += report.expired.len();
                }
                out.push(format!(
                    "tick {}: {} resolved, {} expired, {} live",
                    self.scheduler.now().0,
                    resolved,
                    expired,
                    self.scheduler.live_requests()
                ));
            }
            ConsoleCommand::Shutdown => {
                let dropped = self.scheduler.clear();
                let cache = self.spawner.stats();
                info!(
                    dropped,
                    cache_hits = cache.hits,
                    cache_misses = cache.misses,
                    cache_evictions = cache.evictions,
                    cache_tiles = self.spawner.cached_tiles(),
                    "console shutting down"
                );
                out.push(format!(
                    "dropped {} pending relocations, owner cache hit rate {:.0}%",
                    dropped,
                    cache.hit_rate() * 100.0
                ));
                return ConsoleFlow::Shutdown;
            }
            ConsoleCommand::Unknown(name) => {
                warn!(command = %name, "unknown console command");
                out.push(format!("unknown command !{}", name));
            }
        }

        for (actor, event) in self.world.drain_events() {
            out.push(format!("{}: {}", actor, event));
        }
        ConsoleFlow::Continue
    }
}

fn describe(owner: OwnerRef) -> String {
    match owner {
        OwnerRef::Unclaimed => "wilderness".to_string(),
        OwnerRef::Group(group) => format!("group {}", group.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RelocationSettings, UpgradeSettings};
    use crate::relocation::request::ActorId;
    use crate::world::position::AreaCoordinate;
    use std::collections::BTreeMap;

    fn console() -> Console {
        let config = FileConfig {
            relocation: RelocationSettings {
                delay_secs: 2,
                tick_millis: 1000,
                search_radius: 4,
                ..RelocationSettings::default()
            },
            ..FileConfig::default()
        };
        Console::new(&config).expect("console")
    }

    fn run(console: &mut Console, lines: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        for line in lines {
            console.handle_line(line, &mut out);
        }
        out
    }

    #[test]
    fn stuck_actor_lands_outside_claim() {
        let mut console = console();
        let out = run(
            &mut console,
            &[
                "!join 1 0 8 70 8",
                "!fill 0 0 0 1 5",
                "!stuck 1",
                "!tick 2",
            ],
        );
        assert!(out.iter().any(|line| line == "group 5 claimed 9 tiles around 0:[0,0]"));
        assert!(out.iter().any(|line| line == "actor#1: relocating in 2s"));
        assert!(out.iter().any(|line| line.starts_with("actor#1: relocated to")));

        let location = console.world().location(ActorId(1)).expect("online");
        let tile = AreaCoordinate::containing(&location);
        assert_eq!(console.board.owner_at(tile), OwnerRef::Unclaimed);
        assert_eq!(console.scheduler().live_requests(), 0);
    }

    #[test]
    fn duplicate_and_cancel_are_reported() {
        let mut console = console();
        let out = run(
            &mut console,
            &["!join 1 0 8 70 8", "!stuck 1", "!stuck 1", "!cancel 1", "!cancel 1"],
        );
        assert!(out.iter().any(|line| line == "actor#1: already relocating, 2s left"));
        assert!(out.iter().any(|line| line == "actor#1: relocation cancelled"));
        assert!(out.iter().any(|line| line == "actor#1: no relocation request to cancel"));
    }

    #[test]
    fn refused_submissions_are_reported() {
        let mut console = console();
        let out = run(&mut console, &["!stuck 9"]);
        assert_eq!(out, vec!["actor#9: actor is no longer present".to_string()]);

        let config = FileConfig {
            relocation: RelocationSettings {
                cost: 5,
                ..RelocationSettings::default()
            },
            ..FileConfig::default()
        };
        let mut console = Console::new(&config).expect("console");
        let out = run(&mut console, &["!join 1 0 8 70 8", "!stuck 1"]);
        assert_eq!(
            out.last().map(String::as_str),
            Some("actor#1: submission refused: costs 5, balance is 0")
        );
        assert_eq!(console.scheduler().live_requests(), 0);

        let out = run(&mut console, &["!fund 1 5", "!stuck 1"]);
        assert_eq!(out.last().map(String::as_str), Some("actor#1: relocating in 30s"));
        assert_eq!(console.world().balance(ActorId(1)), 0);
    }

    #[test]
    fn claims_lists_group_tiles() {
        let mut console = console();
        let out = run(
            &mut console,
            &["!claim 0 1 2 4", "!claim 0 -1 0 4", "!claim 0 5 5 7", "!claims 4"],
        );
        assert_eq!(
            out.last().map(String::as_str),
            Some("group 4 holds 2 of 3 claimed tiles: 0:[-1,0] 0:[1,2]")
        );
    }

    #[test]
    fn spawner_follows_owner_level() {
        let config = FileConfig {
            upgrades: UpgradeSettings {
                spawner_rates: BTreeMap::from([(0, 1.0), (1, 2.0)]),
                cache_capacity: 8,
            },
            ..FileConfig::default()
        };
        let mut console = Console::new(&config).expect("console");
        let out = run(
            &mut console,
            &["!claim 0 3 3 2", "!level 2 1", "!spawn 0 3 3 100", "!spawn 0 4 3 100"],
        );
        assert!(out.iter().any(|line| line == "0:[3,3] spawn delay 50 ticks"));
        assert!(out.iter().any(|line| line == "0:[4,3] spawn delay 100 ticks"));
    }

    #[test]
    fn shutdown_and_errors() {
        let mut console = console();
        let mut out = Vec::new();
        assert_eq!(console.handle_line("!stuck x", &mut out), ConsoleFlow::Continue);
        assert_eq!(out, vec!["error: console command has invalid actor 'x'".to_string()]);
        assert_eq!(console.handle_line("just chatting", &mut out), ConsoleFlow::Continue);
        out.clear();
        console.handle_line("!join 1 0 8 70 8", &mut out);
        console.handle_line("!stuck 1", &mut out);
        console.handle_line("!spawn 0 0 0 10", &mut out);
        console.handle_line("!spawn 0 0 0 10", &mut out);
        out.clear();
        assert_eq!(console.handle_line("!shutdown", &mut out), ConsoleFlow::Shutdown);
        assert_eq!(
            out,
            vec!["dropped 1 pending relocations, owner cache hit rate 50%".to_string()]
        );
        assert_eq!(console.scheduler().live_requests(), 0);
    }
}
