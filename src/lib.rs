pub mod admin;
pub mod config;
pub mod relocation;
pub mod telemetry;
pub mod upgrades;
pub mod world;

use std::io::{BufRead, Write};

pub use admin::console::{Console, ConsoleFlow};
pub use config::{AppConfig, ConfigError, FileConfig, RelocationSettings, UpgradeSettings};
pub use relocation::events::{RelocationError, RelocationEvent};
pub use relocation::host::{
    GateDecision, HeightLookup, Liveness, MovementBackend, NotificationSink, RelocationHost,
    SubmissionGate,
};
pub use relocation::request::{ActorId, RelocationRequest, RequestStatus};
pub use relocation::scheduler::{RelocationScheduler, TickReport};
pub use upgrades::spawner::{SpawnerUpgrade, UpgradeLevels};
pub use world::board::{claim_square, GroupId, MemoryBoard, OwnerRef, OwnershipBoard};
pub use world::position::{AreaCoordinate, Location, WorldId, TILE_SIZE};
pub use world::ring::{search_step, RingSearch, SearchStep};

pub fn run(args: &[String]) -> Result<(), String> {
    let config = AppConfig::from_args(args)?;
    telemetry::logging::init(&config.settings.log)?;
    let mut console = Console::new(&config.settings).map_err(|err| err.to_string())?;
    tracing::info!(
        config = ?config.config_path,
        delay_secs = config.settings.relocation.delay_secs,
        search_radius = config.settings.relocation.search_radius,
        delay_ticks = console.scheduler().delay_ticks(),
        "territory console ready"
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| format!("stdin read failed: {}", err))?;
        let flow = console.handle_line(&line, &mut out);
        let mut handle = stdout.lock();
        for message in out.drain(..) {
            writeln!(handle, "{}", message).map_err(|err| format!("stdout write failed: {}", err))?;
        }
        if flow == ConsoleFlow::Shutdown {
            break;
        }
    }
    tracing::info!("territory console stopped");
    Ok(())
}
