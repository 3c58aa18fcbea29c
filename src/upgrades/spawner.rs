use crate::config::UpgradeSettings;
use crate::world::board::{GroupId, OwnerRef, OwnershipBoard};
use crate::world::position::AreaCoordinate;
use lru::LruCache;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub const SPAWNER_UPGRADE: &str = "SPAWNER";

/// Upgrade levels bought by each group. Owned by the group-management side.
pub trait UpgradeLevels {
    fn upgrade_level(&self, group: GroupId, upgrade: &str) -> u32;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64) / (total as f64)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedOwner {
    revision: u64,
    owner: OwnerRef,
}

/// Spawn-rate upgrade: spawners on a group's land tick faster as the group
/// levels the upgrade. Tile owners are read through an LRU cache that is
/// discarded whenever the board's revision moves.
pub struct SpawnerUpgrade {
    rates: BTreeMap<u32, f64>,
    board: Arc<dyn OwnershipBoard>,
    cache: LruCache<AreaCoordinate, CachedOwner>,
    stats: CacheStats,
}

impl SpawnerUpgrade {
    pub fn new(settings: &UpgradeSettings, board: Arc<dyn OwnershipBoard>) -> Self {
        let capacity = NonZeroUsize::new(settings.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            rates: settings.spawner_rates.clone(),
            board,
            cache: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn cached_tiles(&self) -> usize {
        self.cache.len()
    }

    pub fn owner_at(&mut self, coord: AreaCoordinate) -> OwnerRef {
        let revision = self.board.revision();
        if let Some(cached) = self.cache.get(&coord) {
            if cached.revision == revision {
                self.stats.hits += 1;
                return cached.owner;
            }
        }

        self.stats.misses += 1;
        let owner = self.board.owner_at(coord);
        if let Some((evicted, _)) = self.cache.push(coord, CachedOwner { revision, owner }) {
            if evicted != coord {
                self.stats.evictions += 1;
            }
        }
        owner
    }

    /// Multiplier for `level`; unknown levels and non-positive rates count as 1.
    pub fn rate_for_level(&self, level: u32) -> f64 {
        match self.rates.get(&level) {
            Some(rate) if rate.is_finite() && *rate > 0.0 => *rate,
            _ => 1.0,
        }
    }

    pub fn rate_at(&mut self, coord: AreaCoordinate, levels: &dyn UpgradeLevels) -> f64 {
        let level = match self.owner_at(coord) {
            OwnerRef::Unclaimed => 0,
            OwnerRef::Group(group) => levels.upgrade_level(group, SPAWNER_UPGRADE),
        };
        self.rate_for_level(level)
    }

    /// Spawner delay (in ticks) after applying the owner's upgrade.
    pub fn spawn_delay(
        &mut self,
        coord: AreaCoordinate,
        base_delay: u32,
        levels: &dyn UpgradeLevels,
    ) -> u32 {
        let rate = self.rate_at(coord, levels);
        let delay = f64::from(base_delay) / rate;
        delay.clamp(0.0, f64::from(u32::MAX)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::board::MemoryBoard;
    use crate::world::position::{Location, WorldId};
    use std::collections::HashMap;

    const WORLD: WorldId = WorldId(0);
    const RED: GroupId = GroupId(1);

    struct FixedLevels(HashMap<GroupId, u32>);

    impl UpgradeLevels for FixedLevels {
        fn upgrade_level(&self, group: GroupId, upgrade: &str) -> u32 {
            assert_eq!(upgrade, SPAWNER_UPGRADE);
            self.0.get(&group).copied().unwrap_or(0)
        }
    }

    fn settings(capacity: usize) -> UpgradeSettings {
        UpgradeSettings {
            spawner_rates: BTreeMap::from([(0, 1.0), (1, 1.5), (2, 2.0), (3, 0.0)]),
            cache_capacity: capacity,
        }
    }

    fn tile(x: i32, z: i32) -> AreaCoordinate {
        AreaCoordinate::new(WORLD, x, z)
    }

    #[test]
    fn delay_scales_with_owner_level() {
        let board = Arc::new(MemoryBoard::new());
        board.claim(tile(0, 0), RED);
        let mut spawner = SpawnerUpgrade::new(&settings(16), board);
        let mut levels = FixedLevels(HashMap::from([(RED, 2)]));

        assert_eq!(spawner.spawn_delay(tile(0, 0), 400, &levels), 200);
        assert_eq!(spawner.spawn_delay(tile(1, 0), 400, &levels), 400);

        levels.0.insert(RED, 1);
        assert_eq!(spawner.spawn_delay(tile(0, 0), 300, &levels), 200);

        let inside = AreaCoordinate::containing(&Location::new(WORLD, 4.0, 64.0, 12.0));
        assert_eq!(spawner.spawn_delay(inside, 300, &levels), 200);
    }

    #[test]
    fn unknown_or_broken_rates_fall_back_to_one() {
        let board = Arc::new(MemoryBoard::new());
        let spawner = SpawnerUpgrade::new(&settings(4), board);
        assert_eq!(spawner.rate_for_level(2), 2.0);
        assert_eq!(spawner.rate_for_level(3), 1.0);
        assert_eq!(spawner.rate_for_level(9), 1.0);
    }

    #[test]
    fn cache_hits_until_board_changes() {
        let board = Arc::new(MemoryBoard::new());
        let mut spawner = SpawnerUpgrade::new(&settings(16), board.clone());

        assert_eq!(spawner.owner_at(tile(0, 0)), OwnerRef::Unclaimed);
        assert_eq!(spawner.owner_at(tile(0, 0)), OwnerRef::Unclaimed);
        assert_eq!(spawner.stats().hits, 1);
        assert_eq!(spawner.stats().misses, 1);

        board.claim(tile(0, 0), RED);
        assert_eq!(spawner.owner_at(tile(0, 0)), OwnerRef::Group(RED));
        assert_eq!(spawner.stats().misses, 2);
        assert_eq!(spawner.stats().hit_rate(), 1.0 / 3.0);
    }

    #[test]
    fn capacity_bounds_the_cache() {
        let board = Arc::new(MemoryBoard::new());
        let mut spawner = SpawnerUpgrade::new(&settings(0), board);
        spawner.owner_at(tile(0, 0));
        spawner.owner_at(tile(1, 0));
        spawner.owner_at(tile(2, 0));
        assert_eq!(spawner.cached_tiles(), 1);
        assert_eq!(spawner.stats().evictions, 2);
    }
}
