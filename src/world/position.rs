/// Width of one area tile, in blocks.
pub const TILE_SIZE: i32 = 16;
const TILE_SHIFT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub u32);

/// A discrete tile of the world at area granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaCoordinate {
    pub world: WorldId,
    pub x: i32,
    pub z: i32,
}

/// Block-precision position of an actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaDelta {
    pub dx: i32,
    pub dz: i32,
}

impl AreaCoordinate {
    pub fn new(world: WorldId, x: i32, z: i32) -> Self {
        Self { world, x, z }
    }

    pub fn containing(location: &Location) -> Self {
        Self {
            world: location.world,
            x: block_to_tile(location.block_x()),
            z: block_to_tile(location.block_z()),
        }
    }

    pub fn chebyshev(self, other: AreaCoordinate) -> Option<u32> {
        if self.world != other.world {
            return None;
        }
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dz = (i64::from(self.z) - i64::from(other.z)).unsigned_abs();
        Some(dx.max(dz).min(u64::from(u32::MAX)) as u32)
    }

    /// Block column at the horizontal middle of the tile.
    pub fn center_block(self) -> (i32, i32) {
        (tile_center(self.x), tile_center(self.z))
    }
}

impl std::fmt::Display for AreaCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:[{},{}]", self.world.0, self.x, self.z)
    }
}

impl Location {
    pub fn new(world: WorldId, x: f64, y: f64, z: f64) -> Self {
        Self { world, x, y, z }
    }

    /// Center of a block column, standing on `y`.
    pub fn at_block(world: WorldId, block_x: i32, y: i32, block_z: i32) -> Self {
        Self {
            world,
            x: f64::from(block_x) + 0.5,
            y: f64::from(y),
            z: f64::from(block_z) + 0.5,
        }
    }

    pub fn block_x(&self) -> i32 {
        clamp_block(self.x)
    }

    pub fn block_y(&self) -> i32 {
        clamp_block(self.y)
    }

    pub fn block_z(&self) -> i32 {
        clamp_block(self.z)
    }

    /// Euclidean distance, ignoring worlds. Callers compare worlds first.
    pub fn distance(&self, other: &Location) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}:({},{},{})",
            self.world.0,
            self.block_x(),
            self.block_y(),
            self.block_z()
        )
    }
}

impl Direction {
    pub fn delta(self) -> AreaDelta {
        match self {
            Direction::North => AreaDelta { dx: 0, dz: -1 },
            Direction::East => AreaDelta { dx: 1, dz: 0 },
            Direction::South => AreaDelta { dx: 0, dz: 1 },
            Direction::West => AreaDelta { dx: -1, dz: 0 },
        }
    }

    /// Next direction turning clockwise when viewed from above.
    pub fn clockwise(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }
}

fn block_to_tile(block: i32) -> i32 {
    block >> TILE_SHIFT
}

fn tile_center(tile: i32) -> i32 {
    let start = i64::from(tile) * i64::from(TILE_SIZE) + i64::from(TILE_SIZE / 2);
    start.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn clamp_block(value: f64) -> i32 {
    let floored = value.floor();
    if floored.is_nan() {
        return 0;
    }
    floored.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}
