use crate::world::position::{AreaCoordinate, Direction};

/// Resumable outward walk over the tiles around a center, one ring at a time.
///
/// Ring 0 is the center alone. Ring `r` is the border of the `(2r+1)x(2r+1)`
/// square, entered at its north-west corner and walked clockwise. Every tile
/// of ring `r` is yielded before any tile of ring `r + 1`; tiles that would
/// leave the `i32` coordinate space are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingSearch {
    center: AreaCoordinate,
    max_radius: u32,
    radius: u32,
    index: u64,
    visited: u64,
    exhausted: bool,
}

/// Outcome of one budgeted slice of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    Found(AreaCoordinate),
    Pending,
    Exhausted,
}

impl RingSearch {
    pub fn new(center: AreaCoordinate, max_radius: u32) -> Self {
        Self {
            center,
            max_radius,
            radius: 0,
            index: 0,
            visited: 0,
            exhausted: false,
        }
    }

    pub fn visited(&self) -> u64 {
        self.visited
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn advance(&mut self) -> Option<AreaCoordinate> {
        while !self.exhausted {
            let candidate = self.tile_at(self.radius, self.index);
            self.move_cursor();
            if let Some(tile) = candidate {
                self.visited += 1;
                return Some(tile);
            }
        }
        None
    }

    fn move_cursor(&mut self) {
        self.index += 1;
        if self.index < ring_len(self.radius) {
            return;
        }
        if self.radius >= self.max_radius {
            self.exhausted = true;
            return;
        }
        self.radius += 1;
        self.index = 0;
    }

    fn tile_at(&self, radius: u32, index: u64) -> Option<AreaCoordinate> {
        if radius == 0 {
            return Some(self.center);
        }
        let r = i64::from(radius);
        let side_len = 2 * r;
        let index = index as i64;
        let side = index / side_len;
        let step = index % side_len;

        let (corner_x, corner_z) = match side {
            0 => (-r, -r),
            1 => (r, -r),
            2 => (r, r),
            _ => (-r, r),
        };
        let mut direction = Direction::East;
        for _ in 0..side {
            direction = direction.clockwise();
        }
        let delta = direction.delta();
        let x = i64::from(self.center.x) + corner_x + i64::from(delta.dx) * step;
        let z = i64::from(self.center.z) + corner_z + i64::from(delta.dz) * step;

        Some(AreaCoordinate {
            world: self.center.world,
            x: i32::try_from(x).ok()?,
            z: i32::try_from(z).ok()?,
        })
    }
}

impl Iterator for RingSearch {
    type Item = AreaCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl std::iter::FusedIterator for RingSearch {}

/// Advances `search` by at most `budget` tiles, stopping at the first tile
/// `accept` approves.
pub fn search_step<F>(search: &mut RingSearch, budget: u32, mut accept: F) -> SearchStep
where
    F: FnMut(AreaCoordinate) -> bool,
{
    for _ in 0..budget {
        match search.advance() {
            Some(tile) => {
                if accept(tile) {
                    return SearchStep::Found(tile);
                }
            }
            None => return SearchStep::Exhausted,
        }
    }
    if search.is_exhausted() {
        SearchStep::Exhausted
    } else {
        SearchStep::Pending
    }
}

fn ring_len(radius: u32) -> u64 {
    if radius == 0 {
        1
    } else {
        8 * u64::from(radius)
    }
}
