use crate::world::position::AreaCoordinate;
use crate::world::ring::RingSearch;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerRef {
    Unclaimed,
    Group(GroupId),
}

/// Area ownership storage shared by every relocation search and claim command.
///
/// Reads are point-in-time per tile. A claim made while a search is running is
/// seen by the next tile that search reads.
pub trait OwnershipBoard: Send + Sync {
    /// Owner of `coord`; tiles never claimed are [`OwnerRef::Unclaimed`].
    fn owner_at(&self, coord: AreaCoordinate) -> OwnerRef;

    /// Assigns `coord` to `group` and returns the previous owner.
    fn claim(&self, coord: AreaCoordinate, group: GroupId) -> OwnerRef;

    /// Returns `coord` to the wilderness and returns the previous owner.
    fn unclaim(&self, coord: AreaCoordinate) -> OwnerRef;

    /// Every tile currently owned by `group`, in coordinate order.
    fn claims_of(&self, group: GroupId) -> Vec<AreaCoordinate>;

    fn claimed_count(&self) -> usize;

    /// Counter bumped by every mutation that changed an owner.
    fn revision(&self) -> u64;

    fn is_unclaimed(&self, coord: AreaCoordinate) -> bool {
        self.owner_at(coord) == OwnerRef::Unclaimed
    }
}

/// Process-local board behind a reader-friendly lock.
#[derive(Debug, Default)]
pub struct MemoryBoard {
    claims: RwLock<HashMap<AreaCoordinate, GroupId>>,
    revision: AtomicU64,
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self, previous: OwnerRef, next: OwnerRef) {
        if previous != next {
            self.revision.fetch_add(1, Ordering::AcqRel);
        }
    }
}

impl OwnershipBoard for MemoryBoard {
    fn owner_at(&self, coord: AreaCoordinate) -> OwnerRef {
        let claims = self.claims.read().unwrap_or_else(PoisonError::into_inner);
        claims
            .get(&coord)
            .map(|group| OwnerRef::Group(*group))
            .unwrap_or(OwnerRef::Unclaimed)
    }

    fn claim(&self, coord: AreaCoordinate, group: GroupId) -> OwnerRef {
        let mut claims = self.claims.write().unwrap_or_else(PoisonError::into_inner);
        let previous = claims
            .insert(coord, group)
            .map(OwnerRef::Group)
            .unwrap_or(OwnerRef::Unclaimed);
        self.bump(previous, OwnerRef::Group(group));
        previous
    }

    fn unclaim(&self, coord: AreaCoordinate) -> OwnerRef {
        let mut claims = self.claims.write().unwrap_or_else(PoisonError::into_inner);
        let previous = claims
            .remove(&coord)
            .map(OwnerRef::Group)
            .unwrap_or(OwnerRef::Unclaimed);
        self.bump(previous, OwnerRef::Unclaimed);
        previous
    }

    fn claims_of(&self, group: GroupId) -> Vec<AreaCoordinate> {
        let claims = self.claims.read().unwrap_or_else(PoisonError::into_inner);
        let mut tiles: Vec<AreaCoordinate> = claims
            .iter()
            .filter(|(_, owner)| **owner == group)
            .map(|(coord, _)| *coord)
            .collect();
        tiles.sort();
        tiles
    }

    fn claimed_count(&self) -> usize {
        self.claims
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

/// Claims every tile within Chebyshev `radius` of `center` for `group`.
/// Returns how many tiles changed owner.
pub fn claim_square(
    board: &dyn OwnershipBoard,
    center: AreaCoordinate,
    radius: u32,
    group: GroupId,
) -> usize {
    RingSearch::new(center, radius)
        .filter(|coord| board.claim(*coord, group) != OwnerRef::Group(group))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::position::WorldId;
    use std::sync::Arc;

    const WORLD: WorldId = WorldId(0);

    fn tile(x: i32, z: i32) -> AreaCoordinate {
        AreaCoordinate::new(WORLD, x, z)
    }

    #[test]
    fn absent_tiles_are_unclaimed() {
        let board = MemoryBoard::new();
        assert_eq!(board.owner_at(tile(5, 5)), OwnerRef::Unclaimed);
        assert!(board.is_unclaimed(tile(5, 5)));
        assert_eq!(board.claimed_count(), 0);
    }

    #[test]
    fn claim_and_unclaim_report_previous_owner() {
        let board = MemoryBoard::new();
        let red = GroupId(1);
        let blue = GroupId(2);

        assert_eq!(board.claim(tile(0, 0), red), OwnerRef::Unclaimed);
        assert_eq!(board.owner_at(tile(0, 0)), OwnerRef::Group(red));
        assert_eq!(board.claim(tile(0, 0), blue), OwnerRef::Group(red));
        assert_eq!(board.unclaim(tile(0, 0)), OwnerRef::Group(blue));
        assert_eq!(board.unclaim(tile(0, 0)), OwnerRef::Unclaimed);
        assert!(board.is_unclaimed(tile(0, 0)));
    }

    #[test]
    fn worlds_do_not_share_claims() {
        let board = MemoryBoard::new();
        board.claim(tile(1, 1), GroupId(1));
        assert!(board.is_unclaimed(AreaCoordinate::new(WorldId(1), 1, 1)));
    }

    #[test]
    fn revision_moves_only_on_change() {
        let board = MemoryBoard::new();
        let start = board.revision();
        board.claim(tile(0, 0), GroupId(1));
        board.claim(tile(0, 0), GroupId(1));
        assert_eq!(board.revision(), start + 1);
        board.unclaim(tile(9, 9));
        assert_eq!(board.revision(), start + 1);
        board.unclaim(tile(0, 0));
        assert_eq!(board.revision(), start + 2);
    }

    #[test]
    fn claim_square_fills_the_square() {
        let board = MemoryBoard::new();
        let red = GroupId(3);
        board.claim(tile(0, 0), red);
        assert_eq!(claim_square(&board, tile(0, 0), 2, red), 24);
        assert_eq!(board.claimed_count(), 25);
        let claims = board.claims_of(red);
        assert_eq!(claims.first(), Some(&tile(-2, -2)));
        assert_eq!(claims.last(), Some(&tile(2, 2)));
        assert!(board.claims_of(GroupId(4)).is_empty());
    }

    #[test]
    fn shared_board_sees_claims_from_other_threads() {
        let board = Arc::new(MemoryBoard::new());
        let writer = Arc::clone(&board);
        let handle = std::thread::spawn(move || {
            for x in 0..32 {
                writer.claim(tile(x, 0), GroupId(9));
            }
        });
        handle.join().expect("writer thread");
        assert_eq!(board.claims_of(GroupId(9)).len(), 32);
    }
}
