//! # Visibility
//!
//! Tracks which tiles have been revealed around a moving light source.

use crate::utils::{circle_fill, Position};
use crate::DelveResult;
use std::collections::{BTreeSet, HashSet};

/// Set of revealed tiles.
///
/// Each call to [`RevealMap::reveal`] reports only the tiles it newly revealed,
/// so a position is reported at most once over the map's lifetime.
///
/// # Examples
///
/// ```
/// use delve::{Position, RevealMap};
///
/// let mut map = RevealMap::new();
/// let light = RevealMap::light_offsets(1).unwrap();
///
/// let first = map.reveal(Position::new(0, 0), &light);
/// assert_eq!(first.len(), 9);
///
/// // Stepping east only uncovers the new column
/// let second = map.reveal(Position::new(1, 0), &light);
/// assert_eq!(second.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RevealMap {
    revealed: HashSet<Position>,
}

impl RevealMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offsets lit by a light of the given radius.
    pub fn light_offsets(radius: i32) -> DelveResult<Vec<Position>> {
        circle_fill(radius)
    }

    /// Reveals `location + offset` for every offset and returns the newly
    /// revealed positions, sorted.
    pub fn reveal(&mut self, location: Position, offsets: &[Position]) -> Vec<Position> {
        self.reveal_filtered(location, offsets, |_| true)
    }

    /// Like [`RevealMap::reveal`], but only tiles in `floor` can be revealed.
    pub fn reveal_on(
        &mut self,
        location: Position,
        offsets: &[Position],
        floor: &BTreeSet<Position>,
    ) -> Vec<Position> {
        self.reveal_filtered(location, offsets, |pos| floor.contains(pos))
    }

    fn reveal_filtered<F>(
        &mut self,
        location: Position,
        offsets: &[Position],
        keep: F,
    ) -> Vec<Position>
    where
        F: Fn(&Position) -> bool,
    {
        let fresh: BTreeSet<Position> = offsets
            .iter()
            .map(|&offset| location + offset)
            .filter(|pos| keep(pos) && !self.revealed.contains(pos))
            .collect();
        self.revealed.extend(fresh.iter().copied());
        fresh.into_iter().collect()
    }

    pub fn is_revealed(&self, pos: Position) -> bool {
        self.revealed.contains(&pos)
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    /// Forgets everything revealed so far.
    pub fn clear(&mut self) {
        self.revealed.clear();
    }
}
