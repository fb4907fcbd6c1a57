//! # Grid Geometry
//!
//! Integer grid positions, neighbor offset tables, axis-aligned bounds and the
//! weighted circular flood fill used to carve rooms and widen corridors.

use crate::{DelveError, DelveResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Represents a cell of the cave grid.
///
/// Positions order by `x` first, then `y`, which gives generated tile sets a
/// stable iteration order.
///
/// # Examples
///
/// ```
/// use delve::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.neighbors().len(), 8);
/// assert_eq!(pos.chebyshev_distance(Position::new(12, 9)), 4);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Returns the position shifted by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    /// Calculates the Manhattan distance to another position.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Calculates the Chebyshev (king move) distance to another position.
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        (self.x - other.x).abs().max((self.y - other.y).abs()) as u32
    }

    /// Returns all 8 surrounding positions.
    pub fn neighbors(self) -> Vec<Position> {
        SURROUNDING_OFFSETS.iter().map(|&offset| self + offset).collect()
    }

    /// Returns only the 4 orthogonal neighbors.
    pub fn orthogonal_neighbors(self) -> Vec<Position> {
        ORTHOGONAL_OFFSETS.iter().map(|&offset| self + offset).collect()
    }

    /// Rotates an offset by 90 degrees counter-clockwise around the origin.
    pub fn rotate_quarter(self) -> Position {
        Position::new(-self.y, self.x)
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Unit steps along the grid axes.
pub const ORTHOGONAL_OFFSETS: [Position; 4] = [
    Position { x: 0, y: -1 },
    Position { x: -1, y: 0 },
    Position { x: 1, y: 0 },
    Position { x: 0, y: 1 },
];

/// Unit diagonal steps.
pub const DIAGONAL_OFFSETS: [Position; 4] = [
    Position { x: -1, y: -1 },
    Position { x: 1, y: -1 },
    Position { x: -1, y: 1 },
    Position { x: 1, y: 1 },
];

/// Every cell touching the origin, orthogonal or diagonal.
pub const SURROUNDING_OFFSETS: [Position; 8] = [
    Position { x: -1, y: -1 },
    Position { x: 0, y: -1 },
    Position { x: 1, y: -1 },
    Position { x: -1, y: 0 },
    Position { x: 1, y: 0 },
    Position { x: -1, y: 1 },
    Position { x: 0, y: 1 },
    Position { x: 1, y: 1 },
];

/// Inclusive axis-aligned rectangle of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Position,
    pub max: Position,
}

impl Bounds {
    /// Creates bounds from two corners in any order.
    pub fn new(a: Position, b: Position) -> Self {
        Self {
            min: Position::new(a.x.min(b.x), a.y.min(b.y)),
            max: Position::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Square of side `2 * half_extent + 1` centered on `center`.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Bounds, Position};
    ///
    /// let bounds = Bounds::centered(Position::new(4, 4), 2);
    /// assert_eq!(bounds.side(), 5);
    /// assert!(bounds.contains(Position::new(6, 2)));
    /// assert!(!bounds.contains(Position::new(7, 4)));
    /// ```
    pub fn centered(center: Position, half_extent: u32) -> Self {
        let half = half_extent as i32;
        Self {
            min: Position::new(center.x - half, center.y - half),
            max: Position::new(center.x + half, center.y + half),
        }
    }

    /// Smallest bounds containing every position, or `None` for an empty input.
    pub fn enclosing<I: IntoIterator<Item = Position>>(positions: I) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |bounds, pos| bounds.expanded_to(pos)))
    }

    /// Grows the bounds just enough to contain `pos`.
    pub fn expanded_to(self, pos: Position) -> Self {
        Self {
            min: Position::new(self.min.x.min(pos.x), self.min.y.min(pos.y)),
            max: Position::new(self.max.x.max(pos.x), self.max.y.max(pos.y)),
        }
    }

    /// Grows the bounds by `margin` cells on every side.
    pub fn padded(self, margin: i32) -> Self {
        Self {
            min: Position::new(self.min.x - margin, self.min.y - margin),
            max: Position::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Checks whether a position lies inside (edges included).
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// Width in cells.
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    /// Height in cells.
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    /// Side length of a square bounds (the larger extent otherwise).
    pub fn side(&self) -> i32 {
        self.width().max(self.height())
    }
}

/// Frontier entry for the circle fill search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FillNode {
    cost: u32,
    position: Position,
    /// The step that reached this node was a cost-1 diagonal, so the next
    /// diagonal costs 2.
    used_discount: bool,
}

impl Ord for FillNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior in BinaryHeap
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| self.position.cmp(&other.position))
            .then_with(|| self.used_discount.cmp(&other.used_discount))
    }
}

impl PartialOrd for FillNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Offsets of every cell within `radius` movement cost of the origin.
///
/// Orthogonal steps cost 1. Diagonal steps alternate between 1 and 2 while they
/// are chained, and an orthogonal step resets the alternation. The result is
/// sorted and contains each offset once.
///
/// # Examples
///
/// ```
/// use delve::{circle_fill, Position};
///
/// assert_eq!(circle_fill(0).unwrap(), vec![Position::origin()]);
/// assert_eq!(circle_fill(1).unwrap().len(), 9);
/// // Two chained diagonals cost 1 + 2, so (2, 2) is out of reach at radius 2.
/// assert!(!circle_fill(2).unwrap().contains(&Position::new(2, 2)));
/// assert!(circle_fill(-1).is_err());
/// ```
pub fn circle_fill(radius: i32) -> DelveResult<Vec<Position>> {
    if radius < 0 {
        return Err(DelveError::NegativeRadius(radius));
    }
    let radius = radius as u32;

    let mut best_cost: HashMap<(Position, bool), u32> = HashMap::new();
    let mut frontier = BinaryHeap::new();
    let mut reached = HashSet::new();

    best_cost.insert((Position::origin(), false), 0);
    frontier.push(FillNode {
        cost: 0,
        position: Position::origin(),
        used_discount: false,
    });

    while let Some(node) = frontier.pop() {
        // Skip stale entries, a cheaper cost was recorded after this one was queued
        let recorded = best_cost
            .get(&(node.position, node.used_discount))
            .copied()
            .unwrap_or(u32::MAX);
        if node.cost > recorded {
            continue;
        }
        reached.insert(node.position);

        let orthogonal = ORTHOGONAL_OFFSETS
            .iter()
            .map(|&offset| (offset, node.cost + 1, false));
        let diagonal_step = if node.used_discount {
            (node.cost + 2, false)
        } else {
            (node.cost + 1, true)
        };
        let diagonal = DIAGONAL_OFFSETS
            .iter()
            .map(|&offset| (offset, diagonal_step.0, diagonal_step.1));

        for (offset, cost, used_discount) in orthogonal.chain(diagonal) {
            if cost > radius {
                continue;
            }
            let key = (node.position + offset, used_discount);
            if cost < best_cost.get(&key).copied().unwrap_or(u32::MAX) {
                best_cost.insert(key, cost);
                frontier.push(FillNode {
                    cost,
                    position: key.0,
                    used_discount,
                });
            }
        }
    }

    let mut cells: Vec<Position> = reached.into_iter().collect();
    cells.sort();
    Ok(cells)
}

/// Caches circle fills by radius, since rasterization asks for the same few
/// radii many times.
#[derive(Debug, Default, Clone)]
pub struct CircleFillCache {
    fills: HashMap<u32, Vec<Position>>,
}

impl CircleFillCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the circle fill offsets for `radius`, computing them once.
    pub fn offsets(&mut self, radius: u32) -> DelveResult<&[Position]> {
        if !self.fills.contains_key(&radius) {
            let radius_i32 = i32::try_from(radius).map_err(|_| {
                DelveError::InvalidParameters(format!("circle radius {radius} is too large"))
            })?;
            self.fills.insert(radius, circle_fill(radius_i32)?);
        }
        Ok(self.fills.get(&radius).map(Vec::as_slice).unwrap_or(&[]))
    }
}
