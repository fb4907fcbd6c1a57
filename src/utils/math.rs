//! # Path Mathematics
//!
//! Continuous 2D vectors and angle helpers used while walking paths.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

use crate::utils::Position;

/// A point or direction in continuous path space.
///
/// # Examples
///
/// ```
/// use delve::Vector2;
///
/// let step = Vector2::from_angle(0.0, 2.0);
/// assert_eq!(step, Vector2::new(2.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    /// Creates a new vector.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Creates a vector of the given length pointing along `angle` (radians).
    pub fn from_angle(angle: f64, length: f64) -> Self {
        Self::new(length * angle.cos(), length * angle.sin())
    }

    /// Euclidean length of the vector.
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Distance to another point.
    pub fn distance(self, other: Vector2) -> f64 {
        (self - other).length()
    }

    /// Rounds to the nearest grid cell, ties away from zero on both axes.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Position, Vector2};
    ///
    /// assert_eq!(Vector2::new(0.5, -0.5).to_grid(), Position::new(1, -1));
    /// assert_eq!(Vector2::new(2.49, 3.51).to_grid(), Position::new(2, 4));
    /// ```
    pub fn to_grid(self) -> Position {
        Position::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<Position> for Vector2 {
    fn from(pos: Position) -> Self {
        Self::new(pos.x as f64, pos.y as f64)
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, scale: f64) -> Self {
        Self::new(self.x * scale, self.y * scale)
    }
}

/// Splits an expected count into its guaranteed part and the chance of one more.
///
/// `2.25` means two items always and a third with probability 0.25.
pub fn split_expected_count(expected: f64) -> (usize, f64) {
    let whole = expected.floor();
    (whole as usize, expected - whole)
}

/// Classifies a heading into one of nine 45 degree buckets.
///
/// The bucket is `((|degrees| mod 360) + 23) / 45` using integer division, so
/// both `0` and `8` mean "east-west" and `4` means "west-east".
pub fn facing_octant(facing: f64) -> usize {
    let degrees = facing.to_degrees().abs() % 360.0;
    ((degrees + 23.0) / 45.0).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_vector_arithmetic() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(3.0, -1.0);
        assert_eq!(a + b, Vector2::new(4.0, 1.0));
        assert_eq!(b - a, Vector2::new(2.0, -3.0));
        assert_eq!(a * 2.0, Vector2::new(2.0, 4.0));
        assert!((Vector2::new(3.0, 4.0).length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_grid_rounding_ties_away_from_zero() {
        assert_eq!(Vector2::new(1.5, 2.5).to_grid(), Position::new(2, 3));
        assert_eq!(Vector2::new(-1.5, -2.5).to_grid(), Position::new(-2, -3));
        assert_eq!(Vector2::new(0.49, -0.49).to_grid(), Position::new(0, 0));
    }

    #[test]
    fn test_split_expected_count() {
        assert_eq!(split_expected_count(0.0), (0, 0.0));
        let (whole, extra) = split_expected_count(2.25);
        assert_eq!(whole, 2);
        assert!((extra - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_facing_octant() {
        assert_eq!(facing_octant(0.0), 0);
        assert_eq!(facing_octant(FRAC_PI_4), 1);
        assert_eq!(facing_octant(FRAC_PI_2), 2);
        assert_eq!(facing_octant(-FRAC_PI_2), 2);
        assert_eq!(facing_octant(PI), 4);
        assert_eq!(facing_octant(2.0 * PI - 0.01), 8);
        assert_eq!(facing_octant(5.0 * PI), 4);
    }
}
