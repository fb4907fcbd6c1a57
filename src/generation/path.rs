//! # Path Growth
//!
//! Recursive random walks that grow the corridor network of a cave.
//!
//! A path walks a curving polyline from its origin. While walking it may flip
//! the sign of its curvature (an inflection) or mark a bottleneck. A path with at
//! least two inflections then scatters chamber points along the polyline and
//! places fork points between neighboring inflections. Each fork point grows a child path with the
//! parameters of the next level, turning away from the parent's curve.

use crate::config::{MAX_FORK_ANGLE_DEGREES, MIN_FORK_ANGLE_DEGREES};
use crate::generation::PathParameters;
use crate::utils::{split_expected_count, Vector2};
use crate::{DelveError, DelveResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A flagged position along a path's main polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeaturePoint {
    /// Location in path space
    pub point: Vector2,
    /// Index of the waypoint in the main polyline
    pub index: usize,
    /// Heading at this point, in radians
    pub facing: f64,
    /// Heading change per step at this point
    pub curvature: f64,
}

/// One node of the generated corridor tree.
///
/// Built once by [`Path::new`] and never modified afterwards. Children in
/// [`Path::forks`] correspond one to one, in order, with [`Path::fork_points`]
/// unless this path sits at the last parameter level.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    parameters: PathParameters,
    level: usize,
    main: Vec<Vector2>,
    facings: Vec<f64>,
    inflection_pts: Vec<FeaturePoint>,
    bottleneck_pts: Vec<FeaturePoint>,
    fork_pts: Vec<FeaturePoint>,
    chamber_pts: Vec<Vector2>,
    forks: Vec<Path>,
}

impl Path {
    /// Grows a path tree, one level per entry in `parameter_list`.
    ///
    /// The root uses the first entry with its curvature sign flipped on a coin
    /// toss. Every deeper level clones its template before changing it.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Path, PathParameters};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let path = Path::new(&[PathParameters::straight(10.0)], &mut rng).unwrap();
    /// assert_eq!(path.main().len(), 10);
    /// assert!(path.forks().is_empty());
    /// ```
    pub fn new<R: Rng + ?Sized>(
        parameter_list: &[PathParameters],
        rng: &mut R,
    ) -> DelveResult<Self> {
        let template = parameter_list
            .first()
            .ok_or(DelveError::EmptyParameterList)?;
        for parameters in parameter_list {
            parameters.validate()?;
        }

        let mut parameters = template.clone();
        if rng.gen_bool(0.5) {
            parameters.curvature = -parameters.curvature;
        }

        Ok(Self::grow(parameters, parameter_list, 0, rng))
    }

    /// Generates this level and recurses into forks for deeper levels.
    fn grow<R: Rng + ?Sized>(
        mut parameters: PathParameters,
        parameter_list: &[PathParameters],
        level: usize,
        rng: &mut R,
    ) -> Self {
        parameters.choke.set_value(rng);
        parameters.bottleneck.set_value(rng);
        parameters.chamber.set_value(rng);

        let mut path = Self::create_path(parameters, level, rng);

        let next_level = level + 1;
        if let Some(template) = parameter_list.get(next_level) {
            let forks: Vec<Path> = path
                .fork_pts
                .iter()
                .map(|fork| {
                    let mut child = template.clone();
                    child.origin = fork.point;
                    let turn = rng
                        .gen_range(MIN_FORK_ANGLE_DEGREES..=MAX_FORK_ANGLE_DEGREES)
                        .to_radians();
                    child.initial_facing = fork.facing - turn * fork.curvature.signum();
                    Self::grow(child, parameter_list, next_level, &mut *rng)
                })
                .collect();
            path.forks = forks;
        }

        path
    }

    /// Walks a single level: main polyline, inflections, bottlenecks, chambers
    /// and fork points. No child paths are grown.
    pub fn create_path<R: Rng + ?Sized>(
        parameters: PathParameters,
        level: usize,
        rng: &mut R,
    ) -> Self {
        let count = parameters.step_count();
        let step = parameters.step_size;
        let inflection_chance = parameters.inflection_rate * step;
        let bottleneck_chance = parameters.bottleneck_rate * step;
        let mut d_theta = parameters.curvature * step;
        let mut theta = parameters.initial_facing;

        let mut main = Vec::with_capacity(count);
        let mut facings = Vec::with_capacity(count);
        let mut inflection_pts = Vec::new();
        let mut bottleneck_pts = Vec::new();
        main.push(parameters.origin);
        facings.push(theta);

        for i in 1..count {
            theta += d_theta;
            let next = main[i - 1] + Vector2::from_angle(theta, step);
            main.push(next);
            facings.push(theta);

            // One roll per step; a bottleneck wins over an inflection
            let roll: f64 = rng.gen();
            if roll < bottleneck_chance {
                bottleneck_pts.push(FeaturePoint {
                    point: main[i - 1],
                    index: i - 1,
                    facing: theta,
                    curvature: d_theta,
                });
            } else if roll < inflection_chance {
                d_theta = -d_theta;
                inflection_pts.push(FeaturePoint {
                    point: main[i],
                    index: i,
                    facing: theta,
                    curvature: d_theta,
                });
            }
        }

        // Chambers and forks only appear on paths with at least two inflections
        let mut chamber_pts = Vec::new();
        let mut fork_pts = Vec::new();
        if inflection_pts.len() > 1 {
            let chamber_count = roll_count(parameters.chamber_number, rng);
            chamber_pts = (0..chamber_count)
                .map(|_| main[rng.gen_range(0..main.len())])
                .collect();

            let fork_count = roll_count(parameters.fork_number, rng);
            for _ in 0..fork_count {
                let pair = rng.gen_range(0..inflection_pts.len() - 1);
                let first: FeaturePoint = inflection_pts[pair];
                let second: FeaturePoint = inflection_pts[pair + 1];
                let half = (second.index - first.index) / 2;
                let index = first.index + half;
                fork_pts.push(FeaturePoint {
                    point: main[index],
                    index,
                    facing: first.facing + half as f64 * first.curvature,
                    curvature: first.curvature,
                });
            }
        }

        Self {
            parameters,
            level,
            main,
            facings,
            inflection_pts,
            bottleneck_pts,
            fork_pts,
            chamber_pts,
            forks: Vec::new(),
        }
    }

    /// Parameters this path was actually generated with, knob settings included.
    pub fn parameters(&self) -> &PathParameters {
        &self.parameters
    }

    /// Recursion level, 0 for the root.
    pub fn level(&self) -> usize {
        self.level
    }

    /// First waypoint of the main polyline.
    pub fn origin(&self) -> Vector2 {
        self.main[0]
    }

    /// Ordered waypoints of the walk.
    pub fn main(&self) -> &[Vector2] {
        &self.main
    }

    /// Heading at each waypoint, parallel to [`Path::main`].
    pub fn facings(&self) -> &[f64] {
        &self.facings
    }

    /// Points where the curve changed direction, in walk order.
    pub fn inflection_points(&self) -> &[FeaturePoint] {
        &self.inflection_pts
    }

    /// Points marked as bottlenecks, in walk order.
    pub fn bottleneck_points(&self) -> &[FeaturePoint] {
        &self.bottleneck_pts
    }

    /// Points where child paths branch off.
    pub fn fork_points(&self) -> &[FeaturePoint] {
        &self.fork_pts
    }

    /// Chamber centers, drawn from the main polyline.
    pub fn chamber_points(&self) -> &[Vector2] {
        &self.chamber_pts
    }

    /// Child paths, one per fork point.
    pub fn forks(&self) -> &[Path] {
        &self.forks
    }

    /// Fork points paired with the child path they spawned.
    pub fn branches(&self) -> impl Iterator<Item = (&FeaturePoint, &Path)> {
        self.fork_pts.iter().zip(self.forks.iter())
    }

    /// Number of levels in this subtree, counting this path.
    pub fn depth(&self) -> usize {
        1 + self.forks.iter().map(Path::depth).max().unwrap_or(0)
    }

    /// Number of paths in this subtree, counting this path.
    pub fn path_count(&self) -> usize {
        1 + self.forks.iter().map(Path::path_count).sum::<usize>()
    }

    /// Follows fork indices down from this path.
    pub fn descendant(&self, address: &[usize]) -> Option<&Path> {
        address
            .iter()
            .try_fold(self, |path, &fork| path.forks.get(fork))
    }
}

/// Whole part of `expected` plus one more with probability of the fraction.
fn roll_count<R: Rng + ?Sized>(expected: f64, rng: &mut R) -> usize {
    let (whole, extra) = split_expected_count(expected);
    if extra > 0.0 && rng.gen_bool(extra) {
        whole + 1
    } else {
        whole
    }
}
