//! # Cave Rasterization
//!
//! Turns a tree of [`Path`]s into a concrete set of floor tiles.
//!
//! The [`CaveManager`] runs a fixed sequence of phases. Each phase reads the sets
//! the previous one built, so they can neither be skipped nor reordered:
//!
//! 1. choose one parameter set per level from the [`ParameterPools`]
//! 2. grow the path tree
//! 3. rasterize floor and feature tiles level by level, recording bottleneck
//!    regions before any fork of the same or a deeper level is accepted
//! 4. carve chambers
//! 5. widen corridors by their choke
//!
//! Only a [`CavePhase::Ready`] manager hands out a [`CaveResult`].

use crate::generation::{ParameterPools, Path, PathParameters, PoolLevel};
use crate::utils::{facing_octant, Bounds, CircleFillCache, Position, Vector2};
use crate::{DelveError, DelveResult};
use log::{debug, info, trace};
use pathfinding::prelude::bfs_reach;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Kinds of feature tiles recorded for downstream decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Narrow passage; surrounded by an exclusion region
    Bottleneck,
    /// Where a child path branches off
    Fork,
    /// Center of a carved room
    Chamber,
}

/// Progress of a [`CaveManager`] through its generation phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CavePhase {
    Unconfigured,
    ParametersChosen,
    PathTreeBuilt,
    FloorAndFeaturesExtracted,
    ChambersCarved,
    Widened,
    Ready,
}

/// How a path tile is widened, by the axis its corridor runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidenPattern {
    /// Corridor runs east-west; widen north and south
    Horizontal,
    /// Corridor runs north-south; widen east and west
    Vertical,
    /// Corridor runs diagonally; widen with a circle fill
    Diagonal,
}

const WIDEN_PATTERNS: [WidenPattern; 9] = [
    WidenPattern::Horizontal,
    WidenPattern::Diagonal,
    WidenPattern::Vertical,
    WidenPattern::Diagonal,
    WidenPattern::Horizontal,
    WidenPattern::Diagonal,
    WidenPattern::Vertical,
    WidenPattern::Diagonal,
    WidenPattern::Horizontal,
];

impl WidenPattern {
    /// Classifies a continuous heading (radians).
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::generation::WidenPattern;
    ///
    /// assert_eq!(WidenPattern::for_facing(0.0), WidenPattern::Horizontal);
    /// assert_eq!(WidenPattern::for_facing(std::f64::consts::FRAC_PI_2), WidenPattern::Vertical);
    /// assert_eq!(WidenPattern::for_facing(-std::f64::consts::FRAC_PI_4), WidenPattern::Diagonal);
    /// ```
    pub fn for_facing(facing: f64) -> Self {
        WIDEN_PATTERNS[facing_octant(facing).min(WIDEN_PATTERNS.len() - 1)]
    }
}

/// Exclusion zone around a bottleneck tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BottleneckRegion {
    /// The bottleneck tile
    pub center: Position,
    /// Square of side `2 * bottleneck + 1` around the center
    pub bounds: Bounds,
    /// Path level that recorded the region
    pub level: usize,
}

/// Per-level counters gathered while rasterizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    pub level: usize,
    /// Paths rasterized at this level
    pub paths: usize,
    /// Floor tiles this level added (walk, chambers and widening)
    pub floor_tiles_added: usize,
    pub bottlenecks: usize,
    pub forks: usize,
    /// Fork points inside a bottleneck region; their child paths were dropped
    pub blocked_forks: usize,
    pub chambers: usize,
}

/// The finished cave, read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct CaveResult {
    /// Seed the cave was generated from, when known
    pub seed: Option<u64>,
    /// Tile the essential path starts on
    pub root_position: Position,
    /// Pools the parameter levels were drawn from, in level order
    pub pool_levels: Vec<PoolLevel>,
    /// Every floor tile
    pub floor_tiles: BTreeSet<Position>,
    /// Feature tiles, first writer wins
    pub features: BTreeMap<Position, FeatureKind>,
    /// Floor tiles where a path changed its curve direction
    pub inflection_tiles: BTreeSet<Position>,
    /// Floor tiles of single-file corridors; nothing blocking may spawn here
    pub zero_choke_tiles: BTreeSet<Position>,
    /// Exclusion regions in the order they were recorded
    pub bottleneck_regions: Vec<BottleneckRegion>,
    /// Counters for each rasterized path level
    pub level_stats: Vec<LevelStats>,
}

impl CaveResult {
    /// Number of parameter levels the cave was generated with.
    pub fn depth(&self) -> usize {
        self.pool_levels.len()
    }

    pub fn is_floor(&self, pos: Position) -> bool {
        self.floor_tiles.contains(&pos)
    }

    pub fn feature_at(&self, pos: Position) -> Option<FeatureKind> {
        self.features.get(&pos).copied()
    }

    /// Positions of every feature of one kind, in tile order.
    pub fn features_of(&self, kind: FeatureKind) -> impl Iterator<Item = Position> + '_ {
        self.features
            .iter()
            .filter(move |(_, &feature)| feature == kind)
            .map(|(&pos, _)| pos)
    }

    /// Checks whether a position lies in any bottleneck exclusion region.
    pub fn in_bottleneck_region(&self, pos: Position) -> bool {
        self.bottleneck_regions
            .iter()
            .any(|region| region.bounds.contains(pos))
    }

    /// Smallest bounds containing every floor tile.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(self.floor_tiles.iter().copied())
    }

    /// Checks that every floor tile can be reached from the root tile by
    /// orthogonal or diagonal steps.
    pub fn is_connected(&self) -> bool {
        if !self.is_floor(self.root_position) {
            return self.floor_tiles.is_empty();
        }
        let reachable = bfs_reach(self.root_position, |pos| {
            pos.neighbors()
                .into_iter()
                .filter(|neighbor| self.floor_tiles.contains(neighbor))
                .collect::<Vec<_>>()
        })
        .count();
        reachable == self.floor_tiles.len()
    }

    /// Serializes the cave to pretty JSON.
    pub fn to_json(&self) -> DelveResult<String> {
        let export = CaveExport {
            seed: self.seed,
            root_position: self.root_position,
            pool_levels: &self.pool_levels,
            floor_tiles: &self.floor_tiles,
            features: self
                .features
                .iter()
                .map(|(&position, &kind)| FeatureEntry { position, kind })
                .collect(),
            inflection_tiles: &self.inflection_tiles,
            zero_choke_tiles: &self.zero_choke_tiles,
            bottleneck_regions: &self.bottleneck_regions,
            level_stats: &self.level_stats,
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }
}

#[derive(Serialize)]
struct FeatureEntry {
    position: Position,
    kind: FeatureKind,
}

#[derive(Serialize)]
struct CaveExport<'a> {
    seed: Option<u64>,
    root_position: Position,
    pool_levels: &'a [PoolLevel],
    floor_tiles: &'a BTreeSet<Position>,
    features: Vec<FeatureEntry>,
    inflection_tiles: &'a BTreeSet<Position>,
    zero_choke_tiles: &'a BTreeSet<Position>,
    bottleneck_regions: &'a [BottleneckRegion],
    level_stats: &'a [LevelStats],
}

/// A path that made it onto the grid, addressed by fork indices from the root.
#[derive(Debug, Clone)]
struct PathNode {
    address: Vec<usize>,
    level: usize,
}

/// A tile laid down by a path walk, with the heading it was walked at.
#[derive(Debug, Clone, Copy)]
struct PathTile {
    position: Position,
    facing: f64,
    node: usize,
}

/// Mutable rasterization state. Kept apart from the path tree so phases can
/// read the tree while writing here.
#[derive(Debug, Default)]
struct CaveCanvas {
    nodes: Vec<PathNode>,
    cave_floor: HashSet<Position>,
    path_tiles: Vec<PathTile>,
    feature_tiles: BTreeMap<Position, FeatureKind>,
    inflection_tiles: BTreeSet<Position>,
    bottleneck_regions: Vec<BottleneckRegion>,
    chamber_centers: Vec<(Position, usize)>,
    zero_choke_tiles: BTreeSet<Position>,
    level_stats: Vec<LevelStats>,
    fills: CircleFillCache,
}

impl CaveCanvas {
    fn in_bottleneck_region(&self, pos: Position) -> bool {
        self.bottleneck_regions
            .iter()
            .any(|region| region.bounds.contains(pos))
    }

    fn add_floor(&mut self, pos: Position, level: usize) -> bool {
        let added = self.cave_floor.insert(pos);
        if added {
            if let Some(stats) = self.level_stats.get_mut(level) {
                stats.floor_tiles_added += 1;
            }
        }
        added
    }

    /// Parameters of every registered node, indexed like `nodes`.
    fn node_parameters<'a>(&self, root: &'a Path) -> DelveResult<Vec<&'a PathParameters>> {
        self.nodes
            .iter()
            .map(|node| {
                root.descendant(&node.address)
                    .map(Path::parameters)
                    .ok_or_else(|| {
                        DelveError::GenerationFailed(format!(
                            "path address {:?} is not in the tree",
                            node.address
                        ))
                    })
            })
            .collect()
    }

    /// Rasterizes every level of the tree, shallowest first.
    fn extract<R: Rng + ?Sized>(&mut self, root: &Path, rng: &mut R) {
        let mut addresses = vec![Vec::new()];
        let mut level = 0;
        while !addresses.is_empty() {
            addresses = self.extract_level(root, level, &addresses, rng);
            level += 1;
        }
    }

    /// Rasterizes one level and returns the addresses of the next level's paths.
    fn extract_level<R: Rng + ?Sized>(
        &mut self,
        root: &Path,
        level: usize,
        addresses: &[Vec<usize>],
        rng: &mut R,
    ) -> Vec<Vec<usize>> {
        self.level_stats.push(LevelStats {
            level,
            ..LevelStats::default()
        });

        let mut live = Vec::with_capacity(addresses.len());
        for address in addresses {
            if let Some(path) = root.descendant(address) {
                let node = self.nodes.len();
                self.nodes.push(PathNode {
                    address: address.clone(),
                    level,
                });
                live.push((node, address, path));
            }
        }
        self.level_stats[level].paths = live.len();

        // Walk tiles
        for &(node, _, path) in &live {
            for (point, &facing) in path.main().iter().zip(path.facings()) {
                let position = point.to_grid();
                if self.add_floor(position, level) {
                    self.path_tiles.push(PathTile {
                        position,
                        facing,
                        node,
                    });
                }
            }
        }

        // Inflections and bottlenecks, so every region of this level exists
        // before any fork is accepted
        for &(_, _, path) in &live {
            for inflection in path.inflection_points() {
                let tile = inflection.point.to_grid();
                if self.cave_floor.contains(&tile) {
                    self.inflection_tiles.insert(tile);
                } else {
                    trace!("dropping inflection off the floor at {:?}", tile);
                }
            }

            for bottleneck in path.bottleneck_points() {
                let tile = bottleneck.point.to_grid();
                if !self.cave_floor.contains(&tile) {
                    trace!("dropping bottleneck off the floor at {:?}", tile);
                    continue;
                }
                let half_extent = path.parameters().bottleneck.value(rng);
                self.bottleneck_regions.push(BottleneckRegion {
                    center: tile,
                    bounds: Bounds::centered(tile, half_extent),
                    level,
                });
                self.feature_tiles
                    .entry(tile)
                    .or_insert(FeatureKind::Bottleneck);
                self.level_stats[level].bottlenecks += 1;
            }
        }

        let mut next_level = Vec::new();
        for &(node, address, path) in &live {
            for (fork_index, fork) in path.fork_points().iter().enumerate() {
                let tile = fork.point.to_grid();
                if self.in_bottleneck_region(tile) {
                    trace!("fork at {:?} blocked by a bottleneck region", tile);
                    self.level_stats[level].blocked_forks += 1;
                    continue;
                }
                if self.cave_floor.contains(&tile) {
                    self.feature_tiles.entry(tile).or_insert(FeatureKind::Fork);
                    self.level_stats[level].forks += 1;
                }
                if fork_index < path.forks().len() {
                    let mut child = address.clone();
                    child.push(fork_index);
                    next_level.push(child);
                }
            }

            for chamber in path.chamber_points() {
                let tile = chamber.to_grid();
                if self.cave_floor.contains(&tile) {
                    self.chamber_centers.push((tile, node));
                    self.level_stats[level].chambers += 1;
                } else {
                    trace!("dropping chamber off the floor at {:?}", tile);
                }
            }
        }

        debug!(
            "level {}: {} paths, {} tiles, {} bottlenecks, {} forks ({} blocked)",
            level,
            live.len(),
            self.level_stats[level].floor_tiles_added,
            self.level_stats[level].bottlenecks,
            self.level_stats[level].forks,
            self.level_stats[level].blocked_forks
        );

        next_level
    }

    fn carve_chambers<R: Rng + ?Sized>(&mut self, root: &Path, rng: &mut R) -> DelveResult<()> {
        let parameters = self.node_parameters(root)?;
        let centers = self.chamber_centers.clone();
        for (center, node) in centers {
            let radius = parameters[node].chamber.value(rng);
            let level = self.nodes[node].level;
            let offsets = self.fills.offsets(radius)?.to_vec();
            for offset in offsets {
                self.add_floor(center + offset, level);
            }
            self.feature_tiles
                .entry(center)
                .or_insert(FeatureKind::Chamber);
        }
        Ok(())
    }

    fn widen_paths<R: Rng + ?Sized>(&mut self, root: &Path, rng: &mut R) -> DelveResult<()> {
        let parameters = self.node_parameters(root)?;
        let tiles = self.path_tiles.clone();
        for tile in tiles {
            let choke = parameters[tile.node].choke.value(rng);
            if choke == 0 {
                self.zero_choke_tiles.insert(tile.position);
                continue;
            }

            let level = self.nodes[tile.node].level;
            let reach = choke as i32;
            let offsets: Vec<Position> = match WidenPattern::for_facing(tile.facing) {
                WidenPattern::Horizontal => (1..=reach)
                    .flat_map(|d| [Position::new(0, d), Position::new(0, -d)])
                    .collect(),
                WidenPattern::Vertical => (1..=reach)
                    .flat_map(|d| [Position::new(d, 0), Position::new(-d, 0)])
                    .collect(),
                WidenPattern::Diagonal => self.fills.offsets(choke)?.to_vec(),
            };
            for offset in offsets {
                self.add_floor(tile.position + offset, level);
            }
        }
        Ok(())
    }
}

/// Orchestrates cave generation from parameter pools to a [`CaveResult`].
///
/// Phases must run in order; [`CaveManager::run`] drives all of them.
///
/// # Examples
///
/// ```
/// use delve::{CaveManager, CavePhase, ParameterPools, Position};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(21);
/// let mut manager = CaveManager::new(Position::new(5, 5), ParameterPools::default());
/// manager.run(&mut rng).unwrap();
/// assert_eq!(manager.phase(), CavePhase::Ready);
///
/// let cave = manager.into_result().unwrap();
/// assert!(cave.is_floor(Position::new(5, 5)));
/// ```
#[derive(Debug)]
pub struct CaveManager {
    phase: CavePhase,
    root_position: Position,
    pools: ParameterPools,
    seed: Option<u64>,
    levels: Vec<PathParameters>,
    pool_levels: Vec<PoolLevel>,
    root: Option<Path>,
    canvas: CaveCanvas,
}

impl CaveManager {
    /// Creates an unconfigured manager for a cave rooted at `root_position`.
    pub fn new(root_position: Position, pools: ParameterPools) -> Self {
        Self {
            phase: CavePhase::Unconfigured,
            root_position,
            pools,
            seed: None,
            levels: Vec::new(),
            pool_levels: Vec::new(),
            root: None,
            canvas: CaveCanvas::default(),
        }
    }

    /// Records the seed of the generator that will drive the phases.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn phase(&self) -> CavePhase {
        self.phase
    }

    /// Parameters chosen for each level, once chosen.
    pub fn level_parameters(&self) -> &[PathParameters] {
        &self.levels
    }

    /// The grown path tree, once built.
    pub fn path_tree(&self) -> Option<&Path> {
        self.root.as_ref()
    }

    fn expect_phase(&self, expected: CavePhase) -> DelveResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(DelveError::PhaseOrder {
                expected,
                found: self.phase,
            })
        }
    }

    /// Picks parameters for the essential level and, behind their probability
    /// gates, the major and minor levels.
    pub fn choose_parameters<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DelveResult<()> {
        self.expect_phase(CavePhase::Unconfigured)?;
        self.pools.validate()?;

        let mut essential = pick_candidate(&self.pools, PoolLevel::Essential, rng)?;
        essential.origin = Vector2::from(self.root_position);
        self.levels.push(essential);
        self.pool_levels.push(PoolLevel::Essential);

        for (level, chance) in [
            (PoolLevel::Major, self.pools.major_level_chance),
            (PoolLevel::Minor, self.pools.minor_level_chance),
        ] {
            if rng.gen_bool(chance) {
                self.levels.push(pick_candidate(&self.pools, level, rng)?);
                self.pool_levels.push(level);
            }
        }

        debug!("chose parameter levels {:?}", self.pool_levels);
        self.phase = CavePhase::ParametersChosen;
        Ok(())
    }

    /// Grows the path tree from the chosen levels.
    pub fn build_path_tree<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DelveResult<()> {
        self.expect_phase(CavePhase::ParametersChosen)?;
        let root = Path::new(&self.levels, rng)?;
        debug!(
            "grew {} paths over {} levels",
            root.path_count(),
            root.depth()
        );
        self.root = Some(root);
        self.phase = CavePhase::PathTreeBuilt;
        Ok(())
    }

    /// Lays down walk tiles and records feature tiles and bottleneck regions.
    pub fn extract_floor_and_features<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> DelveResult<()> {
        self.expect_phase(CavePhase::PathTreeBuilt)?;
        let root = self.root.as_ref().ok_or_else(missing_tree)?;
        self.canvas.extract(root, rng);
        self.phase = CavePhase::FloorAndFeaturesExtracted;
        Ok(())
    }

    /// Carves a circular room around every chamber tile.
    pub fn carve_chambers<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DelveResult<()> {
        self.expect_phase(CavePhase::FloorAndFeaturesExtracted)?;
        let root = self.root.as_ref().ok_or_else(missing_tree)?;
        self.canvas.carve_chambers(root, rng)?;
        debug!("carved {} chambers", self.canvas.chamber_centers.len());
        self.phase = CavePhase::ChambersCarved;
        Ok(())
    }

    /// Widens every walked tile by its path's choke.
    pub fn widen_paths<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DelveResult<()> {
        self.expect_phase(CavePhase::ChambersCarved)?;
        let root = self.root.as_ref().ok_or_else(missing_tree)?;
        self.canvas.widen_paths(root, rng)?;
        debug!(
            "widened {} path tiles, {} left single file",
            self.canvas.path_tiles.len(),
            self.canvas.zero_choke_tiles.len()
        );
        self.phase = CavePhase::Widened;
        Ok(())
    }

    /// Marks the cave ready for queries.
    pub fn finish(&mut self) -> DelveResult<()> {
        self.expect_phase(CavePhase::Widened)?;
        self.phase = CavePhase::Ready;
        Ok(())
    }

    /// Runs every remaining phase in order.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DelveResult<()> {
        self.choose_parameters(rng)?;
        self.build_path_tree(rng)?;
        self.extract_floor_and_features(rng)?;
        self.carve_chambers(rng)?;
        self.widen_paths(rng)?;
        self.finish()?;
        info!(
            "cave ready: {} floor tiles, {} features, {} levels",
            self.canvas.cave_floor.len(),
            self.canvas.feature_tiles.len(),
            self.levels.len()
        );
        Ok(())
    }

    /// Hands out the finished cave.
    pub fn into_result(self) -> DelveResult<CaveResult> {
        self.expect_phase(CavePhase::Ready)?;
        let canvas = self.canvas;
        Ok(CaveResult {
            seed: self.seed,
            root_position: self.root_position,
            pool_levels: self.pool_levels,
            floor_tiles: canvas.cave_floor.into_iter().collect(),
            features: canvas.feature_tiles,
            inflection_tiles: canvas.inflection_tiles,
            zero_choke_tiles: canvas.zero_choke_tiles,
            bottleneck_regions: canvas.bottleneck_regions,
            level_stats: canvas.level_stats,
        })
    }
}

fn missing_tree() -> DelveError {
    DelveError::GenerationFailed("path tree missing".to_string())
}

fn pick_candidate<R: Rng + ?Sized>(
    pools: &ParameterPools,
    level: PoolLevel,
    rng: &mut R,
) -> DelveResult<PathParameters> {
    pools
        .candidates(level)
        .choose(rng)
        .cloned()
        .ok_or(DelveError::EmptyPool(level))
}

/// Generates a complete cave in one call.
///
/// # Examples
///
/// ```
/// use delve::{generate_cave, ParameterPools, Position};
///
/// let first = generate_cave(Position::origin(), &ParameterPools::default(), 9).unwrap();
/// let second = generate_cave(Position::origin(), &ParameterPools::default(), 9).unwrap();
/// assert_eq!(first, second);
/// ```
pub fn generate_cave(
    root_position: Position,
    pools: &ParameterPools,
    seed: u64,
) -> DelveResult<CaveResult> {
    info!("generating cave at {:?} with seed {}", root_position, seed);
    let mut rng = crate::generation::utils::seeded_rng(seed);
    let mut manager = CaveManager::new(root_position, pools.clone()).with_seed(seed);
    manager.run(&mut rng)?;
    manager.into_result()
}
