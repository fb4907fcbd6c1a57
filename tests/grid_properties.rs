//! Property tests for grid geometry.

use delve::{circle_fill, Position, RevealMap};
use proptest::prelude::*;
use std::collections::HashSet;

/// Slow reference fill: relax every state until nothing improves.
fn reference_fill(radius: i32) -> HashSet<Position> {
    let side = (2 * radius + 1) as usize;
    let index = |p: Position| ((p.y + radius) as usize * side + (p.x + radius) as usize) * 2;
    let mut cost = vec![u32::MAX; side * side * 2];
    cost[index(Position::origin())] = 0;

    let mut changed = true;
    while changed {
        changed = false;
        for y in -radius..=radius {
            for x in -radius..=radius {
                let here = Position::new(x, y);
                for discount in 0..2 {
                    let current = cost[index(here) + discount];
                    if current == u32::MAX {
                        continue;
                    }
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            if dx == 0 && dy == 0 {
                                continue;
                            }
                            let next = Position::new(x + dx, y + dy);
                            if next.x.abs() > radius || next.y.abs() > radius {
                                continue;
                            }
                            let (step, next_discount) = if dx != 0 && dy != 0 {
                                if discount == 1 {
                                    (2, 0)
                                } else {
                                    (1, 1)
                                }
                            } else {
                                (1, 0)
                            };
                            let slot = index(next) + next_discount;
                            if current + step < cost[slot] {
                                cost[slot] = current + step;
                                changed = true;
                            }
                        }
                    }
                }
            }
        }
    }

    let mut cells = HashSet::new();
    for y in -radius..=radius {
        for x in -radius..=radius {
            let pos = Position::new(x, y);
            let best = cost[index(pos)].min(cost[index(pos) + 1]);
            if best <= radius as u32 {
                cells.insert(pos);
            }
        }
    }
    cells
}

#[test]
fn test_known_fill_sizes() {
    assert_eq!(circle_fill(0).unwrap().len(), 1);
    assert_eq!(circle_fill(1).unwrap().len(), 9);
    assert_eq!(circle_fill(2).unwrap().len(), 21);
    assert!(circle_fill(3).unwrap().contains(&Position::new(2, 2)));
    assert!(!circle_fill(3).unwrap().contains(&Position::new(3, 3)));
    assert!(circle_fill(4).unwrap().contains(&Position::new(3, 3)));
}

proptest! {
    #[test]
    fn fill_matches_reference(radius in 0i32..8) {
        let fill: HashSet<Position> = circle_fill(radius).unwrap().into_iter().collect();
        prop_assert_eq!(fill, reference_fill(radius));
    }

    #[test]
    fn fill_is_symmetric(radius in 0i32..12) {
        let fill: HashSet<Position> = circle_fill(radius).unwrap().into_iter().collect();
        for &pos in &fill {
            prop_assert!(fill.contains(&pos.rotate_quarter()));
            prop_assert!(fill.contains(&Position::new(-pos.x, pos.y)));
            prop_assert!(fill.contains(&Position::new(pos.y, pos.x)));
        }
    }

    #[test]
    fn fill_grows_with_radius(radius in 0i32..12) {
        let smaller: HashSet<Position> = circle_fill(radius).unwrap().into_iter().collect();
        let larger: HashSet<Position> = circle_fill(radius + 1).unwrap().into_iter().collect();
        prop_assert!(smaller.is_subset(&larger));
        prop_assert!(larger.contains(&Position::new(radius + 1, 0)));
        prop_assert!(!larger.contains(&Position::new(radius + 2, 0)));
    }

    #[test]
    fn fill_is_sorted_without_duplicates(radius in 0i32..12) {
        let fill = circle_fill(radius).unwrap();
        prop_assert!(fill.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn reveal_never_repeats(steps in prop::collection::vec((-2i32..=2, -2i32..=2), 1..20)) {
        let light = RevealMap::light_offsets(2).unwrap();
        let mut map = RevealMap::new();
        let mut seen = HashSet::new();
        let mut location = Position::origin();
        for (dx, dy) in steps {
            location = location.offset(dx, dy);
            for pos in map.reveal(location, &light) {
                prop_assert!(seen.insert(pos));
            }
        }
        prop_assert_eq!(seen.len(), map.revealed_count());
    }
}
