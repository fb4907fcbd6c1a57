//! # ASCII Rendering
//!
//! Plain-text maps of a [`CaveResult`] for the terminal and for debugging.

use crate::generation::{CaveResult, FeatureKind};
use crate::utils::Position;

/// Glyph for solid rock
pub const ROCK_GLYPH: char = '#';
/// Glyph for ordinary floor
pub const FLOOR_GLYPH: char = '.';
/// Glyph for floor in a single-file corridor
pub const NARROW_GLYPH: char = ':';
/// Glyph for the tile the cave is rooted on
pub const ROOT_GLYPH: char = '@';

/// Glyph for a feature tile.
pub fn feature_glyph(kind: FeatureKind) -> char {
    match kind {
        FeatureKind::Bottleneck => 'B',
        FeatureKind::Fork => 'F',
        FeatureKind::Chamber => 'C',
    }
}

/// Renders the cave inside its bounds padded by one rock tile.
///
/// Rows run top to bottom by increasing y. The root tile wins over features,
/// and features win over floor.
///
/// # Examples
///
/// ```
/// use delve::{generate_cave, render_ascii, ParameterPools, PathParameters, Position};
///
/// let pools = ParameterPools::single_level(PathParameters::straight(3.0));
/// let cave = generate_cave(Position::origin(), &pools, 1).unwrap();
/// assert_eq!(render_ascii(&cave), "#####\n#@::#\n#####\n");
/// ```
pub fn render_ascii(cave: &CaveResult) -> String {
    let bounds = match cave.bounds() {
        Some(bounds) => bounds.padded(1),
        None => return String::new(),
    };

    let width = bounds.width() as usize;
    let mut out = String::with_capacity((width + 1) * bounds.height() as usize);
    for y in bounds.min.y..=bounds.max.y {
        for x in bounds.min.x..=bounds.max.x {
            out.push(tile_glyph(cave, Position::new(x, y)));
        }
        out.push('\n');
    }
    out
}

fn tile_glyph(cave: &CaveResult, pos: Position) -> char {
    if !cave.is_floor(pos) {
        ROCK_GLYPH
    } else if pos == cave.root_position {
        ROOT_GLYPH
    } else if let Some(kind) = cave.feature_at(pos) {
        feature_glyph(kind)
    } else if cave.zero_choke_tiles.contains(&pos) {
        NARROW_GLYPH
    } else {
        FLOOR_GLYPH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{generate_cave, ParameterPools, PathParameters, RandomKnob};

    #[test]
    fn test_widened_corridor_render() {
        let params = PathParameters {
            choke: RandomKnob::fixed(1),
            ..PathParameters::straight(3.0)
        };
        let cave =
            generate_cave(Position::origin(), &ParameterPools::single_level(params), 2).unwrap();
        let expected = "#####\n#...#\n#@..#\n#...#\n#####\n";
        assert_eq!(render_ascii(&cave), expected);
    }

    #[test]
    fn test_render_counts_floor() {
        let cave = generate_cave(Position::origin(), &ParameterPools::default(), 3).unwrap();
        let rendered = render_ascii(&cave);
        let open = rendered.chars().filter(|&c| c != ROCK_GLYPH && c != '\n').count();
        assert_eq!(open, cave.floor_tiles.len());
        assert_eq!(rendered.matches(ROOT_GLYPH).count(), 1);
    }

    #[test]
    fn test_feature_glyphs() {
        assert_eq!(feature_glyph(FeatureKind::Bottleneck), 'B');
        assert_eq!(feature_glyph(FeatureKind::Fork), 'F');
        assert_eq!(feature_glyph(FeatureKind::Chamber), 'C');
    }
}
