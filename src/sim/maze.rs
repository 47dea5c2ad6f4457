//! Seeded maze layout

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::block::BlockKind;
use super::grid::Cell;
use crate::settings::MazeSettings;

/// Every cell of a `width` x `height` board centered on the origin, row by row
pub fn board_cells(width: i32, height: i32) -> Vec<Cell> {
    let (x0, y0) = (-(width / 2), -(height / 2));
    (y0..y0 + height)
        .flat_map(|y| (x0..x0 + width).map(move |x| Cell::new(x, y)))
        .collect()
}

/// Lay out blocks on a shuffled board: solids first, then the breakable
/// ones, a share of which are movable. Reserved cells stay empty.
pub fn generate_maze(settings: &MazeSettings, seed: u64, reserved: &[Cell]) -> Vec<(Cell, BlockKind)> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut free: Vec<Cell> = board_cells(settings.width, settings.height)
        .into_iter()
        .filter(|c| !reserved.contains(c))
        .collect();
    free.shuffle(&mut rng);

    let wanted = settings.solid_blocks + settings.destructible_blocks;
    if wanted > free.len() {
        log::warn!(
            "Maze wants {wanted} blocks but only {} cells are free; placing what fits",
            free.len()
        );
    }

    let mut layout = Vec::with_capacity(wanted.min(free.len()));
    for (i, cell) in free.into_iter().take(wanted).enumerate() {
        let kind = if i < settings.solid_blocks {
            BlockKind::Solid
        } else if rng.random::<f32>() < settings.movable_ratio {
            BlockKind::Movable
        } else {
            BlockKind::Destructible
        };
        layout.push((cell, kind));
    }
    log::debug!("Generated maze with {} blocks (seed {seed})", layout.len());
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_is_centered() {
        let cells = board_cells(11, 9);
        assert_eq!(cells.len(), 99);
        assert_eq!(cells[0], Cell::new(-5, -4));
        assert_eq!(cells[98], Cell::new(5, 4));
    }

    #[test]
    fn test_counts_and_reserved() {
        let settings = MazeSettings::default();
        let reserved = [Cell::new(0, 0), Cell::new(1, 0)];
        let layout = generate_maze(&settings, 3, &reserved);
        assert_eq!(layout.len(), 25);
        let solids = layout.iter().filter(|(_, k)| *k == BlockKind::Solid).count();
        assert_eq!(solids, 10);
        assert!(layout.iter().all(|(c, _)| !reserved.contains(c)));

        let mut cells: Vec<_> = layout.iter().map(|(c, _)| (c.x, c.y)).collect();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 25, "one block per cell");
    }

    #[test]
    fn test_seed_is_deterministic() {
        let settings = MazeSettings::default();
        assert_eq!(
            generate_maze(&settings, 11, &[]),
            generate_maze(&settings, 11, &[])
        );
    }

    #[test]
    fn test_overfull_board_truncates() {
        let settings = MazeSettings {
            width: 3,
            height: 3,
            solid_blocks: 5,
            destructible_blocks: 5,
            movable_ratio: 1.0,
        };
        let layout = generate_maze(&settings, 1, &[Cell::ZERO]);
        assert_eq!(layout.len(), 8);
        let movable = layout.iter().filter(|(_, k)| *k == BlockKind::Movable).count();
        assert_eq!(movable, 3);
    }
}
