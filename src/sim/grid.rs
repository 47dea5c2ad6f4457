//! Grid geometry
//!
//! The arena is a square lattice centered on the origin. A cell's center sits
//! at `cell * size`, so snapping is rounding, not flooring.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Integer grid coordinate
pub type Cell = IVec2;

/// One of the four cardinal directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Blast scan order
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit cell offset (+y is up)
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::Y,
            Direction::Down => IVec2::NEG_Y,
            Direction::Left => IVec2::NEG_X,
            Direction::Right => IVec2::X,
        }
    }

    /// Unit world-space vector
    pub fn vector(self) -> Vec2 {
        self.offset().as_vec2()
    }

    /// Reduce a vector to its dominant cardinal direction.
    ///
    /// Horizontal only when |x| is strictly larger; ties (including the zero
    /// vector) resolve vertically.
    pub fn dominant(v: Vec2) -> Direction {
        if v.x.abs() > v.y.abs() {
            if v.x > 0.0 { Direction::Right } else { Direction::Left }
        } else if v.y > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// Maps continuous positions to grid cells
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// World units per cell
    pub size: f32,
}

impl Default for Grid {
    fn default() -> Self {
        Self { size: 1.0 }
    }
}

impl Grid {
    pub fn new(size: f32) -> Self {
        Self { size }
    }

    /// Cell whose center is nearest to `pos`
    pub fn cell_of(&self, pos: Vec2) -> Cell {
        (pos / self.size).round().as_ivec2()
    }

    /// World position of a cell center
    pub fn center_of(&self, cell: Cell) -> Vec2 {
        cell.as_vec2() * self.size
    }

    /// Snap a position to the nearest cell center
    #[cfg(test)]
    pub fn snap(&self, pos: Vec2) -> Vec2 {
        self.center_of(self.cell_of(pos))
    }

    /// Whether `pos` sits on a cell center (within `epsilon` world units)
    #[cfg(test)]
    pub fn is_aligned(&self, pos: Vec2, epsilon: f32) -> bool {
        pos.distance(self.snap(pos)) <= epsilon
    }

    /// Convert a length in cells to world units
    pub fn cells_to_world(&self, cells: f32) -> f32 {
        cells * self.size
    }
}
