//! Arena dimensions, desk grid and expansion policy
//!
//! The arena is a rectangle `[0, width] x [0, height]` walled on all four sides,
//! with desks on a regular grid. After the expansion wave it grows by one grid
//! step per wave, alternating between a new desk column and a new desk row.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::registry::{EntityClass, Registry};
use crate::tuning::LayoutTuning;

/// Which dimension an expansion grew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpansionAxis {
    /// New desk column, width grows
    Columns,
    /// New desk row, height grows
    Rows,
}

/// Result of one expansion step
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub axis: ExpansionAxis,
    /// Grid cells `(row, col)` of the newly added line
    pub cells: Vec<(u32, u32)>,
}

/// Arena geometry owned by the director
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub desk_rows: u32,
    pub desk_cols: u32,
    pub spacing: f32,
    pub grid_origin: Vec2,
    pub wall_thickness: f32,
    /// Recharge station positions; desks keep clear of these
    pub recharge_positions: Vec<Vec2>,
}

impl Arena {
    pub fn from_tuning(layout: &LayoutTuning) -> Self {
        Self {
            width: layout.width,
            height: layout.height,
            desk_rows: layout.desk_rows,
            desk_cols: layout.desk_cols,
            spacing: layout.desk_spacing,
            grid_origin: Vec2::new(layout.grid_origin.0, layout.grid_origin.1),
            wall_thickness: layout.wall_thickness,
            recharge_positions: layout
                .stations
                .iter()
                .map(|&(x, y)| Vec2::new(x, y))
                .collect(),
        }
    }

    /// World bounds
    pub fn bounds(&self) -> Aabb {
        Aabb::from_min_max(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    /// Center of desk grid cell `(row, col)`
    pub fn cell_center(&self, row: u32, col: u32) -> Vec2 {
        self.grid_origin + Vec2::new(col as f32 * self.spacing, row as f32 * self.spacing)
    }

    /// Every cell of the current grid, row-major, minus `skip`
    pub fn grid_cells(&self, skip: Option<(u32, u32)>) -> Vec<(u32, u32)> {
        (0..self.desk_rows)
            .flat_map(|row| (0..self.desk_cols).map(move |col| (row, col)))
            .filter(|&cell| Some(cell) != skip)
            .collect()
    }

    /// The four border walls (top, bottom, left, right) inside the bounds
    pub fn border_walls(&self) -> [Aabb; 4] {
        let (w, h, t) = (self.width, self.height, self.wall_thickness);
        [
            Aabb::new(Vec2::new(w / 2.0, t / 2.0), Vec2::new(w / 2.0, t / 2.0)),
            Aabb::new(Vec2::new(w / 2.0, h - t / 2.0), Vec2::new(w / 2.0, t / 2.0)),
            Aabb::new(Vec2::new(t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0)),
            Aabb::new(Vec2::new(w - t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0)),
        ]
    }

    /// Expansion axis for a wave (waves past the threshold alternate)
    pub fn axis_for_wave(wave: u32, after_wave: u32) -> ExpansionAxis {
        if wave.saturating_sub(after_wave) % 2 == 0 {
            ExpansionAxis::Columns
        } else {
            ExpansionAxis::Rows
        }
    }

    /// Grow by one grid line and report the cells of the new line
    pub fn expand(&mut self, axis: ExpansionAxis) -> Expansion {
        let cells = match axis {
            ExpansionAxis::Columns => {
                self.desk_cols += 1;
                self.width += self.spacing;
                let col = self.desk_cols - 1;
                (0..self.desk_rows).map(|row| (row, col)).collect()
            }
            ExpansionAxis::Rows => {
                self.desk_rows += 1;
                self.height += self.spacing;
                let row = self.desk_rows - 1;
                (0..self.desk_cols).map(|col| (row, col)).collect()
            }
        };
        Expansion { axis, cells }
    }
}

/// Obstacle occupancy queries the placement helper needs
pub trait Occupancy {
    fn is_occupied(&self, pos: Vec2) -> bool;
    fn bounds(&self) -> Aabb;
}

/// Live view of the arena: bounds from [`Arena`], solids from the registry
pub struct ArenaView<'a> {
    pub arena: &'a Arena,
    pub registry: &'a Registry,
}

impl Occupancy for ArenaView<'_> {
    fn is_occupied(&self, pos: Vec2) -> bool {
        self.registry
            .of_class(EntityClass::Obstacle)
            .chain(self.registry.of_class(EntityClass::EventDesk))
            .any(|e| e.bounds().contains(pos))
    }

    fn bounds(&self) -> Aabb {
        self.arena.bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::{EntityKind, Obstacle};

    #[test]
    fn test_grid_cells_skip_start_area() {
        let arena = Arena::from_tuning(&LayoutTuning::default());
        let cells = arena.grid_cells(Some((1, 1)));
        assert_eq!(cells.len(), 11);
        assert!(!cells.contains(&(1, 1)));
        assert_eq!(arena.cell_center(1, 1), Vec2::new(350.0, 320.0));
    }

    #[test]
    fn test_expansion_alternates() {
        assert_eq!(Arena::axis_for_wave(11, 10), ExpansionAxis::Rows);
        assert_eq!(Arena::axis_for_wave(12, 10), ExpansionAxis::Columns);
        assert_eq!(Arena::axis_for_wave(13, 10), ExpansionAxis::Rows);
    }

    #[test]
    fn test_expand_grows_dimensions() {
        let mut arena = Arena::from_tuning(&LayoutTuning::default());
        let cols = arena.expand(ExpansionAxis::Columns);
        assert_eq!(arena.width, 1000.0);
        assert_eq!(arena.desk_cols, 5);
        assert_eq!(cols.cells, vec![(0, 4), (1, 4), (2, 4)]);

        let rows = arena.expand(ExpansionAxis::Rows);
        assert_eq!(arena.height, 800.0);
        assert_eq!(rows.cells.len(), 5);
        assert!(rows.cells.iter().all(|&(r, _)| r == 3));
    }

    #[test]
    fn test_border_walls_hug_bounds() {
        let arena = Arena::from_tuning(&LayoutTuning::default());
        let [top, bottom, left, right] = arena.border_walls();
        assert_eq!(top.min().y, 0.0);
        assert_eq!(bottom.max().y, 600.0);
        assert_eq!(left.min().x, 0.0);
        assert_eq!(right.max().x, 800.0);
    }

    #[test]
    fn test_view_reports_obstacles() {
        let arena = Arena::from_tuning(&LayoutTuning::default());
        let mut reg = Registry::new();
        reg.spawn(
            EntityKind::Obstacle(Obstacle::default()),
            Vec2::new(150.0, 120.0),
            Vec2::new(48.0, 24.0),
        );
        let view = ArenaView { arena: &arena, registry: &reg };
        assert!(view.is_occupied(Vec2::new(160.0, 130.0)));
        assert!(!view.is_occupied(Vec2::new(400.0, 300.0)));
    }
}
