//! Placement of new content: grid layout of a batch and a search for a free
//! spot that does not overlap existing nodes.

use crate::geometry::rects_overlap;
use kurbo::{Point, Rect, Size, Vec2};

/// Search parameters for [`find_free_origin`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    /// Margin added around every existing node.
    pub padding: f64,
    pub max_iterations: usize,
    pub min_step: f64,
    pub max_step: f64,
}

/// Find a top-left origin for a `footprint` centered on `center` whose box
/// does not overlap any padded obstacle.
///
/// The centered origin is tried first, then eight compass offsets at growing
/// radii. Falls back to the centered origin when every probe is occupied.
pub fn find_free_origin(center: Point, footprint: Size, obstacles: &[Rect], params: PlacementParams) -> Point {
    let start = Point::new(center.x - footprint.width / 2.0, center.y - footprint.height / 2.0);
    let padded: Vec<Rect> = obstacles.iter().map(|r| r.inflate(params.padding, params.padding)).collect();
    let is_free = |origin: Point| {
        let candidate = Rect::from_origin_size(origin, footprint);
        !padded.iter().any(|&obstacle| rects_overlap(candidate, obstacle))
    };

    if is_free(start) {
        return start;
    }

    let step = (footprint.width.max(footprint.height) / 2.0).clamp(params.min_step, params.max_step);
    for i in 1..=params.max_iterations {
        let d = step * i as f64;
        let probes = [
            Vec2::new(d, 0.0),
            Vec2::new(-d, 0.0),
            Vec2::new(0.0, d),
            Vec2::new(0.0, -d),
            Vec2::new(d, d),
            Vec2::new(-d, d),
            Vec2::new(d, -d),
            Vec2::new(-d, -d),
        ];
        if let Some(origin) = probes.iter().map(|&offset| start + offset).find(|&origin| is_free(origin)) {
            return origin;
        }
    }

    log::debug!("No free placement found around ({}, {}), overlapping", center.x, center.y);
    start
}

/// Grid arrangement of a batch of items.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    pub column_widths: Vec<f64>,
    pub row_heights: Vec<f64>,
    pub spacing: f64,
}

impl GridLayout {
    /// Lay out items into `ceil(sqrt(n))` columns. Each column is as wide as
    /// its widest item and each row as tall as its tallest.
    pub fn new(sizes: &[Size], spacing: f64) -> Self {
        let count = sizes.len();
        let columns = (count as f64).sqrt().ceil() as usize;
        let rows = if columns == 0 { 0 } else { count.div_ceil(columns) };

        let mut column_widths = vec![0.0_f64; columns];
        let mut row_heights = vec![0.0_f64; rows];
        for (i, size) in sizes.iter().enumerate() {
            let (row, col) = (i / columns, i % columns);
            column_widths[col] = column_widths[col].max(size.width);
            row_heights[row] = row_heights[row].max(size.height);
        }

        Self {
            columns,
            rows,
            column_widths,
            row_heights,
            spacing,
        }
    }

    /// Total footprint including inter-item spacing.
    pub fn footprint(&self) -> Size {
        let gaps = |n: usize| self.spacing * n.saturating_sub(1) as f64;
        Size::new(
            self.column_widths.iter().sum::<f64>() + gaps(self.columns),
            self.row_heights.iter().sum::<f64>() + gaps(self.rows),
        )
    }

    /// Top-left of each item, centered within its cell, for a grid at `origin`.
    pub fn positions(&self, origin: Point, sizes: &[Size]) -> Vec<Point> {
        let mut positions = Vec::with_capacity(sizes.len());
        let mut y = origin.y;
        for row in 0..self.rows {
            let mut x = origin.x;
            for col in 0..self.columns {
                if let Some(size) = sizes.get(row * self.columns + col) {
                    positions.push(Point::new(
                        x + (self.column_widths[col] - size.width) / 2.0,
                        y + (self.row_heights[row] - size.height) / 2.0,
                    ));
                }
                x += self.column_widths[col] + self.spacing;
            }
            y += self.row_heights[row] + self.spacing;
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: PlacementParams = PlacementParams {
        padding: 16.0,
        max_iterations: 30,
        min_step: 32.0,
        max_step: 120.0,
    };

    #[test]
    fn test_free_center_used() {
        let origin = find_free_origin(Point::new(0.0, 0.0), Size::new(100.0, 50.0), &[], PARAMS);
        assert_eq!(origin, Point::new(-50.0, -25.0));
    }

    #[test]
    fn test_occupied_center_moves_right_first() {
        let obstacle = Rect::new(-40.0, -40.0, 40.0, 40.0);
        let origin = find_free_origin(Point::new(0.0, 0.0), Size::new(64.0, 64.0), &[obstacle], PARAMS);
        // step = 32: +32 and +64 still overlap the padded obstacle (x1 = 56), +96 clears it
        assert_eq!(origin, Point::new(64.0, -32.0));
        let placed = Rect::from_origin_size(origin, Size::new(64.0, 64.0));
        assert!(!rects_overlap(placed, obstacle.inflate(16.0, 16.0)));
    }

    #[test]
    fn test_padding_touching_is_free() {
        // Footprint exactly touches the padded obstacle
        let obstacle = Rect::new(116.0, 0.0, 200.0, 100.0);
        let origin = find_free_origin(Point::new(50.0, 50.0), Size::new(100.0, 100.0), &[obstacle], PARAMS);
        assert_eq!(origin, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_falls_back_to_center() {
        let wall = Rect::new(-1e6, -1e6, 1e6, 1e6);
        let params = PlacementParams {
            max_iterations: 3,
            ..PARAMS
        };
        let origin = find_free_origin(Point::new(10.0, 10.0), Size::new(20.0, 20.0), &[wall], params);
        assert_eq!(origin, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_grid_dimensions() {
        let sizes = vec![Size::new(100.0, 50.0); 5];
        let grid = GridLayout::new(&sizes, 16.0);
        assert_eq!(grid.columns, 3);
        assert_eq!(grid.rows, 2);
        let footprint = grid.footprint();
        assert!((footprint.width - 332.0).abs() < f64::EPSILON);
        assert!((footprint.height - 116.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grid_centers_items_in_cells() {
        let sizes = [
            Size::new(100.0, 100.0),
            Size::new(50.0, 20.0),
            Size::new(60.0, 40.0),
        ];
        let grid = GridLayout::new(&sizes, 10.0);
        assert_eq!(grid.column_widths, vec![100.0, 50.0]);
        assert_eq!(grid.row_heights, vec![100.0, 40.0]);

        let positions = grid.positions(Point::ZERO, &sizes);
        assert_eq!(positions[0], Point::new(0.0, 0.0));
        assert_eq!(positions[1], Point::new(110.0, 40.0));
        assert_eq!(positions[2], Point::new(20.0, 110.0));
    }

    #[test]
    fn test_empty_grid() {
        let grid = GridLayout::new(&[], 16.0);
        assert_eq!(grid.columns, 0);
        assert_eq!(grid.footprint(), Size::ZERO);
        assert!(grid.positions(Point::ZERO, &[]).is_empty());
    }
}
