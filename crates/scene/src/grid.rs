//! Static grid lattice.
//!
//! Columns run `i ∈ [-half_width, half_width]`, rows run
//! `j ∈ [first_row, depth_segments]`. Each node links back to the node one
//! row nearer (a depth segment) and to the node one column to the left (a
//! width segment), which yields a line list without duplicate edges.

use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

pub type GridPoint = Vec3;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub spacing: f64,
    pub half_width: i32,
    pub depth_segments: i32,
    /// Rows are this many spacings apart along Z.
    pub depth_stretch: f64,
    /// Nearest row; row 0 would sit on the camera plane.
    pub first_row: i32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            spacing: 120.0,
            half_width: 15,
            depth_segments: 16,
            depth_stretch: 1.5,
            first_row: 1,
        }
    }
}

impl GridSpec {
    pub fn columns(&self) -> usize {
        2 * self.half_width.max(0) as usize + 1
    }

    pub fn rows(&self) -> usize {
        (i64::from(self.depth_segments) - i64::from(self.first_row) + 1).max(0) as usize
    }

    pub fn node_count(&self) -> usize {
        self.columns() * self.rows()
    }

    pub fn line_vertex_count(&self) -> usize {
        let (cols, rows) = (self.columns(), self.rows());
        if cols == 0 || rows == 0 {
            return 0;
        }
        let depth_segments = cols * (rows - 1);
        let width_segments = (cols - 1) * rows;
        2 * (depth_segments + width_segments)
    }

    pub fn point(&self, i: i32, j: i32) -> GridPoint {
        GridPoint::new(
            i as f64 * self.spacing,
            0.0,
            j as f64 * self.depth_stretch * self.spacing,
        )
    }
}

/// Vertex data for the grid passes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridGeometry {
    /// One entry per node.
    pub nodes: Vec<GridPoint>,
    /// Line list: consecutive pairs are segment endpoints.
    pub lines: Vec<GridPoint>,
}

impl GridGeometry {
    pub fn build(spec: &GridSpec) -> Self {
        let mut nodes = Vec::with_capacity(spec.node_count());
        let mut lines = Vec::with_capacity(spec.line_vertex_count());

        for i in -spec.half_width..=spec.half_width {
            for j in spec.first_row..=spec.depth_segments {
                let p = spec.point(i, j);
                nodes.push(p);

                if j > spec.first_row {
                    lines.push(p);
                    lines.push(spec.point(i, j - 1));
                }
                if i > -spec.half_width {
                    lines.push(p);
                    lines.push(spec.point(i - 1, j));
                }
            }
        }

        Self { nodes, lines }
    }

    pub fn segment_count(&self) -> usize {
        self.lines.len() / 2
    }
}
