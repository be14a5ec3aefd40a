//! Simulation grid
//!
//! Holds the full simulation frame: the interior domain requested by the
//! scene, wrapped in the graded PML rings (when enabled) and a final ring of
//! dead cells that anchors the border.
//!
//! Memory layout: flat 1D arrays in row-major order for cache-friendly
//! access, `idx = row * width + col`, row 0 at the top. Field staggering:
//! - `p`  pressure at the cell center
//! - `vx` velocity on the right face of the cell
//! - `vy` velocity on the top face of the cell
//!
//! The three field planes are double-buffered and flipped by index each step;
//! the kind plane is read-only once geometry is final. The depth planes
//! parameterize the 2.5D out-of-plane height correction and stay at 1.0 in
//! pure 2D mode.

use crate::cells::CellKind;

/// All field planes, split for one engine step: previous (read) and next
/// (write) buffers plus the static depth planes.
pub struct StepPlanes<'a> {
    pub p_prev: &'a [f32],
    pub p_next: &'a mut [f32],
    pub vx_prev: &'a [f32],
    pub vx_next: &'a mut [f32],
    pub vy_prev: &'a [f32],
    pub vy_next: &'a mut [f32],
    pub depth_x: &'a [f32],
    pub depth_y: &'a [f32],
    pub depth_p: &'a [f32],
}

pub struct CellGrid {
    width: usize,
    height: usize,
    /// Offset of the interior domain inside the frame (dead ring + PML rings).
    margin: usize,
    domain_w: usize,
    domain_h: usize,

    p: [Vec<f32>; 2],
    vx: [Vec<f32>; 2],
    vy: [Vec<f32>; 2],
    /// Index of the currently published buffer; its twin is written next step.
    cur: usize,

    kinds: Vec<CellKind>,

    depth_x: Vec<f32>,
    depth_y: Vec<f32>,
    depth_p: Vec<f32>,
}

impl CellGrid {
    /// Create a frame around a `domain_h x domain_w` interior of air cells.
    ///
    /// The outermost ring is always dead. With `pml_on`, the next
    /// `pml_layers` rings grade from `Pml(pml_layers-1)` at the outside down
    /// to `Pml(0)` against the interior. Geometry stamped later overwrites
    /// PML cells where it overlaps.
    pub fn new(domain_h: usize, domain_w: usize, pml_on: bool, pml_layers: usize) -> CellGrid {
        let layers = if pml_on { pml_layers } else { 0 };
        let margin = 1 + layers;
        let width = domain_w + 2 * margin;
        let height = domain_h + 2 * margin;
        let size = width * height;

        let mut kinds = vec![CellKind::Air; size];

        // Dead border ring, then the graded PML rings from outside in.
        for ring in 0..margin {
            let kind = if ring == 0 {
                CellKind::Dead
            } else {
                CellKind::Pml((layers - ring) as u8)
            };
            for c in ring..width - ring {
                kinds[ring * width + c] = kind;
                kinds[(height - 1 - ring) * width + c] = kind;
            }
            for r in ring..height - ring {
                kinds[r * width + ring] = kind;
                kinds[r * width + (width - 1 - ring)] = kind;
            }
        }

        CellGrid {
            width,
            height,
            margin,
            domain_w,
            domain_h,
            p: [vec![0.0; size], vec![0.0; size]],
            vx: [vec![0.0; size], vec![0.0; size]],
            vy: [vec![0.0; size], vec![0.0; size]],
            cur: 0,
            kinds,
            depth_x: vec![1.0; size],
            depth_y: vec![1.0; size],
            depth_p: vec![1.0; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Frame offset of the interior domain origin.
    pub fn margin(&self) -> usize {
        self.margin
    }

    pub fn domain_size(&self) -> (usize, usize) {
        (self.domain_h, self.domain_w)
    }

    pub fn idx(&self, r: usize, c: usize) -> usize {
        r * self.width + c
    }

    /// Frame coordinates of an interior-domain cell.
    pub fn interior(&self, r: usize, c: usize) -> (usize, usize) {
        (r + self.margin, c + self.margin)
    }

    pub fn kind(&self, r: usize, c: usize) -> CellKind {
        self.kinds[r * self.width + c]
    }

    pub fn kinds(&self) -> &[CellKind] {
        &self.kinds
    }

    /// Stamp a cell kind at frame coordinates. Only valid while building
    /// geometry; the engine never mutates kinds.
    pub fn set_kind(&mut self, r: usize, c: usize, kind: CellKind) {
        self.kinds[r * self.width + c] = kind;
    }

    /// Published pressure plane (after the latest completed step).
    pub fn pressure(&self) -> &[f32] {
        &self.p[self.cur]
    }

    pub fn velocity_x(&self) -> &[f32] {
        &self.vx[self.cur]
    }

    pub fn velocity_y(&self) -> &[f32] {
        &self.vy[self.cur]
    }

    pub fn depth_x(&self) -> &[f32] {
        &self.depth_x
    }

    pub fn depth_y(&self) -> &[f32] {
        &self.depth_y
    }

    pub fn depth_p(&self) -> &[f32] {
        &self.depth_p
    }

    /// Set all three depth planes at one cell (2.5D height correction).
    pub fn set_depth(&mut self, r: usize, c: usize, depth: f32) {
        let i = r * self.width + c;
        self.depth_x[i] = depth;
        self.depth_y[i] = depth;
        self.depth_p[i] = depth;
    }

    /// Borrow every plane needed for one step: previous buffers shared, next
    /// buffers mutable, depth planes shared.
    pub fn step_planes(&mut self) -> StepPlanes<'_> {
        let cur = self.cur;
        let (p_prev, p_next) = split_pair(&mut self.p, cur);
        let (vx_prev, vx_next) = split_pair(&mut self.vx, cur);
        let (vy_prev, vy_next) = split_pair(&mut self.vy, cur);
        StepPlanes {
            p_prev,
            p_next,
            vx_prev,
            vx_next,
            vy_prev,
            vy_next,
            depth_x: &self.depth_x,
            depth_y: &self.depth_y,
            depth_p: &self.depth_p,
        }
    }

    /// Publish the buffers written by the last step (index flip, no copy).
    pub fn flip(&mut self) {
        self.cur ^= 1;
    }

    /// Zero the field planes, keeping geometry and coefficients.
    pub fn reset_fields(&mut self) {
        for plane in self.p.iter_mut().chain(self.vx.iter_mut()).chain(self.vy.iter_mut()) {
            plane.fill(0.0);
        }
    }
}

fn split_pair(planes: &mut [Vec<f32>; 2], cur: usize) -> (&[f32], &mut [f32]) {
    let (a, b) = planes.split_at_mut(1);
    if cur == 0 {
        (a[0].as_slice(), &mut b[0])
    } else {
        (b[0].as_slice(), &mut a[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_dimensions() {
        let grid = CellGrid::new(50, 80, true, 6);
        assert_eq!(grid.width(), 80 + 2 * 7);
        assert_eq!(grid.height(), 50 + 2 * 7);
        assert_eq!(grid.margin(), 7);

        let grid = CellGrid::new(50, 80, false, 6);
        assert_eq!(grid.width(), 82);
        assert_eq!(grid.margin(), 1);
    }

    #[test]
    fn test_ring_layout() {
        let grid = CellGrid::new(20, 20, true, 6);
        let (h, w) = (grid.height(), grid.width());

        // Outermost ring is dead on all four sides.
        assert_eq!(grid.kind(0, 10), CellKind::Dead);
        assert_eq!(grid.kind(h - 1, 10), CellKind::Dead);
        assert_eq!(grid.kind(10, 0), CellKind::Dead);
        assert_eq!(grid.kind(10, w - 1), CellKind::Dead);

        // PML grades from strongest against the dead ring to weakest against
        // the interior.
        assert_eq!(grid.kind(1, 10), CellKind::Pml(5));
        assert_eq!(grid.kind(6, 10), CellKind::Pml(0));
        assert_eq!(grid.kind(7, 10), CellKind::Air);
        assert_eq!(grid.kind(10, w - 2), CellKind::Pml(5));
    }

    #[test]
    fn test_interior_mapping() {
        let grid = CellGrid::new(10, 10, true, 3);
        let (r, c) = grid.interior(0, 0);
        assert_eq!(grid.kind(r, c), CellKind::Air);
        assert_eq!((r, c), (4, 4));
    }

    #[test]
    fn test_plane_flip() {
        let mut grid = CellGrid::new(8, 8, false, 0);
        {
            let planes = grid.step_planes();
            planes.p_next[30] = 2.5;
        }
        // Not yet published.
        assert_eq!(grid.pressure()[30], 0.0);
        grid.flip();
        assert_eq!(grid.pressure()[30], 2.5);
    }
}
