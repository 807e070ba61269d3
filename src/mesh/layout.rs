//! Sample layout and buffer addressing.
//!
//! All per-level data of an element lives in one flat `Vec<f32>` of samples.
//! [`Layout`] owns the arithmetic that turns `(level, corner, x, y)` into a
//! float offset inside that buffer; refinement, the normal pass and the
//! accessors all go through it.
//!
//! # Sample layout
//!
//! A sample is `width` floats. The first `layers` are interpolated by the
//! subdivision stencils; when normals are enabled three further floats at
//! `normal_offset` hold the normal.
//!
//! # Buffer shapes
//!
//! With `N` levels, `G = grid_size(N)`:
//!
//! - vertex: `N + 1` samples, one per level;
//! - edge: one row of `edge_size(L)` samples per level `L`, back to back;
//! - face with `n` corners: a center sample, then per corner an interior-edge
//!   row of `G` samples followed by a `G × G` interior grid.
//!
//! Face rows and grids are stored once at the finest resolution; coarser
//! levels address the same storage with a spacing of `2^(N - L)`.
//!
//! # Corner grid orientation
//!
//! In corner `S`, sample `(0, 0)` is the face center and `(G-1, G-1)` is
//! vertex `S`. Row `y = 0` is the interior-edge row `S`, running from the
//! center to the midpoint of edge `S`. Column `x = G-1` is edge `S` (midpoint
//! at `y = 0`), row `y = G-1` is edge `S - 1`, and column `x = 0` is the
//! interior-edge row `S - 1`.

use crate::error::{Result, SubsurfError};

/// Maximum supported number of refinement levels.
pub const MAX_LEVELS: usize = 11;

/// Number of samples in an edge row at `level`: `1 + 2^level`.
#[inline]
pub fn edge_size(level: usize) -> usize {
    1 + (1 << level)
}

/// Number of samples along one side of a corner grid at `level` (`level >= 1`).
#[inline]
pub fn grid_size(level: usize) -> usize {
    debug_assert!(level >= 1, "corner grids start at level 1");
    (1 << (level - 1)) + 1
}

/// Describes the element interface of a mesh: sample shape and payload sizes.
///
/// ```
/// use subsurf::mesh::MeshInterface;
///
/// // xyz positions plus a normal slot, 4 bytes of user data per vertex
/// let ifc = MeshInterface::new(3).with_width(6).with_vert_user_size(4);
/// assert_eq!(ifc.width(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshInterface {
    layers: usize,
    width: usize,
    vert_user_size: usize,
    edge_user_size: usize,
    face_user_size: usize,
    simple_subdiv: bool,
}

impl MeshInterface {
    /// Interface whose samples consist of `layers` interpolated floats.
    pub fn new(layers: usize) -> Self {
        Self {
            layers,
            width: layers,
            vert_user_size: 0,
            edge_user_size: 0,
            face_user_size: 0,
            simple_subdiv: false,
        }
    }

    /// Set the total sample width in floats (at least `layers`).
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Set the per-vertex user payload size in bytes.
    pub fn with_vert_user_size(mut self, size: usize) -> Self {
        self.vert_user_size = size;
        self
    }

    /// Set the per-edge user payload size in bytes.
    pub fn with_edge_user_size(mut self, size: usize) -> Self {
        self.edge_user_size = size;
        self
    }

    /// Set the per-face user payload size in bytes.
    pub fn with_face_user_size(mut self, size: usize) -> Self {
        self.face_user_size = size;
        self
    }

    /// Keep vertex points in place instead of smoothing them.
    pub fn with_simple_subdiv(mut self, simple: bool) -> Self {
        self.simple_subdiv = simple;
        self
    }

    /// Number of interpolated floats per sample.
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Total floats per sample.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Per-vertex user payload size in bytes.
    pub fn vert_user_size(&self) -> usize {
        self.vert_user_size
    }

    /// Per-edge user payload size in bytes.
    pub fn edge_user_size(&self) -> usize {
        self.edge_user_size
    }

    /// Per-face user payload size in bytes.
    pub fn face_user_size(&self) -> usize {
        self.face_user_size
    }

    /// Whether vertex smoothing is disabled.
    pub fn simple_subdiv(&self) -> bool {
        self.simple_subdiv
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.layers == 0 {
            return Err(SubsurfError::invalid_param(
                "layers",
                self.layers,
                "must be at least 1",
            ));
        }
        if self.width < self.layers {
            return Err(SubsurfError::invalid_param(
                "width",
                self.width,
                "must be at least the number of layers",
            ));
        }
        Ok(())
    }
}

/// Addressing for the sample buffers of one context configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    levels: usize,
    width: usize,
    layers: usize,
    normal_offset: Option<usize>,
}

impl Layout {
    /// Layout for `levels` refinement levels over samples shaped by `ifc`.
    pub fn new(ifc: &MeshInterface, levels: usize) -> Self {
        Self {
            levels,
            width: ifc.width,
            layers: ifc.layers,
            normal_offset: None,
        }
    }

    pub(crate) fn with_normal_offset(mut self, offset: Option<usize>) -> Self {
        self.normal_offset = offset;
        self
    }

    /// Number of refinement levels.
    #[inline]
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Floats per sample.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Interpolated floats per sample.
    #[inline]
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Offset of the normal inside a sample, when normals are enabled.
    #[inline]
    pub fn normal_offset(&self) -> Option<usize> {
        self.normal_offset
    }

    /// Side length of the finest corner grid.
    #[inline]
    pub fn max_grid_size(&self) -> usize {
        grid_size(self.levels)
    }

    /// Length of the finest edge row.
    #[inline]
    pub fn max_edge_size(&self) -> usize {
        edge_size(self.levels)
    }

    #[inline]
    fn spacing(&self, level: usize) -> usize {
        1 << (self.levels - level)
    }

    #[inline]
    fn edge_base(level: usize) -> usize {
        level + (1 << level) - 1
    }

    /// Floats in a vertex buffer.
    pub fn vert_len(&self) -> usize {
        self.width * (self.levels + 1)
    }

    /// Floats in an edge buffer.
    pub fn edge_len(&self) -> usize {
        self.width * (self.levels + (1 << (self.levels + 1)))
    }

    /// Floats in the buffer of a face with `corners` corners.
    pub fn face_len(&self, corners: usize) -> usize {
        let g = self.max_grid_size();
        self.width * (1 + corners * (g + g * g))
    }

    /// Offset of a vertex sample at `level`.
    #[inline]
    pub fn vert_co(&self, level: usize) -> usize {
        self.width * level
    }

    /// Offset of sample `x` in the edge row at `level`, counted from `v0`.
    #[inline]
    pub fn edge_co(&self, level: usize, x: usize) -> usize {
        self.width * (Self::edge_base(level) + x)
    }

    /// Offset of sample `x` in the edge row at `level`, counted from the
    /// endpoint that is (`from_v0`) or is not `v0`.
    #[inline]
    pub fn edge_co_from(&self, level: usize, x: usize, from_v0: bool) -> usize {
        if from_v0 {
            self.edge_co(level, x)
        } else {
            self.edge_co(level, edge_size(level) - 1 - x)
        }
    }

    /// Offset of the face center sample.
    #[inline]
    pub fn face_center(&self) -> usize {
        0
    }

    #[inline]
    fn corner_base(&self, corner: usize) -> usize {
        let g = self.max_grid_size();
        1 + corner * (g + g * g)
    }

    /// Offset of sample `x` of interior-edge row `corner` at `level`.
    #[inline]
    pub fn face_ie(&self, level: usize, corner: usize, x: usize) -> usize {
        self.width * (self.corner_base(corner) + x * self.spacing(level))
    }

    /// Offset of grid sample `(x, y)` of `corner` at `level`.
    #[inline]
    pub fn face_if(&self, level: usize, corner: usize, x: usize, y: usize) -> usize {
        let g = self.max_grid_size();
        self.width * (self.corner_base(corner) + g + (y * g + x) * self.spacing(level))
    }

    /// Offset of the face grid sample that sits `ey` steps inside the face
    /// from sample `ex` of the face's edge in slot `slot`.
    ///
    /// `ex` counts from the edge's `v0`; `flipped` is set when `v0` is not the
    /// face vertex in the same slot. Samples past the edge midpoint live in
    /// the next corner's grid, samples past the center line in the previous
    /// one.
    pub fn face_if_edge(
        &self,
        corners: usize,
        slot: usize,
        flipped: bool,
        level: usize,
        ex: usize,
        ey: usize,
    ) -> usize {
        let g = self.max_grid_size() as isize;
        let spacing = self.spacing(level) as isize;
        let mut ex = ex as isize * spacing;
        let ey = ey as isize * spacing;
        if flipped {
            ex = (g * 2 - 1) - 1 - ex;
        }
        let y = g - 1 - ex;
        let x = g - 1 - ey;

        let (corner, cx, cy) = if x < 0 {
            ((slot + corners - 1) % corners, y, -x)
        } else if y < 0 {
            ((slot + 1) % corners, -y, x)
        } else {
            (slot, x, y)
        };
        self.face_if(self.levels, corner, cx as usize, cy as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(levels: usize) -> Layout {
        Layout::new(&MeshInterface::new(3).with_width(4), levels)
    }

    #[test]
    fn test_sizes() {
        assert_eq!(edge_size(0), 2);
        assert_eq!(edge_size(3), 9);
        assert_eq!(grid_size(1), 2);
        assert_eq!(grid_size(3), 5);

        let l = layout(2);
        assert_eq!(l.vert_len(), 4 * 3);
        // rows of 2, 3, 5 samples
        assert_eq!(l.edge_len(), 4 * (2 + 3 + 5));
        // center + 4 * (3 + 9)
        assert_eq!(l.face_len(4), 4 * 49);
    }

    #[test]
    fn test_edge_rows_are_disjoint() {
        let l = layout(3);
        let mut offsets = Vec::new();
        for level in 0..=3 {
            for x in 0..edge_size(level) {
                offsets.push(l.edge_co(level, x));
            }
        }
        let n = offsets.len();
        offsets.sort_unstable();
        offsets.dedup();
        assert_eq!(offsets.len(), n);
        assert_eq!(*offsets.last().unwrap() + l.width(), l.edge_len());

        assert_eq!(l.edge_co_from(2, 1, false), l.edge_co(2, 3));
    }

    #[test]
    fn test_coarse_levels_share_fine_storage() {
        let l = layout(3);
        // level 2 sample (1, 1) is level 3 sample (2, 2)
        assert_eq!(l.face_if(2, 1, 1, 1), l.face_if(3, 1, 2, 2));
        assert_eq!(l.face_ie(1, 0, 1), l.face_ie(3, 0, 4));
        // finest grids tile the buffer exactly
        let g = l.max_grid_size();
        assert_eq!(l.face_if(3, 2, g - 1, g - 1) + l.width(), l.face_len(3));
    }

    #[test]
    fn test_face_if_edge_walks_edge_column() {
        let l = layout(2);
        let g = l.max_grid_size();

        // From v0 up to the midpoint the samples are column G-1 of the slot's corner.
        assert_eq!(l.face_if_edge(4, 1, false, 2, 0, 0), l.face_if(2, 1, g - 1, g - 1));
        assert_eq!(l.face_if_edge(4, 1, false, 2, 2, 0), l.face_if(2, 1, g - 1, 0));
        // Past the midpoint they continue on row G-1 of the next corner.
        assert_eq!(l.face_if_edge(4, 1, false, 2, 3, 0), l.face_if(2, 2, 1, g - 1));
        assert_eq!(l.face_if_edge(4, 1, false, 2, 4, 0), l.face_if(2, 2, g - 1, g - 1));
        // One step inside the face.
        assert_eq!(l.face_if_edge(4, 1, false, 2, 1, 1), l.face_if(2, 1, g - 2, g - 2));
        // A flipped edge is walked from the other end.
        assert_eq!(l.face_if_edge(4, 1, true, 2, 4, 0), l.face_if(2, 1, g - 1, g - 1));
        // Coarser levels scale by the spacing.
        assert_eq!(l.face_if_edge(4, 1, false, 1, 1, 0), l.face_if(2, 1, g - 1, 0));
    }
}
