use tracing::debug;

use crate::image_pipeline::tiling::geometry::TileGeometry;

/// Tile grid for one call, derived from the current image extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlan {
    geometry: TileGeometry,
    tile_count: [i32; 2],
    output_extent: [i32; 2],
    input_extent: [i32; 2],
}

/// One entry of the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Row-major linear index: `ty * tile_count_dim0 + tx`.
    pub index: usize,
    pub tx: i32,
    pub ty: i32,
    /// First image coordinate covered by the tile, per axis.
    pub origin: [i32; 2],
    /// Pixels copied into the tile on pack (halo included).
    pub input_span: [i32; 2],
    /// Pixels copied out of the tile on unpack (halo dropped).
    pub output_span: [i32; 2],
}

impl TilePlan {
    pub fn new(geometry: TileGeometry, output_extent: [i32; 2], input_extent: [i32; 2]) -> Self {
        let mut tile_count = [0i32; 2];
        for axis in 0..2 {
            // Equal to ceil(extent / step); never leaves a zero-size trailing tile.
            let padded = output_extent[axis].max(0) as i64 + geometry.tile_size(axis) as i64
                - geometry.stencil(axis) as i64;
            tile_count[axis] = (padded / geometry.step(axis) as i64) as i32;
        }

        let plan = Self {
            geometry,
            tile_count,
            output_extent,
            input_extent,
        };
        debug!(
            tiles_x = plan.tile_count[0],
            tiles_y = plan.tile_count[1],
            step_x = geometry.step(0),
            step_y = geometry.step(1),
            "Planned tile grid"
        );
        plan
    }

    pub fn geometry(&self) -> &TileGeometry {
        &self.geometry
    }

    pub fn tile_count(&self, axis: usize) -> i32 {
        self.tile_count[axis]
    }

    pub fn tile_count_dim0(&self) -> i32 {
        self.tile_count[0]
    }

    pub fn tile_count_dim1(&self) -> i32 {
        self.tile_count[1]
    }

    pub fn tile_size_dim0(&self) -> i32 {
        self.geometry.tile_size(0)
    }

    pub fn tile_size_dim1(&self) -> i32 {
        self.geometry.tile_size(1)
    }

    pub fn stencil_halo_dim0(&self) -> i32 {
        self.geometry.stencil(0)
    }

    pub fn stencil_halo_dim1(&self) -> i32 {
        self.geometry.stencil(1)
    }

    pub fn output_extent(&self) -> [i32; 2] {
        self.output_extent
    }

    pub fn input_extent(&self) -> [i32; 2] {
        self.input_extent
    }

    pub fn total_tiles(&self) -> usize {
        self.tile_count[0] as usize * self.tile_count[1] as usize
    }

    /// Elements in the packed input staging buffer.
    pub fn packed_input_len(&self) -> usize {
        self.total_tiles() * self.geometry.input_tile_len()
    }

    /// Bytes in the channel-interleaved output staging buffer.
    pub fn packed_output_len(&self) -> usize {
        self.total_tiles() * self.geometry.output_tile_len()
    }

    pub fn origin(&self, axis: usize, t: i32) -> i32 {
        self.geometry.step(axis) * t
    }

    fn is_last(&self, axis: usize, t: i32) -> bool {
        t == self.tile_count[axis] - 1
    }

    /// Input pixels of tile `t` along `axis`: the full window, or what is left
    /// of the input image for the trailing tile. Clamped to the image either way.
    pub fn input_span(&self, axis: usize, t: i32) -> i32 {
        let size = self.geometry.tile_size(axis);
        let remaining = self.input_extent[axis] - self.origin(axis, t);
        let span = if self.is_last(axis, t) { remaining } else { size };
        span.min(size).min(remaining).max(0)
    }

    /// Output pixels of tile `t` along `axis`: one step, or the remainder for the trailing tile.
    pub fn output_span(&self, axis: usize, t: i32) -> i32 {
        let step = self.geometry.step(axis);
        if self.is_last(axis, t) {
            self.output_extent[axis] - self.origin(axis, t)
        } else {
            step
        }
    }

    pub fn tile(&self, tx: i32, ty: i32) -> Tile {
        Tile {
            index: ty as usize * self.tile_count[0] as usize + tx as usize,
            tx,
            ty,
            origin: [self.origin(0, tx), self.origin(1, ty)],
            input_span: [self.input_span(0, tx), self.input_span(1, ty)],
            output_span: [self.output_span(0, tx), self.output_span(1, ty)],
        }
    }

    /// All tiles, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.tile_count[1])
            .flat_map(move |ty| (0..self.tile_count[0]).map(move |tx| self.tile(tx, ty)))
    }
}
