//! Uniform spatial hash over a fixed rectangle of cells
//!
//! Every tank lives in exactly one bucket, picked by the cell its center
//! falls into. The cell is cached on the tank as its [`Address`], so moving
//! a tank only touches two buckets instead of rebuilding the grid.
//!
//! Positions outside the grid clamp to the nearest border cell; the grid
//! never grows.

use glam::{IVec2, UVec2, Vec2};

use super::collision::Aabb;

/// Cell coordinate of an entity, cached for incremental updates
pub type Address = UVec2;

/// One bucket entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    id: usize,
    group: u32,
}

/// Uniform grid of buckets
#[derive(Debug, Clone)]
pub struct SpatialHash {
    /// Cells on each axis
    dims: UVec2,
    /// Cell size in world units
    tile: Vec2,
    cells: Vec<Vec<Entry>>,
}

impl SpatialHash {
    /// Grid of `width` × `height` cells, each `tile` world units big
    ///
    /// Zero dimensions are bumped to one cell so every position has a home.
    pub fn new(width: u32, height: u32, tile: Vec2) -> Self {
        let dims = UVec2::new(width.max(1), height.max(1));
        Self {
            dims,
            tile,
            cells: vec![Vec::new(); dims.x as usize * dims.y as usize],
        }
    }

    /// Grid covering `size` world units with cells of `tile` units
    pub fn covering(size: Vec2, tile: Vec2) -> Self {
        let cells = (size / tile).ceil();
        Self::new(cells.x as u32, cells.y as u32, tile)
    }

    pub fn dims(&self) -> UVec2 {
        self.dims
    }

    /// Cell containing `pos`, clamped to the grid
    pub fn adr(&self, pos: Vec2) -> Address {
        let cell = (pos / self.tile).floor().as_ivec2();
        cell.clamp(IVec2::ZERO, self.dims.as_ivec2() - IVec2::ONE)
            .as_uvec2()
    }

    /// World rectangle covered by a cell
    pub fn cell_rect(&self, adr: Address) -> Aabb {
        let min = adr.as_vec2() * self.tile;
        Aabb::new(min, min + self.tile)
    }

    #[inline]
    fn index(&self, adr: Address) -> usize {
        assert!(
            adr.x < self.dims.x && adr.y < self.dims.y,
            "address {adr} outside grid {}",
            self.dims
        );
        Self::flat(self.dims, adr.x, adr.y)
    }

    /// Row-major bucket index, in `usize` so large grids cannot wrap
    #[inline]
    fn flat(dims: UVec2, x: u32, y: u32) -> usize {
        y as usize * dims.x as usize + x as usize
    }

    /// Add an entry at `pos` and return the address to cache
    pub fn insert(&mut self, pos: Vec2, id: usize, group: u32) -> Address {
        let adr = self.adr(pos);
        let idx = self.index(adr);
        self.cells[idx].push(Entry { id, group });
        adr
    }

    /// Move an entry to the cell of `pos`, rewriting the cached address
    ///
    /// Does nothing if the cell did not change.
    pub fn update(&mut self, address: &mut Address, pos: Vec2, id: usize, group: u32) {
        let adr = self.adr(pos);
        if adr == *address {
            return;
        }
        self.remove(*address, id, group);
        let idx = self.index(adr);
        self.cells[idx].push(Entry { id, group });
        *address = adr;
    }

    /// Remove an entry from its cached cell
    ///
    /// # Panics
    ///
    /// Panics if the entry is not in that cell, which means the caller's
    /// bookkeeping is broken.
    pub fn remove(&mut self, address: Address, id: usize, group: u32) {
        let idx = self.index(address);
        let bucket = &mut self.cells[idx];
        let Some(i) = bucket.iter().position(|e| e.id == id && e.group == group) else {
            panic!("entry {id} (group {group}) missing from cell {address}");
        };
        bucket.swap_remove(i);
    }

    /// Collect ids of entries in every cell `region` touches
    ///
    /// With `include == false` entries of `group` are skipped (enemies);
    /// with `include == true` only entries of `group` are kept (allies).
    /// Ids are appended to `out`; clear it first when reusing a buffer.
    /// Order across cells is unspecified.
    pub fn query(&self, region: Aabb, out: &mut Vec<usize>, group: u32, include: bool) {
        let min = self.adr(region.min);
        let max = self.adr(region.max);
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let idx = Self::flat(self.dims, x, y);
                out.extend(
                    self.cells[idx]
                        .iter()
                        .filter(|e| (e.group == group) == include)
                        .map(|e| e.id),
                );
            }
        }
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> SpatialHash {
        SpatialHash::new(10, 10, Vec2::splat(100.0))
    }

    #[test]
    fn test_adr_floors_and_clamps() {
        let g = grid();
        assert_eq!(g.adr(Vec2::new(150.0, 250.0)), UVec2::new(1, 2));
        assert_eq!(g.adr(Vec2::new(-50.0, 20.0)), UVec2::new(0, 0));
        assert_eq!(g.adr(Vec2::new(5000.0, 999.9)), UVec2::new(9, 9));
    }

    #[test]
    fn test_covering_rounds_up() {
        let g = SpatialHash::covering(Vec2::new(1000.0, 950.0), Vec2::splat(300.0));
        assert_eq!(g.dims(), UVec2::new(4, 4));
    }

    #[test]
    fn test_query_filters_groups() {
        let mut g = grid();
        g.insert(Vec2::new(50.0, 50.0), 0, 0);
        g.insert(Vec2::new(60.0, 50.0), 1, 1);
        g.insert(Vec2::new(150.0, 50.0), 2, 1);
        g.insert(Vec2::new(950.0, 950.0), 3, 1);

        let region = Aabb::square(Vec2::new(100.0, 50.0), 20.0);
        let mut out = Vec::new();

        g.query(region, &mut out, 0, false);
        out.sort();
        assert_eq!(out, vec![1, 2]);

        out.clear();
        g.query(region, &mut out, 0, true);
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn test_update_moves_between_cells() {
        let mut g = grid();
        let mut adr = g.insert(Vec2::new(50.0, 50.0), 7, 1);
        let old = Aabb::square(Vec2::new(50.0, 50.0), 10.0);
        let new = Aabb::square(Vec2::new(550.0, 550.0), 10.0);
        let mut out = Vec::new();

        g.update(&mut adr, Vec2::new(550.0, 550.0), 7, 1);
        assert_eq!(adr, UVec2::new(5, 5));

        g.query(old, &mut out, 0, false);
        assert!(out.is_empty());
        g.query(new, &mut out, 0, false);
        assert_eq!(out, vec![7]);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_update_within_cell_is_noop() {
        let mut g = grid();
        let mut adr = g.insert(Vec2::new(10.0, 10.0), 1, 0);
        g.update(&mut adr, Vec2::new(90.0, 90.0), 1, 0);
        assert_eq!(adr, UVec2::ZERO);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut g = grid();
        let adr = g.insert(Vec2::new(10.0, 10.0), 1, 0);
        g.insert(Vec2::new(20.0, 10.0), 2, 0);
        g.remove(adr, 1, 0);

        let mut out = Vec::new();
        g.query(Aabb::square(Vec2::ZERO, 50.0), &mut out, 0, true);
        assert_eq!(out, vec![2]);
    }

    #[test]
    #[should_panic(expected = "missing from cell")]
    fn test_remove_missing_panics() {
        let mut g = grid();
        g.remove(UVec2::ZERO, 1, 0);
    }

    #[test]
    fn test_index_is_row_major() {
        let dims = UVec2::new(70_000, 70_000);
        // 69_999 * 70_000 overflows u32
        let idx = SpatialHash::flat(dims, 69_999, 69_999);
        assert_eq!(idx, 70_000usize * 70_000 - 1);
        assert_eq!(SpatialHash::flat(UVec2::new(10, 10), 3, 2), 23);
    }

    #[test]
    fn test_cell_rect() {
        let g = grid();
        let r = g.cell_rect(UVec2::new(2, 3));
        assert_eq!(r.min, Vec2::new(200.0, 300.0));
        assert_eq!(r.max, Vec2::new(300.0, 400.0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn point() -> impl Strategy<Value = Vec2> {
        (0.0f32..1000.0, 0.0f32..1000.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    proptest! {
        #[test]
        fn inserted_entry_is_found(p in point(), group in 0u32..4) {
            let mut g = SpatialHash::new(10, 10, Vec2::splat(100.0));
            g.insert(p, 3, group);
            let mut out = Vec::new();
            g.query(Aabb::square(p, 1.0), &mut out, group, true);
            prop_assert_eq!(out, vec![3]);
        }

        #[test]
        fn updated_entry_follows(a in point(), b in point()) {
            let mut g = SpatialHash::new(10, 10, Vec2::splat(100.0));
            let mut adr = g.insert(a, 3, 1);
            g.update(&mut adr, b, 3, 1);

            let mut out = Vec::new();
            g.query(Aabb::square(b, 0.0), &mut out, 0, false);
            prop_assert_eq!(&out, &vec![3]);

            if g.adr(a) != g.adr(b) {
                out.clear();
                g.query(Aabb::square(a, 0.0), &mut out, 0, false);
                prop_assert!(out.is_empty());
            }
            prop_assert_eq!(g.len(), 1);
        }
    }
}
