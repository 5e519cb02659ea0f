//! Grid containers for map layers
//!
//! Both containers share their storage behind an [`Arc`], so cloning a map
//! is cheap and a modified copy only duplicates the layer that changed.

use eoclient_core::MapCoordinate;
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Dense row-major grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Arc<Vec<T>>,
}

impl<T: Clone> Matrix<T> {
    /// Create a grid with every cell set to `value`
    pub fn new(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: Arc::new(vec![value; rows * cols]),
        }
    }

    /// Mutable rows from top to bottom, copying the storage if it is shared
    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut [T]> + '_ {
        let cols = self.cols.max(1);
        Arc::make_mut(&mut self.data).chunks_mut(cols)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.cols && y < self.rows).then(|| y * self.cols + x)
    }

    /// Cell at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.index(x, y).map(|i| &self.data[i])
    }

    /// One full row
    pub fn row(&self, y: usize) -> Option<&[T]> {
        (y < self.rows).then(|| &self.data[y * self.cols..(y + 1) * self.cols])
    }

    /// Rows from top to bottom
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        // chunks(0) panics; an empty grid has no data anyway
        self.data.chunks(self.cols.max(1))
    }

    /// Set one cell, copying the storage if it is shared
    ///
    /// Returns `false` without changing anything when the cell is outside
    /// the grid.
    pub fn set(&mut self, x: usize, y: usize, value: T) -> bool {
        match self.index(x, y) {
            Some(i) => {
                Arc::make_mut(&mut self.data)[i] = value;
                true
            }
            None => false,
        }
    }

    /// Copy into a grid of another size, keeping the overlapping cells
    pub fn resized(&self, rows: usize, cols: usize, fill: T) -> Self {
        if rows == self.rows && cols == self.cols {
            return self.clone();
        }

        let mut data = Vec::with_capacity(rows * cols);
        for y in 0..rows {
            for x in 0..cols {
                let value = self.get(x, y).cloned().unwrap_or_else(|| fill.clone());
                data.push(value);
            }
        }

        Self {
            rows,
            cols,
            data: Arc::new(data),
        }
    }
}

impl<T: Serialize> Serialize for Matrix<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.data.chunks(self.cols.max(1)))
    }
}

/// Sparse grid holding at most one entity per cell
///
/// Iteration is row-major (`y` first, then `x`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseMatrix<T> {
    rows: usize,
    cols: usize,
    entries: Arc<BTreeMap<MapCoordinate, T>>,
}

impl<T: Clone> SparseMatrix<T> {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Arc::new(BTreeMap::new()),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn contains_cell(&self, at: MapCoordinate) -> bool {
        (at.x as usize) < self.cols && (at.y as usize) < self.rows
    }

    pub fn get(&self, at: MapCoordinate) -> Option<&T> {
        self.entries.get(&at)
    }

    pub fn contains(&self, at: MapCoordinate) -> bool {
        self.entries.contains_key(&at)
    }

    /// Place a value, replacing whatever was in that cell
    ///
    /// Returns `false` without changing anything when the cell is outside
    /// the grid.
    pub fn insert(&mut self, at: MapCoordinate, value: T) -> bool {
        if !self.contains_cell(at) {
            return false;
        }
        Arc::make_mut(&mut self.entries).insert(at, value);
        true
    }

    pub fn remove(&mut self, at: MapCoordinate) -> Option<T> {
        if !self.entries.contains_key(&at) {
            return None;
        }
        Arc::make_mut(&mut self.entries).remove(&at)
    }

    /// Entries in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (MapCoordinate, &T)> + '_ {
        self.entries.iter().map(|(at, value)| (*at, value))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.values()
    }

    /// Copy into a grid of another size, dropping entries that no longer fit
    pub fn resized(&self, rows: usize, cols: usize) -> Self {
        let mut resized = Self {
            rows,
            cols,
            entries: Arc::clone(&self.entries),
        };
        if self.entries.keys().any(|at| !resized.contains_cell(*at)) {
            let kept = self
                .entries
                .iter()
                .filter(|(at, _)| resized.contains_cell(**at))
                .map(|(at, value)| (*at, value.clone()))
                .collect();
            resized.entries = Arc::new(kept);
        }
        resized
    }
}

impl<T: Serialize> Serialize for SparseMatrix<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_mut_leaves_shared_copy() {
        let original = Matrix::new(2, 2, 0u8);
        let mut edited = original.clone();
        for (y, row) in edited.rows_mut().enumerate() {
            row[1] = y as u8 + 1;
        }

        assert_eq!(edited.row(1), Some(&[0, 2][..]));
        assert_eq!(original.row(1), Some(&[0, 0][..]));
    }

    #[test]
    fn test_get_and_set() {
        let mut grid = Matrix::new(2, 3, 0u16);
        assert_eq!(grid.get(2, 1), Some(&0));
        assert!(grid.set(2, 1, 7));
        assert_eq!(grid.get(2, 1), Some(&7));
        assert_eq!(grid.row(1), Some(&[0, 0, 7][..]));

        assert!(!grid.set(3, 0, 9));
        assert!(grid.get(0, 2).is_none());
    }

    #[test]
    fn test_clone_is_copy_on_write() {
        let original = Matrix::new(2, 2, 1u16);
        let mut copy = original.clone();
        copy.set(0, 0, 5);
        assert_eq!(original.get(0, 0), Some(&1));
        assert_eq!(copy.get(0, 0), Some(&5));
    }

    #[test]
    fn test_resize_keeps_overlap() {
        let mut grid = Matrix::new(2, 2, 0u16);
        grid.set(1, 1, 4);
        let grown = grid.resized(3, 3, 9);
        assert_eq!(grown.get(1, 1), Some(&4));
        assert_eq!(grown.get(2, 2), Some(&9));

        let shrunk = grown.resized(1, 1, 0);
        assert_eq!(shrunk.iter_rows().count(), 1);
        assert_eq!(shrunk.get(0, 0), Some(&0));
    }

    #[test]
    fn test_sparse_iterates_row_major() {
        let mut grid = SparseMatrix::new(4, 4);
        grid.insert(MapCoordinate::new(3, 0), 'c');
        grid.insert(MapCoordinate::new(0, 1), 'd');
        grid.insert(MapCoordinate::new(1, 0), 'b');
        let order: Vec<char> = grid.values().copied().collect();
        assert_eq!(order, vec!['b', 'c', 'd']);
    }

    #[test]
    fn test_sparse_bounds_and_resize() {
        let mut grid = SparseMatrix::new(2, 2);
        assert!(!grid.insert(MapCoordinate::new(2, 0), 1));
        assert!(grid.insert(MapCoordinate::new(1, 1), 2));
        assert!(grid.insert(MapCoordinate::new(0, 0), 3));

        let shrunk = grid.resized(1, 1);
        assert_eq!(shrunk.len(), 1);
        assert_eq!(shrunk.get(MapCoordinate::new(0, 0)), Some(&3));
        assert_eq!(grid.len(), 2);
    }
}
