use bit_set::BitSet;
use std::fmt;

use crate::cells::{Cell, Direction};
use crate::units::{ColumnIndex, ColumnsCount, RowsCount};

/// The wall state of a rows x columns maze.
///
/// Walls live on the edges between adjacent cells and on the outer
/// boundary: horizontal edges form a `(rows + 1) x columns` matrix
/// (rows `0` and `rows` are the boundary), vertical edges a
/// `rows x (columns + 1)` matrix (columns `0` and `columns` are the
/// boundary). Both matrices are kept as sets of *open* edges over
/// row major edge indices, so the only mutations are insertions and a
/// wall can never be closed again once opened.
///
/// Every wall starts closed. The generator opens internal walls through
/// `make_open` and at most one entrance/exit pair on the boundary.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WallGrid {
    rows: usize,
    columns: usize,
    horizontal_open: BitSet,
    vertical_open: BitSet,
}

impl WallGrid {
    pub fn new(rows: RowsCount, columns: ColumnsCount) -> WallGrid {
        let (RowsCount(rows), ColumnsCount(columns)) = (rows, columns);
        WallGrid {
            rows,
            columns,
            horizontal_open: BitSet::with_capacity((rows + 1) * columns),
            vertical_open: BitSet::with_capacity(rows * (columns + 1)),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.rows * self.columns
    }

    /// The number of open walls, boundary doorways included.
    pub fn open_walls_count(&self) -> usize {
        self.horizontal_open.len() + self.vertical_open.len()
    }

    /// Is the grid coordinate within the grid's dimensions?
    #[inline]
    pub fn is_valid_coordinate(&self, cell: Cell) -> bool {
        (cell.row as usize) < self.rows && (cell.column as usize) < self.columns
    }

    /// Convert a grid coordinate to a one dimensional index in the range
    /// 0...grid.size(). Returns None if the grid coordinate is invalid.
    #[inline]
    pub fn cell_index(&self, cell: Cell) -> Option<usize> {
        if self.is_valid_coordinate(cell) {
            Some(cell.row as usize * self.columns + cell.column as usize)
        } else {
            None
        }
    }

    /// The adjacent cell in the given direction, or None when that steps
    /// off the grid.
    pub fn neighbour_at_direction(&self, cell: Cell, direction: Direction) -> Option<Cell> {
        cell.neighbour(direction)
            .and_then(|neighbour| if self.is_valid_coordinate(neighbour) {
                Some(neighbour)
            } else {
                None
            })
    }

    /// Is the wall between `cell` and its neighbour in `direction` open?
    ///
    /// For any valid `cell` all four surrounding edges exist in the wall
    /// matrices, boundary edges included, so no bounds check is needed on
    /// the direction itself.
    pub fn is_open(&self, cell: Cell, direction: Direction) -> bool {
        let (row, column) = (cell.row as usize, cell.column as usize);
        match direction {
            Direction::Up => self.horizontal_open.contains(self.horizontal_index(row, column)),
            Direction::Down => {
                self.horizontal_open.contains(self.horizontal_index(row + 1, column))
            }
            Direction::Left => self.vertical_open.contains(self.vertical_index(row, column)),
            Direction::Right => {
                self.vertical_open.contains(self.vertical_index(row, column + 1))
            }
        }
    }

    /// Opens the internal wall between `cell` and its neighbour in
    /// `direction`, writing the single shared edge entry. A no-op if the
    /// wall is already open, if `cell` is invalid, or if the edge lies on
    /// the outer boundary - doorways go through `open_entrance` and
    /// `open_exit` instead.
    pub fn make_open(&mut self, cell: Cell, direction: Direction) {
        if !self.is_valid_coordinate(cell) {
            return;
        }
        let (row, column) = (cell.row as usize, cell.column as usize);
        match direction {
            Direction::Up if row != 0 => {
                let index = self.horizontal_index(row, column);
                self.horizontal_open.insert(index);
            }
            Direction::Down if row != self.rows - 1 => {
                let index = self.horizontal_index(row + 1, column);
                self.horizontal_open.insert(index);
            }
            Direction::Left if column != 0 => {
                let index = self.vertical_index(row, column);
                self.vertical_open.insert(index);
            }
            Direction::Right if column != self.columns - 1 => {
                let index = self.vertical_index(row, column + 1);
                self.vertical_open.insert(index);
            }
            _ => {}
        }
    }

    /// Opens the boundary wall above row zero at the given column.
    pub fn open_entrance(&mut self, column: ColumnIndex) {
        debug_assert!(column.0 < self.columns);
        let index = self.horizontal_index(0, column.0);
        self.horizontal_open.insert(index);
    }

    /// Opens the boundary wall below the last row at the given column.
    pub fn open_exit(&mut self, column: ColumnIndex) {
        debug_assert!(column.0 < self.columns);
        let index = self.horizontal_index(self.rows, column.0);
        self.horizontal_open.insert(index);
    }

    /// All cells in row major order.
    pub fn iter(&self) -> CellIter {
        CellIter {
            current: 0,
            columns: self.columns,
            cells_count: self.size(),
        }
    }

    #[inline]
    fn horizontal_index(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    #[inline]
    fn vertical_index(&self, row: usize, column: usize) -> usize {
        row * (self.columns + 1) + column
    }
}

impl fmt::Display for WallGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut output = String::new();
        for row in 0..=self.rows {
            for column in 0..self.columns {
                output.push('+');
                if self.horizontal_open.contains(self.horizontal_index(row, column)) {
                    output.push_str("  ");
                } else {
                    output.push_str("--");
                }
            }
            output.push_str("+\n");
            if row == self.rows {
                break;
            }
            for column in 0..=self.columns {
                if self.vertical_open.contains(self.vertical_index(row, column)) {
                    output.push(' ');
                } else {
                    output.push('|');
                }
                if column == self.columns {
                    break;
                }
                output.push_str("  ");
            }
            output.push('\n');
        }
        write!(f, "{}", output)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct CellIter {
    current: usize,
    columns: usize,
    cells_count: usize,
}
impl Iterator for CellIter {
    type Item = Cell;
    fn next(&mut self) -> Option<Self::Item> {
        if self.current < self.cells_count {
            let row = (self.current / self.columns) as u32;
            let column = (self.current % self.columns) as u32;
            self.current += 1;
            Some(Cell::new(row, column))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cells_count - self.current;
        (remaining, Some(remaining))
    }
}
impl ExactSizeIterator for CellIter {} // default impl using size_hint()
