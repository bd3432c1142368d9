use bit_set::BitSet;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt;

use crate::cells::{Cell, DIRECTIONS};
use crate::units::ColumnIndex;
use crate::walls::WallGrid;

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum TraversalError {
    InvalidStart,
}

impl fmt::Display for TraversalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TraversalError::InvalidStart => write!(f, "start column is outside the grid"),
        }
    }
}

impl Error for TraversalError {}

/// How far a search has got with one cell.
///
/// `Pending` cells have been discovered but not finished with: they sit
/// on the breadth first frontier queue, or on the depth first stack.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CellState {
    Unvisited,
    Pending,
    Visited,
}

/// The visualisation state of every cell after some number of search
/// steps. Snapshots are immutable once emitted; the renderer colours one
/// animation frame from each.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    rows: usize,
    columns: usize,
    states: Vec<CellState>,
}

impl Snapshot {
    fn unvisited(grid: &WallGrid) -> Snapshot {
        Snapshot {
            rows: grid.rows(),
            columns: grid.columns(),
            states: vec![CellState::Unvisited; grid.size()],
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

    /// The state of one cell, or None if the coordinate is outside the
    /// grid the snapshot was taken over.
    pub fn state(&self, cell: Cell) -> Option<CellState> {
        let (row, column) = (cell.row as usize, cell.column as usize);
        if row < self.rows && column < self.columns {
            Some(self.states[row * self.columns + column])
        } else {
            None
        }
    }

    pub fn count_of(&self, state: CellState) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }

    #[inline]
    fn set_state(&mut self, index: usize, state: CellState) {
        self.states[index] = state;
    }
}

/// A lazy breadth first search over a built maze, yielding one `Snapshot`
/// per dequeued cell plus a final snapshot once the frontier runs dry -
/// `reachable cells + 1` snapshots in all. Cells leave the queue in
/// non-decreasing distance from the start.
///
/// The walk only reads the grid's walls, so it also terminates on grids
/// no generator produced - a disconnected grid simply reaches fewer
/// cells.
pub struct BreadthFirstFrames<'a> {
    grid: &'a WallGrid,
    visited: BitSet,
    frontier: VecDeque<Cell>,
    current: Snapshot,
    done: bool,
}

impl<'a> BreadthFirstFrames<'a> {
    /// Start a breadth first walk from the top row cell in the given
    /// column. Nothing is computed until the first snapshot is pulled.
    pub fn new(grid: &WallGrid, start: ColumnIndex) -> Result<BreadthFirstFrames, TraversalError> {
        let start_cell = Cell::new(0, start.0 as u32);
        let start_index = grid.cell_index(start_cell).ok_or(TraversalError::InvalidStart)?;

        let mut visited = BitSet::with_capacity(grid.size());
        visited.insert(start_index);
        let mut frontier = VecDeque::new();
        frontier.push_back(start_cell);

        Ok(BreadthFirstFrames {
            grid,
            visited,
            frontier,
            current: Snapshot::unvisited(grid),
            done: false,
        })
    }
}

impl<'a> Iterator for BreadthFirstFrames<'a> {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        // The snapshot shows the state *before* this step's expansion.
        let emitted = self.current.clone();

        match self.frontier.pop_front() {
            None => self.done = true,
            Some(cell) => {
                for &direction in DIRECTIONS.iter() {
                    if !self.grid.is_open(cell, direction) {
                        continue;
                    }
                    if let Some(neighbour) = self.grid.neighbour_at_direction(cell, direction) {
                        let neighbour_index = self.grid.cell_index(neighbour)
                            .expect("neighbour_at_direction only returns in-bounds cells");
                        if self.visited.insert(neighbour_index) {
                            self.current.set_state(neighbour_index, CellState::Pending);
                            self.frontier.push_back(neighbour);
                        }
                    }
                }
                let index = self.grid.cell_index(cell)
                    .expect("cells on the frontier are always in bounds");
                self.current.set_state(index, CellState::Visited);
            }
        }

        Some(emitted)
    }
}

/// One suspended step of the depth first walk: a cell and how far through
/// the fixed direction order it has got.
struct TraceFrame {
    cell: Cell,
    cursor: usize,
}

/// A lazy depth first search over a built maze, mirroring the maze
/// generator's explicit stack of resumable frames but trying directions
/// in the fixed enumeration order and never touching the walls.
///
/// Each pulled snapshot precedes one retirement: the walk descends -
/// marking every newly reached cell `Pending` - until the top frame has
/// no viable direction left, at which point that cell becomes `Visited`
/// and its frame is popped. One cell retires per step, so the sequence
/// is `reachable cells + 1` snapshots long, the final one emitted once
/// the stack empties. Termination needs no assumptions about the grid's
/// walls.
pub struct DepthFirstFrames<'a> {
    grid: &'a WallGrid,
    visited: BitSet,
    stack: Vec<TraceFrame>,
    current: Snapshot,
    done: bool,
}

impl<'a> DepthFirstFrames<'a> {
    /// Start a depth first walk from the top row cell in the given
    /// column. Nothing is computed until the first snapshot is pulled.
    pub fn new(grid: &WallGrid, start: ColumnIndex) -> Result<DepthFirstFrames, TraversalError> {
        let start_cell = Cell::new(0, start.0 as u32);
        if grid.cell_index(start_cell).is_none() {
            return Err(TraversalError::InvalidStart);
        }
        let mut stack = Vec::new();
        stack.push(TraceFrame {
            cell: start_cell,
            cursor: 0,
        });

        Ok(DepthFirstFrames {
            grid,
            visited: BitSet::with_capacity(grid.size()),
            stack,
            current: Snapshot::unvisited(grid),
            done: false,
        })
    }

    /// Run the walk up to and including the next backtrack: descend while
    /// unvisited neighbours are reachable, then retire the dead-end cell
    /// and pop its frame.
    fn retire_one(&mut self) {
        while let Some(frame) = self.stack.last_mut() {
            let cell = frame.cell;
            let index = self.grid.cell_index(cell)
                .expect("cells on the walk stack are always in bounds");
            if self.visited.insert(index) {
                self.current.set_state(index, CellState::Pending);
            }

            let mut descend_to = None;
            while frame.cursor < DIRECTIONS.len() {
                let direction = DIRECTIONS[frame.cursor];
                frame.cursor += 1;
                if !self.grid.is_open(cell, direction) {
                    continue;
                }
                if let Some(neighbour) = self.grid.neighbour_at_direction(cell, direction) {
                    let neighbour_index = self.grid.cell_index(neighbour)
                        .expect("neighbour_at_direction only returns in-bounds cells");
                    if !self.visited.contains(neighbour_index) {
                        descend_to = Some(neighbour);
                        break;
                    }
                }
            }

            match descend_to {
                Some(neighbour) => {
                    self.stack.push(TraceFrame {
                        cell: neighbour,
                        cursor: 0,
                    });
                }
                None => {
                    self.current.set_state(index, CellState::Visited);
                    self.stack.pop();
                    return;
                }
            }
        }
    }
}

impl<'a> Iterator for DepthFirstFrames<'a> {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let emitted = self.current.clone();

        if self.stack.is_empty() {
            self.done = true;
        } else {
            self.retire_one();
        }

        Some(emitted)
    }
}
