use rand::{Rng, XorShiftRng};
use smallvec::SmallVec;
use std::error::Error;
use std::fmt;

use bit_set::BitSet;

use crate::cells::{Cell, Direction, DIRECTIONS};
use crate::units::{ColumnIndex, ColumnsCount, RowsCount};
use crate::walls::WallGrid;

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum GenerationError {
    InvalidDimensions,
    InvalidEntrance,
    InvalidExit,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GenerationError::InvalidDimensions => {
                write!(f, "maze dimensions must be at least 1 x 1")
            }
            GenerationError::InvalidEntrance => {
                write!(f, "entrance column is outside the grid")
            }
            GenerationError::InvalidExit => write!(f, "exit column is outside the grid"),
        }
    }
}

impl Error for GenerationError {}

type DirectionPermutation = SmallVec<[Direction; 4]>;

/// One suspended unit of the depth first walk: the cell being explored,
/// the random order its directions will be tried in (created lazily the
/// first time the frame is on top of the stack) and how far through that
/// order the walk has got.
struct Frame {
    cell: Cell,
    directions: Option<DirectionPermutation>,
    cursor: usize,
}

impl Frame {
    fn unexplored(cell: Cell) -> Frame {
        Frame {
            cell,
            directions: None,
            cursor: 0,
        }
    }
}

/// Apply the recursive backtracker maze generation algorithm to a fresh
/// grid of the requested dimensions.
///
/// The algorithm carves a passage in a randomly chosen direction from the
/// current cell whenever the neighbour on the other side has not been
/// seen yet, descending into that neighbour, and backtracks once all four
/// directions are exhausted. Every cell is visited exactly once, so the
/// carved passages form a spanning tree of the grid - a perfect maze with
/// exactly `rows * columns - 1` open internal walls and a unique path
/// between any two cells.
///
/// The depth of the walk is bounded only by the cell count, so the
/// recursion lives on an explicit heap stack of resumable `Frame` records
/// rather than the call stack: descending pushes a frame, resuming
/// advances the frame's direction cursor, backtracking pops.
///
/// With `doors` the boundary walls above `entrance` (row zero) and below
/// `exit` (last row) are opened unconditionally as markings on the grid -
/// carving starts at the entrance column. Without `doors` the start
/// column is drawn from `rng` and the boundary stays closed.
///
/// Generation is fully determined by the dimensions, the doors and the
/// state of `rng`, so a seeded rng reproduces the same maze.
pub fn recursive_backtracker(rows: RowsCount,
                             columns: ColumnsCount,
                             doors: Option<(ColumnIndex, ColumnIndex)>,
                             rng: &mut XorShiftRng)
                             -> Result<WallGrid, GenerationError> {
    let (RowsCount(row_count), ColumnsCount(column_count)) = (rows, columns);
    if row_count == 0 || column_count == 0 {
        return Err(GenerationError::InvalidDimensions);
    }
    if let Some((ColumnIndex(entrance), ColumnIndex(exit))) = doors {
        if entrance >= column_count {
            return Err(GenerationError::InvalidEntrance);
        }
        if exit >= column_count {
            return Err(GenerationError::InvalidExit);
        }
    }

    let start_column = match doors {
        Some((ColumnIndex(entrance), _)) => entrance,
        None => rng.gen::<usize>() % column_count,
    };

    let mut grid = WallGrid::new(rows, columns);
    if let Some((entrance, exit)) = doors {
        grid.open_entrance(entrance);
        grid.open_exit(exit);
    }

    let mut visited = BitSet::with_capacity(grid.size());
    let mut stack: Vec<Frame> = Vec::new();
    stack.push(Frame::unexplored(Cell::new(0, start_column as u32)));

    while let Some(frame) = stack.last_mut() {
        let cell = frame.cell;
        let index = grid.cell_index(cell)
            .expect("cells on the exploration stack are always in bounds");
        visited.insert(index);

        let directions = frame.directions.get_or_insert_with(|| {
            let mut permutation: DirectionPermutation = DIRECTIONS.iter().cloned().collect();
            rng.shuffle(&mut permutation);
            permutation
        });

        match directions.get(frame.cursor).cloned() {
            None => {
                // All four directions tried - backtrack.
                stack.pop();
            }
            Some(direction) => {
                frame.cursor += 1;
                if let Some(neighbour) = grid.neighbour_at_direction(cell, direction) {
                    let neighbour_index = grid.cell_index(neighbour)
                        .expect("neighbour_at_direction only returns in-bounds cells");
                    if !visited.contains(neighbour_index) {
                        grid.make_open(cell, direction);
                        stack.push(Frame::unexplored(neighbour));
                    }
                }
            }
        }
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {

    use petgraph::algo::{connected_components, is_cyclic_undirected};
    use petgraph::graph::NodeIndex;
    use petgraph::{Graph, Undirected};
    use quickcheck::{quickcheck, TestResult};
    use rand::{SeedableRng, XorShiftRng};

    use super::*;
    use crate::cells::Direction;

    fn seeded_rng(seed: u32) -> XorShiftRng {
        XorShiftRng::from_seed([seed, 0x193a_6754, 0xa8a7_d469, 0x9783_0e05])
    }

    /// Model the open walls as an undirected petgraph graph so that the
    /// spanning tree shape can be checked independently of the wall
    /// matrix representation.
    fn passage_graph(maze: &WallGrid) -> Graph<(), (), Undirected> {
        let mut graph = Graph::<(), (), Undirected>::new_undirected();
        let nodes: Vec<NodeIndex> = maze.iter().map(|_| graph.add_node(())).collect();
        for cell in maze.iter() {
            for &dir in [Direction::Down, Direction::Right].iter() {
                if let Some(neighbour) = maze.neighbour_at_direction(cell, dir) {
                    if maze.is_open(cell, dir) {
                        let a = maze.cell_index(cell).unwrap();
                        let b = maze.cell_index(neighbour).unwrap();
                        graph.add_edge(nodes[a], nodes[b], ());
                    }
                }
            }
        }
        graph
    }

    fn is_perfect_maze(maze: &WallGrid, open_doors_count: usize) -> bool {
        let internal_open = maze.open_walls_count() - open_doors_count;
        let graph = passage_graph(maze);
        internal_open == maze.size() - 1 && graph.edge_count() == maze.size() - 1 &&
        connected_components(&graph) == 1 && !is_cyclic_undirected(&graph)
    }

    #[test]
    fn rejects_zero_dimensions() {
        let mut rng = seeded_rng(1);
        assert_eq!(recursive_backtracker(RowsCount(0), ColumnsCount(5), None, &mut rng),
                   Err(GenerationError::InvalidDimensions));
        assert_eq!(recursive_backtracker(RowsCount(5), ColumnsCount(0), None, &mut rng),
                   Err(GenerationError::InvalidDimensions));
    }

    #[test]
    fn rejects_out_of_range_doors() {
        let mut rng = seeded_rng(1);
        let doors = Some((ColumnIndex(3), ColumnIndex(0)));
        assert_eq!(recursive_backtracker(RowsCount(3), ColumnsCount(3), doors, &mut rng),
                   Err(GenerationError::InvalidEntrance));

        let doors = Some((ColumnIndex(0), ColumnIndex(3)));
        assert_eq!(recursive_backtracker(RowsCount(3), ColumnsCount(3), doors, &mut rng),
                   Err(GenerationError::InvalidExit));
    }

    #[test]
    fn generates_a_spanning_tree() {
        let mut rng = rand::weak_rng();
        for &(rows, columns) in [(1, 1), (1, 7), (2, 2), (3, 3), (5, 8), (12, 5)].iter() {
            let maze = recursive_backtracker(RowsCount(rows), ColumnsCount(columns), None,
                                             &mut rng)
                .expect("valid dimensions");
            assert!(is_perfect_maze(&maze, 0),
                    "not a perfect maze at {}x{}:\n{}",
                    rows,
                    columns,
                    maze);
        }
    }

    #[test]
    fn doors_are_opened_when_supplied() {
        let mut rng = seeded_rng(7);
        let doors = Some((ColumnIndex(0), ColumnIndex(2)));
        let maze = recursive_backtracker(RowsCount(3), ColumnsCount(3), doors, &mut rng)
            .expect("valid dimensions");

        assert!(maze.is_open(Cell::new(0, 0), Direction::Up));
        assert!(maze.is_open(Cell::new(2, 2), Direction::Down));
        assert!(is_perfect_maze(&maze, 2));
    }

    #[test]
    fn no_doors_leave_the_boundary_closed() {
        let mut rng = seeded_rng(3);
        let maze = recursive_backtracker(RowsCount(4), ColumnsCount(4), None, &mut rng)
            .expect("valid dimensions");
        for column in 0..4 {
            assert!(!maze.is_open(Cell::new(0, column), Direction::Up));
            assert!(!maze.is_open(Cell::new(3, column), Direction::Down));
        }
    }

    #[test]
    fn doors_open_on_one_row_maze() {
        // The doorways are grid markings, decoupled from the carved tree:
        // even a single row maze gets both of them.
        let mut rng = seeded_rng(11);
        let doors = Some((ColumnIndex(1), ColumnIndex(3)));
        let maze = recursive_backtracker(RowsCount(1), ColumnsCount(4), doors, &mut rng)
            .expect("valid dimensions");

        assert!(maze.is_open(Cell::new(0, 1), Direction::Up));
        assert!(maze.is_open(Cell::new(0, 3), Direction::Down));
        assert!(is_perfect_maze(&maze, 2));
    }

    #[test]
    fn same_seed_reproduces_the_same_maze() {
        let generate = || {
            let mut rng = seeded_rng(0xbeef);
            recursive_backtracker(RowsCount(3),
                                  ColumnsCount(3),
                                  Some((ColumnIndex(0), ColumnIndex(2))),
                                  &mut rng)
                .expect("valid dimensions")
        };
        let first = generate();
        let second = generate();
        assert_eq!(first, second);
        assert_eq!(format!("{}", first), format!("{}", second));
    }

    #[test]
    fn quickcheck_spanning_tree_property() {
        fn property(rows: u8, columns: u8, seed: u32) -> TestResult {
            let (rows, columns) = ((rows % 16) as usize, (columns % 16) as usize);
            if rows == 0 || columns == 0 {
                return TestResult::discard();
            }
            let mut rng = seeded_rng(seed);
            let maze = recursive_backtracker(RowsCount(rows), ColumnsCount(columns), None,
                                             &mut rng)
                .expect("valid dimensions");
            TestResult::from_bool(is_perfect_maze(&maze, 0))
        }
        quickcheck(property as fn(u8, u8, u32) -> TestResult);
    }
}
