use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use itertools::Itertools;
use std::io::Write;
use std::path::Path;

use crate::cells::{Cell, Direction};
use crate::traversals::{CellState, Snapshot};
use crate::walls::WallGrid;

const WALL_COLOUR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PASSAGE_COLOUR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const UNVISITED_COLOUR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PENDING_COLOUR: Rgba<u8> = Rgba([146, 146, 183, 255]);
const VISITED_COLOUR: Rgba<u8> = Rgba([30, 30, 153, 255]);

/// How to rasterise a maze: pixel sizes of the cell interiors and the
/// wall lines, the colour scheme, and the per frame delay used when
/// snapshots are encoded into an animation.
#[derive(Debug, Copy, Clone)]
pub struct RenderOptions {
    pub cell_pixels: u32,
    pub wall_pixels: u32,
    pub wall_colour: Rgba<u8>,
    pub passage_colour: Rgba<u8>,
    pub unvisited_colour: Rgba<u8>,
    pub pending_colour: Rgba<u8>,
    pub visited_colour: Rgba<u8>,
    pub frame_delay_ms: u32,
}

pub struct RenderOptionsBuilder {
    options: RenderOptions,
}

impl RenderOptionsBuilder {
    pub fn new() -> RenderOptionsBuilder {
        RenderOptionsBuilder {
            options: RenderOptions {
                cell_pixels: 3,
                wall_pixels: 1,
                wall_colour: WALL_COLOUR,
                passage_colour: PASSAGE_COLOUR,
                unvisited_colour: UNVISITED_COLOUR,
                pending_colour: PENDING_COLOUR,
                visited_colour: VISITED_COLOUR,
                frame_delay_ms: 20,
            },
        }
    }

    pub fn cell_pixels(mut self, pixels: u32) -> RenderOptionsBuilder {
        self.options.cell_pixels = pixels;
        self
    }

    pub fn wall_pixels(mut self, pixels: u32) -> RenderOptionsBuilder {
        self.options.wall_pixels = pixels;
        self
    }

    pub fn wall_colour(mut self, colour: Rgba<u8>) -> RenderOptionsBuilder {
        self.options.wall_colour = colour;
        self
    }

    pub fn passage_colour(mut self, colour: Rgba<u8>) -> RenderOptionsBuilder {
        self.options.passage_colour = colour;
        self
    }

    pub fn frame_delay_ms(mut self, delay: u32) -> RenderOptionsBuilder {
        self.options.frame_delay_ms = delay;
        self
    }

    pub fn build(self) -> RenderOptions {
        self.options
    }
}

/// Rasterise the maze into a pixel buffer.
///
/// Cells become `cell_pixels` square boxes separated by `wall_pixels`
/// wide lines; closed walls and every corner joint take the wall colour,
/// open wall segments take the colour of the adjoining cell so passages
/// read as continuous. With a snapshot the boxes are coloured by search
/// state instead of the flat passage colour.
pub fn render_image(grid: &WallGrid,
                    snapshot: Option<&Snapshot>,
                    options: &RenderOptions)
                    -> RgbaImage {
    let rows = grid.rows() as u32;
    let columns = grid.columns() as u32;
    let span = options.cell_pixels + options.wall_pixels;
    let width = columns * span + options.wall_pixels;
    let height = rows * span + options.wall_pixels;

    let cell_colour = |row: u32, column: u32| -> Rgba<u8> {
        match snapshot.and_then(|s| s.state(Cell::new(row, column))) {
            Some(CellState::Unvisited) => options.unvisited_colour,
            Some(CellState::Pending) => options.pending_colour,
            Some(CellState::Visited) => options.visited_colour,
            None => options.passage_colour,
        }
    };
    let box_start = |index: u32| options.wall_pixels + index * span;

    let mut image = RgbaImage::from_pixel(width, height, options.wall_colour);

    for (row, column) in (0..rows).cartesian_product(0..columns) {
        fill_rect(&mut image,
                  box_start(column),
                  box_start(row),
                  options.cell_pixels,
                  options.cell_pixels,
                  cell_colour(row, column));
    }

    // Horizontal wall segments, boundary rows included.
    for (row, column) in (0..=rows).cartesian_product(0..columns) {
        let open = if row < rows {
            grid.is_open(Cell::new(row, column), Direction::Up)
        } else {
            grid.is_open(Cell::new(rows - 1, column), Direction::Down)
        };
        if open {
            let colour = cell_colour(if row < rows { row } else { row - 1 }, column);
            fill_rect(&mut image,
                      box_start(column),
                      row * span,
                      options.cell_pixels,
                      options.wall_pixels,
                      colour);
        }
    }

    // Vertical wall segments, boundary columns included.
    for (row, column) in (0..rows).cartesian_product(0..=columns) {
        let open = if column < columns {
            grid.is_open(Cell::new(row, column), Direction::Left)
        } else {
            grid.is_open(Cell::new(row, columns - 1), Direction::Right)
        };
        if open {
            let colour = cell_colour(row, if column < columns { column } else { column - 1 });
            fill_rect(&mut image,
                      column * span,
                      box_start(row),
                      options.wall_pixels,
                      options.cell_pixels,
                      colour);
        }
    }

    image
}

/// Render one frame and save it as a PNG.
pub fn save_png<P: AsRef<Path>>(path: P,
                                grid: &WallGrid,
                                snapshot: Option<&Snapshot>,
                                options: &RenderOptions)
                                -> image::ImageResult<()> {
    render_image(grid, snapshot, options).save(path)
}

/// Stream a search's snapshot sequence into an animated GIF.
///
/// Snapshots are pulled from `frames` one at a time and each rendered
/// frame is encoded as soon as it is drawn, so the full sequence is never
/// held in memory - stopping early just drops the iterator.
pub fn write_gif_animation<W, I>(writer: W,
                                 grid: &WallGrid,
                                 frames: I,
                                 options: &RenderOptions)
                                 -> image::ImageResult<()>
    where W: Write,
          I: IntoIterator<Item = Snapshot>
{
    let mut encoder = GifEncoder::new(writer);
    encoder.set_repeat(Repeat::Infinite)?;

    for snapshot in frames {
        let rendered = render_image(grid, Some(&snapshot), options);
        let delay = Delay::from_numer_denom_ms(options.frame_delay_ms, 1);
        encoder.encode_frame(Frame::from_parts(rendered, 0, 0, delay))?;
    }
    Ok(())
}

fn fill_rect(image: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, colour: Rgba<u8>) {
    for (px, py) in (x..x + width).cartesian_product(y..y + height) {
        image.put_pixel(px, py, colour);
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::cells::Direction;
    use crate::traversals::BreadthFirstFrames;
    use crate::units::{ColumnIndex, ColumnsCount, RowsCount};

    #[test]
    fn builder_defaults() {
        let options = RenderOptionsBuilder::new().build();
        assert_eq!(options.cell_pixels, 3);
        assert_eq!(options.wall_pixels, 1);
        assert_eq!(options.frame_delay_ms, 20);
        assert_eq!(options.wall_colour, Rgba([0, 0, 0, 255]));
        assert_eq!(options.passage_colour, Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn image_dimensions_follow_the_grid() {
        let grid = WallGrid::new(RowsCount(4), ColumnsCount(3));
        let options = RenderOptionsBuilder::new().build();
        let image = render_image(&grid, None, &options);
        // columns * (3 + 1) + 1 wide, rows * (3 + 1) + 1 high
        assert_eq!(image.dimensions(), (13, 17));
    }

    #[test]
    fn closed_cell_renders_walls_and_interior() {
        let grid = WallGrid::new(RowsCount(1), ColumnsCount(1));
        let options = RenderOptionsBuilder::new().build();
        let image = render_image(&grid, None, &options);

        // Corner joints and closed edges are wall coloured.
        assert_eq!(*image.get_pixel(0, 0), options.wall_colour);
        assert_eq!(*image.get_pixel(4, 4), options.wall_colour);
        assert_eq!(*image.get_pixel(2, 0), options.wall_colour);
        assert_eq!(*image.get_pixel(0, 2), options.wall_colour);
        // The interior is passage coloured.
        assert_eq!(*image.get_pixel(2, 2), options.passage_colour);
    }

    #[test]
    fn doorways_show_as_gaps_in_the_boundary() {
        let mut grid = WallGrid::new(RowsCount(1), ColumnsCount(2));
        grid.open_entrance(ColumnIndex(0));
        grid.open_exit(ColumnIndex(1));
        let options = RenderOptionsBuilder::new().build();
        let image = render_image(&grid, None, &options);

        // Entrance gap above cell (0,0), exit gap below cell (0,1).
        assert_eq!(*image.get_pixel(2, 0), options.passage_colour);
        assert_eq!(*image.get_pixel(6, 4), options.passage_colour);
        // The rest of the boundary stays wall coloured.
        assert_eq!(*image.get_pixel(6, 0), options.wall_colour);
        assert_eq!(*image.get_pixel(2, 4), options.wall_colour);
        // Corner joints never open.
        assert_eq!(*image.get_pixel(0, 0), options.wall_colour);
        assert_eq!(*image.get_pixel(4, 0), options.wall_colour);
    }

    #[test]
    fn open_internal_wall_takes_the_cell_colour() {
        let mut grid = WallGrid::new(RowsCount(1), ColumnsCount(2));
        grid.make_open(Cell::new(0, 0), Direction::Right);
        let options = RenderOptionsBuilder::new().build();
        let image = render_image(&grid, None, &options);
        // The shared wall segment between the two cells is carved out.
        assert_eq!(*image.get_pixel(4, 2), options.passage_colour);
    }

    #[test]
    fn snapshot_states_colour_the_cells() {
        let grid = WallGrid::new(RowsCount(1), ColumnsCount(1));
        let options = RenderOptionsBuilder::new().build();

        let frames: Vec<_> = BreadthFirstFrames::new(&grid, ColumnIndex(0))
            .expect("valid start")
            .collect();
        let initial = render_image(&grid, Some(&frames[0]), &options);
        assert_eq!(*initial.get_pixel(2, 2), options.unvisited_colour);
        let done = render_image(&grid, Some(&frames[1]), &options);
        assert_eq!(*done.get_pixel(2, 2), options.visited_colour);
    }

    #[test]
    fn gif_animation_writes_every_frame() {
        let mut grid = WallGrid::new(RowsCount(1), ColumnsCount(2));
        grid.make_open(Cell::new(0, 0), Direction::Right);
        let options = RenderOptionsBuilder::new().build();

        let frames = BreadthFirstFrames::new(&grid, ColumnIndex(0)).expect("valid start");
        let mut buffer = Vec::new();
        write_gif_animation(&mut buffer, &grid, frames, &options).expect("gif encoding");

        assert_eq!(&buffer[0..6], b"GIF89a");
        assert!(buffer.len() > 6);
    }
}
