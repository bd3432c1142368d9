use docopt::Docopt;
use mazeviz::{
    generators,
    renderers::{self, RenderOptionsBuilder},
    traversals::{BreadthFirstFrames, DepthFirstFrames},
    units::{ColumnIndex, ColumnsCount, RowsCount},
};
use rand::{Rng, SeedableRng, XorShiftRng};
use serde_derive::Deserialize;
use std::{
    fs::File,
    io,
    io::prelude::*,
};

const USAGE: &str = "Mazeviz

Usage:
    mazeviz_driver -h | --help
    mazeviz_driver [(--grid-size=<n>|[--grid-width=<w> --grid-height=<h>])] [--seed=<s>] [--entrance-col=<e>] [--exit-col=<x>] [--text-out=<path>] [--image-out=<path>] [--cell-pixels=<n>] [--wall-pixels=<n>]
    mazeviz_driver animate (bfs|dfs) [(--grid-size=<n>|[--grid-width=<w> --grid-height=<h>])] [--seed=<s>] [--entrance-col=<e>] [--exit-col=<x>] [--start-col=<c>] [--gif-out=<path>] [--cell-pixels=<n>] [--wall-pixels=<n>] [--frame-delay=<ms>]

Options:
    -h --help            Show this screen.
    --grid-size=<n>      Generate an n * n maze.
    --grid-width=<w>     The maze width in a w*h maze [default: 40].
    --grid-height=<h>    The maze height in a w*h maze [default: 40].
    --seed=<s>           Seed for the random generator, making the maze reproducible.
    --entrance-col=<e>   Column of the opened entrance wall on the top boundary. Picked randomly when only an exit is given.
    --exit-col=<x>       Column of the opened exit wall on the bottom boundary. Picked randomly when only an entrance is given.
    --start-col=<c>      Top row column the animated search starts from. Defaults to the entrance column if one was opened, else a random column.
    --text-out=<path>    Output file path for a textual rendering of the maze.
    --image-out=<path>   Output file path for a PNG rendering of the maze.
    --gif-out=<path>     Output file path for the search animation [default: maze.gif].
    --cell-pixels=<n>    Pixel width of one cell interior [default: 3].
    --wall-pixels=<n>    Pixel width of one wall line [default: 1].
    --frame-delay=<ms>   Delay between animation frames in milliseconds [default: 20].
";

#[derive(Debug, Deserialize)]
struct MazeArgs {
    flag_grid_size: Option<usize>,
    flag_grid_width: usize,
    flag_grid_height: usize,
    flag_seed: Option<u32>,
    flag_entrance_col: Option<usize>,
    flag_exit_col: Option<usize>,
    flag_start_col: Option<usize>,
    cmd_animate: bool,
    cmd_bfs: bool,
    cmd_dfs: bool,
    flag_text_out: String,
    flag_image_out: String,
    flag_gif_out: String,
    flag_cell_pixels: u32,
    flag_wall_pixels: u32,
    flag_frame_delay: u32,
}

mod errors {
    // Create the Error, ErrorKind, ResultExt, and Result types.
    use error_chain::*;
    error_chain! {

        foreign_links {
            DocOptFailure(::docopt::Error);
            ImageWriteError(::image::ImageError);
            Io(::std::io::Error);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {

    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;

    let (width, height) = if let Some(square_grid_size) = args.flag_grid_size {
        (square_grid_size, square_grid_size)
    } else {
        (args.flag_grid_width, args.flag_grid_height)
    };

    let mut rng = match args.flag_seed {
        Some(seed) => seeded_rng(seed),
        None => rand::weak_rng(),
    };

    let doors = doors_from_args(&args, width, &mut rng);
    let maze = generators::recursive_backtracker(RowsCount(height),
                                                 ColumnsCount(width),
                                                 doors,
                                                 &mut rng)
        .chain_err(|| "maze generation failed")?;

    let render_options = RenderOptionsBuilder::new()
        .cell_pixels(args.flag_cell_pixels)
        .wall_pixels(args.flag_wall_pixels)
        .frame_delay_ms(args.flag_frame_delay)
        .build();

    if !args.flag_text_out.is_empty() {
        write_text_to_file(&format!("{}", maze), &args.flag_text_out)
            .chain_err(|| format!("Failed to write maze to text file {}", args.flag_text_out))?;
    } else if !args.cmd_animate && args.flag_image_out.is_empty() && width <= 50 && height <= 50 {
        println!("{}", maze);
    }

    if !args.flag_image_out.is_empty() {
        renderers::save_png(&args.flag_image_out, &maze, None, &render_options)
            .chain_err(|| format!("Failed to write maze image {}", args.flag_image_out))?;
    }

    if args.cmd_animate {
        let start_column = args.flag_start_col
            .or_else(|| doors.map(|(ColumnIndex(entrance), _)| entrance))
            .unwrap_or_else(|| rng.gen::<usize>() % width);

        let file = File::create(&args.flag_gif_out)?;
        let writer = io::BufWriter::new(file);

        if args.cmd_bfs {
            let frames = BreadthFirstFrames::new(&maze, ColumnIndex(start_column))
                .chain_err(|| "invalid traversal start column")?;
            renderers::write_gif_animation(writer, &maze, frames, &render_options)
                .chain_err(|| format!("Failed to write animation {}", args.flag_gif_out))?;
        } else if args.cmd_dfs {
            let frames = DepthFirstFrames::new(&maze, ColumnIndex(start_column))
                .chain_err(|| "invalid traversal start column")?;
            renderers::write_gif_animation(writer, &maze, frames, &render_options)
                .chain_err(|| format!("Failed to write animation {}", args.flag_gif_out))?;
        }
    }

    Ok(())
}

/// A maze only gets boundary doorways when the command line asks for
/// them. Given just one of the two columns, the other is drawn randomly,
/// as the entrance and exit are always opened as a pair.
fn doors_from_args(args: &MazeArgs,
                   columns: usize,
                   rng: &mut XorShiftRng)
                   -> Option<(ColumnIndex, ColumnIndex)> {
    if columns == 0 {
        // Let the generator report the dimension error.
        return None;
    }
    match (args.flag_entrance_col, args.flag_exit_col) {
        (None, None) => None,
        (entrance, exit) => {
            let entrance = entrance.unwrap_or_else(|| rng.gen::<usize>() % columns);
            let exit = exit.unwrap_or_else(|| rng.gen::<usize>() % columns);
            Some((ColumnIndex(entrance), ColumnIndex(exit)))
        }
    }
}

fn seeded_rng(seed: u32) -> XorShiftRng {
    // Fill the remaining state words with fixed non-zero values so any
    // u32 seed is usable.
    XorShiftRng::from_seed([seed, 0x193a_6754, 0xa8a7_d469, 0x9783_0e05])
}

fn write_text_to_file(data: &str, file_name: &str) -> io::Result<()> {
    let mut f = File::create(file_name)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}
