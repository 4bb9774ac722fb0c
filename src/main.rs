//! tricell CLI: inspect, convert, repair and voxelize triangle meshes.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tricell::float_types::Real;

mod commands;

#[derive(Parser)]
#[command(name = "tricell")]
#[command(version, about = "Watertight triangle mesh analysis and grid voxelization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print counts, bounds, topology and volume of a mesh.
    Info {
        /// Mesh file (.obj or .ply).
        path: PathBuf,
    },

    /// Convert between mesh formats, chosen by file extension.
    Convert {
        input: PathBuf,
        /// Output file (.obj, .ply or .stl).
        output: PathBuf,
    },

    /// Weld duplicate vertices and prune unwanted components.
    Clean {
        input: PathBuf,
        output: PathBuf,

        /// Remove components enclosing at most this volume.
        #[arg(long)]
        min_volume: Option<Real>,

        /// Remove components made of at most this many triangles.
        #[arg(long)]
        min_triangles: Option<usize>,

        /// Remove inward-facing shells.
        #[arg(long)]
        remove_holes: bool,

        /// Merge duplicate vertices, hashed on a grid of this cell size.
        #[arg(long)]
        weld_dx: Option<Real>,
    },

    /// Count the grid cells enclosed by a mesh.
    Voxelize {
        path: PathBuf,

        /// Cell size.
        #[arg(long)]
        dx: Real,

        /// Grid dimensions; the grid is then anchored at the world origin
        /// instead of being fitted around the mesh.
        #[arg(long, num_args = 3, value_names = ["I", "J", "K"])]
        dims: Option<Vec<usize>>,

        /// Seed for the probe jitter.
        #[arg(long)]
        seed: Option<u64>,

        /// Count the cells crossed by the surface as inside.
        #[arg(long)]
        include_surface: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Info { path } => commands::info(&path),
        Commands::Convert { input, output } => commands::convert(&input, &output),
        Commands::Clean { input, output, min_volume, min_triangles, remove_holes, weld_dx } => {
            let options = commands::CleanOptions { min_volume, min_triangles, remove_holes, weld_dx };
            commands::clean(&input, &output, &options)
        }
        Commands::Voxelize { path, dx, dims, seed, include_surface } => {
            let dims = dims.and_then(|d| <[usize; 3]>::try_from(d).ok());
            commands::voxelize(&path, dx, dims, seed, include_surface)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
