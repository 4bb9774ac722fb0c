//! CLI command implementations.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;
use std::path::Path;
use tricell::float_types::Real;
use tricell::mesh::classify::ClassifyParams;
use tricell::{CellGrid, CellVolume, TriangleMesh};

type CommandResult = Result<(), Box<dyn Error>>;

pub struct CleanOptions {
    pub min_volume: Option<Real>,
    pub min_triangles: Option<usize>,
    pub remove_holes: bool,
    pub weld_dx: Option<Real>,
}

pub fn info(path: &Path) -> CommandResult {
    let mesh = TriangleMesh::load(path)?;
    println!("{}", path.display());
    println!("  vertices:   {}", mesh.num_vertices());
    println!("  triangles:  {}", mesh.num_triangles());
    println!("  colors:     {}", if mesh.has_colors() { "yes" } else { "no" });

    if let Some(bounds) = mesh.bounding_box() {
        let (lo, hi) = (bounds.mins, bounds.maxs);
        println!("  bounds:     [{}, {}, {}] .. [{}, {}, {}]", lo.x, lo.y, lo.z, hi.x, hi.y, hi.z);
    }

    let topology = mesh.analyze_topology();
    println!("  components: {}", topology.components);
    println!("  closed:     {}", topology.is_closed);
    println!("  oriented:   {}", topology.consistent_orientation);
    println!("  euler:      {}", topology.euler_characteristic);
    println!("  boundary edges:     {}", topology.boundary_edges);
    println!("  non-manifold edges: {}", topology.non_manifold_edges);
    println!("  isolated vertices:  {}", topology.isolated_vertices);

    for (n, polyhedron) in mesh.polyhedra().iter().enumerate() {
        let kind = if mesh.is_polyhedron_hole(polyhedron) { "hole" } else { "solid" };
        println!(
            "  component {n}: {} triangles, volume {:.6} ({kind})",
            polyhedron.len(),
            mesh.polyhedron_volume(polyhedron)
        );
    }

    let issues = mesh.validate();
    if !issues.is_empty() {
        println!("  {} validation issues, first: {}", issues.len(), issues[0]);
    }
    Ok(())
}

pub fn convert(input: &Path, output: &Path) -> CommandResult {
    let mesh = TriangleMesh::load(input)?;
    mesh.save(output)?;
    println!("{} -> {} ({} triangles)", input.display(), output.display(), mesh.num_triangles());
    Ok(())
}

pub fn clean(input: &Path, output: &Path, options: &CleanOptions) -> CommandResult {
    let mut mesh = TriangleMesh::load(input)?;

    if let Some(dx) = options.weld_dx {
        if let Some(bounds) = mesh.bounding_box() {
            let grid = CellGrid::covering(&bounds, dx)?;
            println!("welded {} duplicate vertices", mesh.remove_duplicate_vertices(&grid));
        }
    }
    let duplicates = mesh.remove_duplicate_triangles();
    if duplicates > 0 {
        println!("removed {duplicates} duplicate triangles");
    }
    if let Some(volume) = options.min_volume {
        println!("removed {} triangles of small-volume components", mesh.remove_minimum_volume_polyhedra(volume));
    }
    if let Some(count) = options.min_triangles {
        println!("removed {} triangles of small components", mesh.remove_minimum_triangle_count_polyhedra(count));
    }
    if options.remove_holes {
        println!("removed {} triangles of inverted components", mesh.remove_holes());
    }
    mesh.remove_extraneous_vertices();

    mesh.save(output)?;
    println!("{}: {} vertices, {} triangles", output.display(), mesh.num_vertices(), mesh.num_triangles());
    Ok(())
}

pub fn voxelize(
    path: &Path,
    dx: Real,
    dims: Option<[usize; 3]>,
    seed: Option<u64>,
    include_surface: bool,
) -> CommandResult {
    let mesh = TriangleMesh::load(path)?;
    let params = ClassifyParams::default().with_surface_cells(include_surface);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (grid, cells) = match dims {
        Some([ni, nj, nk]) => {
            let grid = CellGrid::new(ni, nj, nk, dx)?;
            let cells = mesh.cells_inside(&grid, &params, &mut rng);
            (grid, cells)
        }
        None => mesh.voxelize(dx, &params, &mut rng)?,
    };

    let [ni, nj, nk] = grid.dims();
    println!("grid {ni}x{nj}x{nk}, dx {}, origin {}", grid.dx, grid.origin);
    println!("inside cells: {} of {}", cells.len(), grid.cell_count());
    println!("cell volume:  {:.6}", cells.len() as Real * grid.dx.powi(3));
    println!("mesh volume:  {:.6}", mesh.volume());
    Ok(())
}
