//! Seamstress CLI - seam cutting and UV relaxation from the command line.
//!
//! Usage: seamstress <COMMAND> [OPTIONS] <INPUT>
//!
//! Run `seamstress --help` for available commands.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};

use seamstress::algo::{PathGraph, SeamPathFinder, SeamPathOptions};
use seamstress::io;
use seamstress::mesh::VertexId;
use seamstress::scene::Scene;
use seamstress::settings::EditorSettings;
use seamstress::solver::{flipped_faces, relaxation_factory, SolverOptions, SolverThreadController};

#[derive(Parser)]
#[command(name = "seamstress")]
#[command(author, version, about = "Seam cutting and UV relaxation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Cut a mesh along the shortest path between two vertices
    Cut {
        /// Input mesh file
        input: PathBuf,

        /// First cut endpoint
        #[arg(long)]
        from: usize,

        /// Second cut endpoint
        #[arg(long)]
        to: usize,

        /// Graph the path is searched on
        #[arg(short, long, value_enum, default_value = "auto")]
        graph: GraphChoice,

        /// Write the cut mesh with its UV layout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Relax the UV layout on the background solver
    Relax {
        /// Input mesh file
        input: PathBuf,

        /// First cut endpoint
        #[arg(long, requires = "to")]
        from: Option<usize>,

        /// Second cut endpoint
        #[arg(long, requires = "from")]
        to: Option<usize>,

        /// How long to let the solver run
        #[arg(short, long, default_value = "500")]
        millis: u64,

        /// Write the cut mesh with the relaxed layout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum GraphChoice {
    /// Quads when the file has them, triangles otherwise
    Auto,
    /// Triangle edges
    Triangles,
    /// Quad edges
    Quads,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,

        Commands::Cut {
            input,
            from,
            to,
            graph,
            output,
        } => cmd_cut(&input, from, to, graph, output.as_deref())?,

        Commands::Relax {
            input,
            from,
            to,
            millis,
            output,
            sequential,
        } => {
            let cut = from.zip(to);
            cmd_relax(&input, cut, millis, output.as_deref(), sequential)?;
        }
    }

    Ok(())
}

fn load_scene(input: &Path) -> Result<Scene, Box<dyn std::error::Error>> {
    let (mesh, quads) = io::load_with_quads(input)?;
    let mut scene = Scene::new(mesh)?;
    if let Some(quads) = quads {
        scene.attach_quads(quads)?;
    }
    Ok(scene)
}

fn cut_scene(
    scene: &mut Scene,
    from: usize,
    to: usize,
    graph: GraphChoice,
) -> Result<(), Box<dyn std::error::Error>> {
    let graph = match graph {
        GraphChoice::Auto if scene.adjacency().has_quads() => PathGraph::Quads,
        GraphChoice::Auto | GraphChoice::Triangles => PathGraph::Triangles,
        GraphChoice::Quads => PathGraph::Quads,
    };
    let start = Instant::now();
    let path = SeamPathFinder::new(scene.adjacency())
        .with_options(SeamPathOptions::default().with_graph(graph))
        .find_path(VertexId::new(from), VertexId::new(to))?;
    scene.confirm_cut(&path)?;
    println!(
        "Cut {} -> {}: {} edges in {:.2?}",
        from,
        to,
        path.len(),
        start.elapsed()
    );
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let scene = load_scene(input)?;
    let mesh = scene.mesh();
    let adjacency = scene.adjacency();

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", mesh.edges().len());
    println!("Boundary edges: {}", adjacency.boundary_edge_count());

    let (components, _) = adjacency.connected_components();
    println!("Connected components: {}", components);

    if let Some(quads) = scene.quads() {
        println!("Quad faces: {}", quads.num_faces());
    }

    let total_area: f64 = mesh.face_ids().map(|f| mesh.face_area(f)).sum();
    println!("Surface area: {:.6}", total_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    Ok(())
}

fn cmd_cut(
    input: &Path,
    from: usize,
    to: usize,
    graph: GraphChoice,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut scene = load_scene(input)?;
    cut_scene(&mut scene, from, to, graph)?;

    let cut = scene.cut_mesh();
    println!("Soup vertices: {}", scene.soup().num_vertices());
    println!("Cut boundary edges: {}", cut.boundary_edges().len());

    if let Some(output) = output {
        io::save_cut_mesh(cut, Some(scene.layout()), output)?;
        println!("Saved: {}", output.display());
    }
    Ok(())
}

fn cmd_relax(
    input: &Path,
    cut: Option<(usize, usize)>,
    millis: u64,
    output: Option<&Path>,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut scene = load_scene(input)?;
    if let Some((from, to)) = cut {
        cut_scene(&mut scene, from, to, GraphChoice::Auto)?;
    }

    let options = SolverOptions::default().with_parallel(!sequential);
    let solver = relaxation_factory()(scene.solver_problem(options.clone()))?;
    let mut controller = SolverThreadController::new(options);
    controller.set_solver(solver)?;
    controller.publish(scene.solver_constraints(&EditorSettings::default()));

    let start = Instant::now();
    controller.start()?;
    let deadline = Duration::from_millis(millis);
    while start.elapsed() < deadline && !controller.is_converged() {
        controller.poll()?;
        thread::sleep(Duration::from_millis(5));
    }
    controller.stop()?;

    let layout = controller.latest_layout();
    println!(
        "Iterations: {} in {:.2?}",
        controller.iterations(),
        start.elapsed()
    );
    if let Some(energy) = controller.last_energy() {
        println!("Energy: {:.6e}", energy);
    }
    println!("Converged: {}", controller.is_converged());
    println!("Flipped faces: {}", flipped_faces(&layout, scene.soup().faces()).len());

    if let Some(output) = output {
        io::save_cut_mesh(scene.cut_mesh(), Some(&*layout), output)?;
        println!("Saved: {}", output.display());
    }
    Ok(())
}
