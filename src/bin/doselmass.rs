//! Command line tool to compute dosel masses from a scene description
//!
//! Reads a JSON scene, overlays a dosel grid on one of its volumes, and
//! writes the reconstructed mass of every dosel to a MetaImage.
//!
//! # Usage
//!
//! ```text
//! Usage: doselmass <scene> -r <nx> <ny> <nz> -s <dx> <dy> <dz> [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! By default the dosel grid is attached to the `world` volume, centred on its
//! origin, and the masses are written to `mass.mhd`/`mass.raw`.
//!
//! ```bash
//! # 10x10x10 dosels of 2x2x2 in the world volume
//! doselmass scene.json -r 10 10 10 -s 2 2 2
//! ```
//!
//! ### Attach to another volume
//!
//! The dosel grid is expressed in the frame of the volume it is attached to.
//! If that volume holds a single voxelised daughter, the fast voxel
//! resampling is used instead of boolean solid operations.
//!
//! ```bash
//! doselmass scene.json -r 64 64 32 -s 4 4 4 --volume patient
//! ```
//!
//! ### Move the grid
//!
//! ```bash
//! doselmass scene.json -r 10 10 10 -s 2 2 2 --translation 0 0 5
//! ```
//!
//! ### Use precomputed masses
//!
//! An existing mass image over the same grid skips the reconstruction
//! entirely. This is mostly useful for checking an image against a scene.
//!
//! ```bash
//! doselmass scene.json -r 10 10 10 -s 2 2 2 --mass previous.mhd
//! ```
//!
//! ### Sub-volume breakdown
//!
//! For geometries built from nested solids, the volume and mass of every
//! named sub-volume inside each dosel may be written to JSON.
//!
//! ```bash
//! # Writes 'mass.mhd', 'mass.raw', and 'mass.json'
//! doselmass scene.json -r 10 10 10 -s 2 2 2 --breakdown
//! ```

// standard libraries
use std::fs::File;
use std::io::BufWriter;

// crate modules
use doselmass::grid::Grid;
use doselmass::image::Image;
use doselmass::mass::DoselResult;
use doselmass::utils::*;
use doselmass::{read_mass_image, read_scene, VoxelizedMass};

// external crates
use anyhow::{Context, Result};
use clap::{arg, Parser};
use log::*;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make Info the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet);

    // Read the geometry and build the dosel grid
    info!("Reading {}", &cli.scene);
    let scene = read_scene(&cli.scene).with_context(|| f!("Could not read {}", cli.scene))?;
    let grid = dosel_grid(&cli);

    let mass_image = match &cli.mass {
        Some(path) => {
            info!("Reading external masses from {path}");
            Some(read_mass_image(path).with_context(|| f!("Could not read {path}"))?)
        }
        None => None,
    };

    // Set up the reconstruction, any inconsistency is fatal here
    let mut mass =
        VoxelizedMass::initialize(&scene, &cli.volume, grid.clone(), mass_image.as_ref())?;
    if cli.quiet || cli.verbose > 1 {
        mass.disable_progress();
    }
    info!("Using {} reconstruction on {}", mass.mode(), cli.volume);

    // Compute everything and write the image
    let mut image = Image::new(grid);
    mass.update_image(&mut image)?;

    let path = f!("{}.mhd", cli.output);
    info!("Writing {path}");
    image.write_metaimage(&path)?;

    if cli.breakdown {
        write_breakdown(&mut mass, &cli)?;
    }

    if !cli.quiet {
        print_summary(&mut mass)?;
    }

    Ok(())
}

/// Compute dosel masses of a scene
///
/// Overlays a regular dosel grid on a volume of a JSON scene description and
/// reconstructs the mass of material inside every dosel. Results are written
/// as a MetaImage.
///
/// Examples
/// --------
///
///  Dosels over the world volume
///     $ doselmass scene.json -r 10 10 10 -s 2 2 2
///
///  Dosels over a specific volume, moved along z
///     $ doselmass scene.json -r 10 10 10 -s 2 2 2 \
///             --volume phantom --translation 0 0 5
///
///  Check an existing mass image against the scene
///     $ doselmass scene.json -r 10 10 10 -s 2 2 2 --mass old.mhd
///
///  Sub-volume breakdown as JSON
///     $ doselmass scene.json -r 10 10 10 -s 2 2 2 --breakdown
///
/// Notes
/// -----
///
/// Units are whatever the scene uses, as long as density x volume is a mass.
/// The dosel grid is expressed in the frame of the volume it is attached to.
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help(
        "Typical use: doselmass scene.json -r 10 10 10 -s 2 2 2\n\nNOTE: --help shows more detail and examples"
    ),
    term_width(70),
    hide_possible_values(true),
    override_usage("doselmass <scene> -r <nx> <ny> <nz> -s <dx> <dy> <dz> [options]")
)]
struct Cli {
    // * Positional
    /// Path to the JSON scene description
    #[arg(name = "scene")]
    scene: String,

    /// Number of dosels along x, y, and z
    #[arg(help_heading("Grid options"))]
    #[arg(short, long, required = true, num_args = 3)]
    #[arg(value_names = ["nx", "ny", "nz"])]
    resolution: Vec<usize>,

    /// Size of a dosel along x, y, and z
    #[arg(help_heading("Grid options"))]
    #[arg(short, long, required = true, num_args = 3, allow_negative_numbers = true)]
    #[arg(value_names = ["dx", "dy", "dz"])]
    size: Vec<f64>,

    /// Centre of the grid in the attached volume
    ///
    /// Defaults to the origin of the volume the grid is attached to.
    #[arg(help_heading("Grid options"))]
    #[arg(short, long, num_args = 3, allow_negative_numbers = true)]
    #[arg(value_names = ["x", "y", "z"])]
    translation: Option<Vec<f64>>,

    /// Volume the dosel grid is attached to
    #[arg(help_heading("Grid options"))]
    #[arg(long, default_value = "world")]
    #[arg(value_name = "name")]
    volume: String,

    /// Precomputed mass image (.mhd) to use instead of the geometry
    ///
    /// Must have the same resolution and voxel volume as the dosel grid.
    #[arg(help_heading("Mass options"))]
    #[arg(short, long)]
    #[arg(value_name = "path")]
    mass: Option<String>,

    /// Write the per-dosel sub-volume breakdown to JSON
    ///
    /// Only available for geometries built from nested solids.
    #[arg(help_heading("Mass options"))]
    #[arg(short, long)]
    breakdown: bool,

    /// Name of output files (excl. extension)
    ///
    /// Defaults to `mass`, and will automatically set the relevant extensions.
    #[arg(help_heading("Mass options"))]
    #[arg(short, long, default_value = "mass")]
    #[arg(value_name = "path")]
    output: String,

    // * Flags
    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG (-v)
    /// or TRACE (-vv). Errors and Warnings are always logged unless in quiet
    /// (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,
}

/// Sets up logging at runtime to allow for multiple verbosity levels
#[doc(hidden)]
fn logging_init(verbosity: usize, quiet: bool) {
    stderrlog::new()
        .modules(vec![
            module_path!(),
            "doselmass::grid",
            "doselmass::mass",
            "doselmass::image",
            "doselmass::readers",
        ])
        .quiet(quiet)
        .verbosity(verbosity)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .unwrap();
}

/// Creates a banner for the command line
#[doc(hidden)]
fn banner() -> String {
    let mut s = f!("{:-<1$}\n", "", 70);
    s += &f!("{:^70}\n", "Doselmass :: Dosel Mass Reconstruction");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[doc(hidden)]
/// Dosel grid from the command line options, clap guarantees three values
fn dosel_grid(cli: &Cli) -> Grid {
    let resolution = [cli.resolution[0], cli.resolution[1], cli.resolution[2]];
    let size = [cli.size[0], cli.size[1], cli.size[2]];
    let grid = Grid::new(resolution, size);

    match &cli.translation {
        Some(t) => grid.with_translation([t[0], t[1], t[2]]),
        None => grid,
    }
}

#[doc(hidden)]
/// Write every dosel breakdown to json
fn write_breakdown(mass: &mut VoxelizedMass, cli: &Cli) -> Result<()> {
    if mass.is_external() {
        warn!("No breakdown exists for external masses, skipping");
        return Ok(());
    }

    let dosels = (0..mass.number_of_dosels())
        .map(|i| mass.dosel(i).cloned())
        .collect::<doselmass::Result<Vec<DoselResult>>>()?;

    let output = f!("{}.json", cli.output);
    debug!("Writing breakdown to {output}");
    let writer = BufWriter::new(File::create(&output)?);
    Ok(serde_json::to_writer_pretty(writer, &dosels)?)
}

#[doc(hidden)]
/// Write summary to the terminal
fn print_summary(mass: &mut VoxelizedMass) -> Result<()> {
    let grid = mass.dosel_grid().clone();
    let mut s = "Summary of dosel masses\n".to_string();
    s += &f!("mode    : {}\n", mass.mode());
    s += &f!(
        "dosels  : {} ({}x{}x{})\n",
        grid.number_of_values(),
        grid.resolution[0],
        grid.resolution[1],
        grid.resolution[2]
    );
    s += &f!("volume  : {} per dosel\n", mass.total_volume().sci(5, 2));
    s += &f!("mass    : {}", mass.total_mass()?.sci(5, 2));
    println!("{s}");
    Ok(())
}
