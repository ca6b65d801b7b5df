use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use anyhow::{Context, Result};

use conf_forge::io::sdf;
use conf_forge::pipeline::{self, GenerateConfig};

use crate::cli::Cli;
use crate::display::{Context as DisplayContext, Progress};
use crate::util::path::with_suffix;

const TOTAL_STEPS: u8 = 3;

pub fn run(args: Cli, ctx: DisplayContext) -> Result<()> {
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| with_suffix(&args.input, "_conf.sdf"));

    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Reading molecule");
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open input file: {}", args.input.display()))?;
    let molecule = sdf::read(BufReader::new(file)).context("Failed to read molecule")?;
    progress.complete_step(
        "Reading molecule",
        &[&format!(
            "Parse SDF record ({} atoms, {} bonds)",
            molecule.atom_count(),
            molecule.bond_count()
        )],
    );

    if args.verbose {
        eprintln!("input:    {}", args.input.display());
        eprintln!("output:   {}", output_path.display());
        eprintln!("molecule: {}", molecule.molecular_formula());
    }

    progress.step("Generating conformers");
    let config = GenerateConfig {
        num_conformers: args.generation.num_conformers,
        max_iterations: args.generation.max_iterations,
        parallelism: args.generation.threads,
        base_seed: args.generation.seed,
        ..Default::default()
    };
    let ensemble = pipeline::generate(&molecule, &config).context("Conformer generation failed")?;

    let s = ensemble.summary;
    progress.complete_step(
        "Generating conformers",
        &[
            &format!("Add {} hydrogens", s.hydrogens_added),
            &format!("Embed {}/{} trials", s.embedded, s.requested),
            &format!("UFF: {} converged, {} dropped", s.uff_converged, s.uff_failed),
            &format!(
                "MMFF: {} converged, {} dropped",
                s.mmff_converged, s.mmff_failed
            ),
        ],
    );

    if ensemble.molecule.conformer_count() == 0 {
        eprintln!("warning: no conformers survived; writing an empty ensemble");
    }

    progress.step("Writing output");
    let out = File::create(&output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(out);
    sdf::write_ensemble(&mut writer, &ensemble.molecule).context("Failed to write ensemble")?;
    writer.flush().context("Failed to flush output")?;

    let file_name = output_path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    progress.complete_step(
        "Writing output",
        &[&format!(
            "Write SDF ({} records) → {}",
            ensemble.molecule.conformer_count(),
            file_name
        )],
    );

    if args.verbose {
        eprintln!("conformers: {}", ensemble.molecule.conformer_count());
    }

    progress.finish();
    Ok(())
}
