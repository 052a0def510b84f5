use clap::{Arg, Command};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use mpa_profile_tools::cli::{default_tables_dir, init_logging, spinner, ProfilePaths};
use mpa_profile_tools::error::Result;
use mpa_profile_tools::fix_relab_mpa4;
use mpa_profile_tools::lookup::{correction_table_path, parse_correction_table};

fn run() -> Result<()> {
    let matches = Command::new("fix_relab_mpa4")
        .about(
            "Fixes taxonomic inconsistencies of mpa_vOct22_CHOCOPhlAnSGB_202212 and \
             mpa_vJun23_CHOCOPhlAnSGB_202307 profiles and renormalizes their relative abundances",
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("The path to the input profile")
                .takes_value(true)
                .display_order(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("The path to the output profile")
                .takes_value(true)
                .display_order(2),
        )
        .arg(
            Arg::new("merged_profiles")
                .long("merged_profiles")
                .help("The input was already merged with merge_metaphlan_tables.py")
                .display_order(3),
        )
        .arg(
            Arg::new("tables_dir")
                .long("tables_dir")
                .help("Directory containing oct22_fix_tax.tsv (default: next to the executable)")
                .takes_value(true)
                .display_order(4),
        )
        .get_matches();

    let t0 = Instant::now();
    log::info!("Start fixing profile");

    let (input, output) = ProfilePaths {
        input: matches.value_of("input").map(PathBuf::from),
        output: matches.value_of("output").map(PathBuf::from),
    }
    .validate()?;
    let merged = matches.is_present("merged_profiles");
    let tables_dir = matches
        .value_of("tables_dir")
        .map(PathBuf::from)
        .unwrap_or_else(default_tables_dir);

    let corrections = parse_correction_table(correction_table_path(&tables_dir))?;

    let progress = spinner("green", "Fixing profile...");
    let result = fix_relab_mpa4(&input, &output, merged, &corrections);
    progress.finish_and_clear();
    let profile = result?;

    log::info!(
        "Fixed {} taxa of release {}",
        profile.leaf_rows,
        profile.release.as_deref().unwrap_or("unknown")
    );
    log::info!(
        "Finish fixing profile ({:.2} seconds)",
        t0.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() {
    init_logging();
    if let Err(e) = run() {
        log::error!("{e}");
        process::exit(1);
    }
}
