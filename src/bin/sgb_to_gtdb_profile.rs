use clap::{Arg, Command};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use mpa_profile_tools::cli::{default_tables_dir, init_logging, spinner, ProfilePaths};
use mpa_profile_tools::error::Result;
use mpa_profile_tools::lookup::{parse_sgb_table, resolve_database_name, sgb_table_path, LATEST_DATABASE};
use mpa_profile_tools::sgb_to_gtdb_profile;

fn run() -> Result<()> {
    let matches = Command::new("sgb_to_gtdb_profile")
        .about("Converts an SGB-based MetaPhlAn profile into a GTDB profile")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("The input profile")
                .takes_value(true)
                .display_order(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("The output profile")
                .takes_value(true)
                .display_order(2),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .help("The MetaPhlAn database name or path to its .pkl file")
                .takes_value(true)
                .default_value(LATEST_DATABASE)
                .display_order(3),
        )
        .arg(
            Arg::new("merged_profiles")
                .long("merged_profiles")
                .help("The input was already merged with merge_metaphlan_tables.py")
                .display_order(4),
        )
        .arg(
            Arg::new("tables_dir")
                .long("tables_dir")
                .help("Directory containing mpa_latest and the *_SGB2GTDB.tsv tables")
                .takes_value(true)
                .display_order(5),
        )
        .get_matches();

    let t0 = Instant::now();
    log::info!("Start execution");

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

    let database = resolve_database_name(
        &tables_dir,
        matches.value_of("database").unwrap_or(LATEST_DATABASE),
    )?;
    log::info!("Using database {}", database);
    let sgb2gtdb = parse_sgb_table(sgb_table_path(&tables_dir, &database))?;

    let progress = spinner("blue", "Converting profile...");
    let result = sgb_to_gtdb_profile(&input, &output, merged, &sgb2gtdb);
    progress.finish_and_clear();
    let profile = result?;

    log::info!("Converted {} SGBs", profile.leaf_rows);
    log::info!("Finish execution ({:.2} seconds)", t0.elapsed().as_secs_f64());
    Ok(())
}

fn main() {
    init_logging();
    if let Err(e) = run() {
        log::error!("{e}");
        process::exit(1);
    }
}
