mod chart;
mod maidata;
mod note;
mod simai;
mod summary;

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;

use crate::maidata::MaidataFile;

#[derive(Parser)]
#[command(
    name = "maidata_export",
    about = "Convert Simai maidata.txt charts into per-difficulty JSON note lists"
)]
struct Cli {
    /// Song directory containing maidata.txt, named `<id>_<name>`
    input_path: PathBuf,

    /// Directory receiving one `<id>_<level>.json` per difficulty
    output_directory: PathBuf,

    /// Summary CSV appended with one row per exported difficulty
    csv_path: PathBuf,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.input_path.is_dir() {
        println!("Input path {} does not exist.", cli.input_path.display());
        std::process::exit(1);
    }

    // The song directory is named `<id>_<name>`; the leading token is the
    // chart ID used in output filenames and CSV rows.
    let Some(id) = chart_id(&cli.input_path) else {
        println!(
            "Could not parse a numeric chart ID from {}; expected a '<id>_<name>' directory.",
            cli.input_path.display()
        );
        std::process::exit(1);
    };

    let chart_path = cli.input_path.join("maidata.txt");
    if !chart_path.is_file() {
        println!("{} not found.", chart_path.display());
        std::process::exit(1);
    }

    let maidata = match MaidataFile::load(&chart_path) {
        Ok(file) => file,
        Err(e) => {
            println!("Failed to read {}: {e}", chart_path.display());
            std::process::exit(1);
        }
    };
    info!("loaded '{}' by '{}'", maidata.title, maidata.artist);

    let levels = maidata.available_levels();
    if levels.is_empty() {
        println!("No difficulty levels found in {}.", chart_path.display());
        std::process::exit(1);
    }

    for &level in &levels {
        let points = simai::serialize_fumen(&maidata.fumens[level], maidata.first);
        let document = chart::build_document(&points);
        let json = match chart::serialize_document(&document) {
            Ok(json) => json,
            Err(e) => {
                println!("Failed to serialize level {level}: {e}");
                std::process::exit(1);
            }
        };

        if let Err(e) = fs::create_dir_all(&cli.output_directory) {
            println!(
                "Failed to create output directory {}: {e}",
                cli.output_directory.display()
            );
            std::process::exit(1);
        }
        let output_path = cli.output_directory.join(format!("{id}_{level}.json"));
        if let Err(e) = fs::write(&output_path, &json) {
            println!("Failed to write {}: {e}", output_path.display());
            std::process::exit(1);
        }
        println!("Saved level {level} data to {}", output_path.display());

        // The JSON file is on disk before its CSV row; a summary failure is
        // reported and the remaining levels still run.
        let difficulty = maidata::difficulty_name(level);
        let level_value = maidata.level_value(level);
        if let Err(e) = summary::append_row(&cli.csv_path, id, difficulty, level_value) {
            println!("Failed to write CSV row for level {level}: {e}");
        }
    }
}

fn chart_id(input_path: &Path) -> Option<i32> {
    let name = input_path.file_name()?.to_str()?;
    name.split('_').next()?.parse().ok()
}
