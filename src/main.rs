use clap::Parser;
use log::error;

use mf4_import::cli::Cli;
use mf4_import::config::Config;
use mf4_import::core::{
    ImportOptions, Importer, ImporterConfig, PipelineMode,
};
use mf4_import::error::ImportError;
use mf4_import::output::print_import_result;
use mf4_import::reader::CsvBusReader;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse().with_config(&Config::load());
    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<bool, ImportError> {
    let Some(raster) = cli.raster else {
        error!("no raster value supplied (use --raster or the config file)");
        return Ok(false);
    };

    let mut importer = Importer::new(ImporterConfig {
        filedirs: cli.filedir.clone(),
        targetdir: cli.targetdir.clone(),
        blacklist: cli.blacklist.clone(),
        modellib: None,
    })?;
    importer.collect_files();

    let mode = if cli.feature_engineering {
        PipelineMode::FeatureEngineering
    } else {
        PipelineMode::Default {
            join: cli.join_mode(),
        }
    };
    let mut options = ImportOptions::new(raster, mode);
    options.fi_signalnumber = cli.fi_signalnumber;
    options.fi_signalthreshold = cli.fi_signalthreshold;
    options.file_analysis = cli.file_analysis;

    let reader = CsvBusReader::new();
    match importer.import_data(&reader, &cli.targetname, &options)? {
        Some(result) => {
            print_import_result(&result, cli.preview_rows());
            Ok(true)
        }
        None => {
            println!("No result produced; see the log output for details.");
            Ok(false)
        }
    }
}
