//! MAC collection exporter CLI
//!
//! Scans a directory of mp3/flac files and writes a `.col` collection file.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use mac_collection::{
    build_collection_with, export_collection, CollectionSummary, ExportStamp, NoopObserver,
    ScanConfig, ScanError, SymphoniaExtractor, VolumeLayout,
};

const ABOUT: &str = r#"
MAC collection exporter - writes an audio folder tree as a MAC .col file

Examples:
  mac_collection export -r /music -o music.col             one volume per top-level directory
  mac_collection export -r /music -o music.col --root-as-volume   root is the volume, as MAC catalogues a disk
  mac_collection export -r /music -o music.col --json      JSON summary
  mac_collection show -r /music                            print the tree only
"#;

/// Audio collection scanner and MAC exporter
#[derive(Parser)]
#[command(name = "mac_collection")]
#[command(author, version, about = ABOUT, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SourceArgs {
    /// Root directory of the audio collection
    #[arg(short = 'r', long)]
    root: PathBuf,

    /// Use the root itself as the only volume
    ///
    /// Every directory below the root then becomes a folder. This gives the
    /// folder counts MAC itself records when it catalogues a single disk.
    #[arg(long)]
    root_as_volume: bool,

    /// Name of the collection node
    #[arg(long, default_value = "AudioCollection")]
    name: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the collection and write the export file
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Export file to create (must not exist)
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Write today's date as the last change date
        #[arg(long)]
        stamp_today: bool,

        /// Emit JSON progress lines on stderr
        #[arg(long)]
        progress: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the collection and print its tree without writing anything
    Show {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn config_for(source: SourceArgs) -> ScanConfig {
    let layout = if source.root_as_volume {
        VolumeLayout::RootAsVolume
    } else {
        VolumeLayout::TopLevelDirectories
    };
    ScanConfig::builder()
        .root(source.root)
        .layout(layout)
        .collection_name(source.name)
        .build()
}

fn print_summary(summary: &CollectionSummary, json: bool) -> Result<(), ScanError> {
    if json {
        let text = serde_json::to_string_pretty(summary)
            .map_err(|e| ScanError::io_error(None, e.to_string()))?;
        println!("{}", text);
    } else {
        println!("Export completed:");
        println!("  Collection: {}", summary.name);
        println!("  Volumes: {}", summary.volumes);
        println!("  Folders: {}", summary.folders);
        println!("  Files: {}", summary.files);
        println!("  Size: {} KB", summary.size_kb());
        println!("  Duration: {} s", summary.duration.floor() as u64);
    }
    Ok(())
}

fn run(command: Commands) -> Result<(), ScanError> {
    let extractor = SymphoniaExtractor::new();
    match command {
        Commands::Export {
            source,
            output,
            stamp_today,
            progress,
            json,
        } => {
            let stamp = if stamp_today {
                ExportStamp::today()
            } else {
                ExportStamp::default()
            };
            let mut config = config_for(source);
            config.output = Some(output);
            config.stamp = stamp;
            config.show_progress = progress;

            info!("Root: {:?}", config.root);
            info!("Output: {:?}", config.output);
            info!("Layout: {:?}", config.layout);

            let summary = export_collection(&config, &extractor)?;
            print_summary(&summary, json)
        }
        Commands::Show { source } => {
            let config = config_for(source);
            let tree = build_collection_with(&config, &extractor, &NoopObserver)?;
            print!("{}", tree.outline());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("{}", ABOUT);
        println!("Use 'mac_collection export -h' for the export options");
        return ExitCode::SUCCESS;
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
