use clap::{Parser as ClapParser, Subcommand};
use image::GenericImageView;
use indicatif::{ProgressBar, ProgressStyle};
use merger::config::Settings;
use merger::error::MergerError;
use merger::fragment::FragmentNaming;
use merger::gallery;
use merger::pipeline::{Pipeline, Stage};
use merger::report::{Counts, RunReport};
use merger::thumbnail::{PreviewResolver, PreviewSource};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, process};
use tracing::{error, info, warn};

#[derive(ClapParser, Debug)]
#[command(version, about)]
struct Cli {
    #[arg(short, long, default_value = "merger.toml")]
    config: PathBuf,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select, strip and merge every video in the configured directory
    Run {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },
    /// List merged videos, newest first
    Gallery {
        /// Resolve preview images, extracting missing ones
        #[arg(long)]
        previews: bool,
    },
    /// Save the streaming client's cache directory
    SetDir { path: PathBuf },
    /// Save the ffmpeg executable to use
    SetFfmpeg { path: PathBuf },
    /// Show the configuration file
    Config,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = common::logging::init(cli.verbose) {
        eprintln!("Unable to set a global logger instance: {}", e);
        process::exit(1);
    }

    let settings = match Settings::load(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run { json, quiet } => run(&settings, json, quiet),
        Command::Gallery { previews } => show_gallery(&settings, previews),
        Command::SetDir { path } => set_dir(settings, &cli.config, path),
        Command::SetFfmpeg { path } => set_ffmpeg(settings, &cli.config, path),
        Command::Config => show_config(&cli.config),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(settings: &Settings, json: bool, quiet: bool) -> Result<(), MergerError> {
    let pipeline = Pipeline::new(settings)?;
    info!("processing {}", pipeline.root().display());

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    };
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

    let report = pipeline.run_with_progress(
        |stage| {
            if stage == Stage::Remux {
                bar.set_style(style.clone());
            }
            bar.set_message(stage.to_string());
        },
        |progress| {
            bar.set_length(progress.total as u64);
            bar.set_position(progress.current as u64);
            bar.set_message(progress.message);
        },
    );
    bar.finish_and_clear();
    let report = report?;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => warn!("encode report: {}", e),
        }
    } else {
        print_summary(&report);
        print_cards(settings, pipeline.root(), false);
    }

    if report.has_failures() {
        return Err(MergerError::ToolError(format!(
            "{} unit(s) failed, fix them and run again",
            report.failures().count()
        )));
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("selection: {}", Counts::of(&report.selected));
    println!("stripping: {}", Counts::of(&report.stripped));
    println!("merging:   {}", Counts::of(&report.remuxed));
    for failure in report.failures() {
        if let merger::UnitStatus::Failed(reason) = &failure.status {
            println!("failed {}: {}", failure.path.display(), reason);
        }
    }
}

fn show_gallery(settings: &Settings, previews: bool) -> Result<(), MergerError> {
    let root = settings.video_dir()?;
    print_cards(settings, root, previews);
    Ok(())
}

fn print_cards(settings: &Settings, root: &Path, previews: bool) {
    let naming = FragmentNaming::new(settings.fragments.extension.clone());
    let cards = gallery::cards(root, &naming);
    if cards.is_empty() {
        println!("no merged videos in {}", root.display());
        return;
    }

    let resolver = PreviewResolver::new(settings);
    for card in cards {
        println!("{}  {}  {}", card.created_label(), card.name, card.output.display());
        if !previews {
            continue;
        }

        let preview = resolver.resolve(&card.output);
        let (width, height) = preview.image.dimensions();
        let source = match &preview.source {
            PreviewSource::Existing(path) => format!("existing {}", path.display()),
            PreviewSource::Extracted(path) => format!("extracted {}", path.display()),
            PreviewSource::Placeholder => "placeholder".to_string(),
        };
        println!("    preview {}x{} ({})", width, height, source);
    }
}

fn set_dir(mut settings: Settings, config: &Path, path: PathBuf) -> Result<(), MergerError> {
    if !path.is_dir() {
        return Err(MergerError::InputError(format!(
            "'{}' is not a directory",
            path.display()
        )));
    }

    settings.paths.video_dir = Some(path);
    settings.save(config)?;
    info!("video directory saved to {}", config.display());
    Ok(())
}

fn set_ffmpeg(mut settings: Settings, config: &Path, path: PathBuf) -> Result<(), MergerError> {
    // a bare name is looked up on PATH when the tool runs
    let is_bare = path.components().count() == 1;
    if !is_bare && !path.is_file() {
        return Err(MergerError::InputError(format!(
            "'{}' is not a file",
            path.display()
        )));
    }

    settings.paths.ffmpeg_path = path;
    settings.save(config)?;
    info!("ffmpeg path saved to {}", config.display());
    Ok(())
}

fn show_config(config: &Path) -> Result<(), MergerError> {
    match fs::read_to_string(config) {
        Ok(text) => {
            println!("# {}", config.display());
            print!("{}", text);
            Ok(())
        }
        Err(_) => {
            println!("# {} not found, defaults in use", config.display());
            let text = toml::to_string_pretty(&Settings::default())
                .map_err(|e| MergerError::ConfigError(e.to_string()))?;
            print!("{}", text);
            Ok(())
        }
    }
}
