// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use toass::app_config::{self, Config, InsertConfig, LogLevel, ShortReplyPolicy, SubtitleConfigs};
use toass::app_controller::{BatchOptions, Controller};
use toass::providers::{Retrying, TextConverter, ZhConvert};
use toass::subtitle::Color;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert subtitle files to styled ASS (default command)
    Convert(ConvertArgs),

    /// Manage the insert configs stored in sub.json
    Inserts {
        #[command(subcommand)]
        action: InsertAction,
    },

    /// Generate shell completions for toass
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum InsertAction {
    /// List configured insert configs
    List,

    /// Add an insert config
    Add {
        /// Unique name
        name: String,

        /// Start time, HH:MM:SS.mmm
        #[arg(long, default_value = "00:00:00.000")]
        start: String,

        /// End time, HH:MM:SS.mmm
        #[arg(long, default_value = "00:00:05.000")]
        end: String,

        /// Event text, written verbatim (override tags allowed)
        #[arg(long)]
        text: String,

        /// Replace an existing config with the same name
        #[arg(long)]
        replace: bool,
    },

    /// Remove an insert config
    Remove {
        /// Name of the config to remove
        name: String,
    },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Subtitle files or directories to convert
    #[arg(value_name = "PATHS")]
    paths: Vec<PathBuf>,

    /// Insert config to append to every file (repeatable, applied in order)
    #[arg(short, long = "insert", value_name = "NAME")]
    inserts: Vec<String>,

    /// Convert traditional Chinese text to simplified
    #[arg(short = 's', long)]
    to_simplified: bool,

    /// Delete each source file after a successful conversion
    #[arg(short, long)]
    delete_original: bool,

    /// Output directory (default: next to each source)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Font of a freshly created Default style
    #[arg(long, value_name = "NAME")]
    font: Option<String>,

    /// Font size of a freshly created Default style
    #[arg(long, value_name = "N")]
    font_size: Option<u32>,

    /// Primary color, e.g. H00FFFFFF
    #[arg(long, value_name = "COLOR")]
    color: Option<Color>,

    /// Outline color, e.g. H00000000
    #[arg(long, value_name = "COLOR")]
    outline_color: Option<Color>,

    /// Number of files converted at once
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Fail a file when the converter returns fewer lines than sent
    #[arg(long)]
    strict_lines: bool,

    /// Overwrite existing output files
    #[arg(short, long)]
    force: bool,
}

/// toass - batch subtitle normalizer
///
/// Converts SRT, WebVTT and ASS subtitles into uniformly styled ASS scripts.
#[derive(Parser, Debug)]
#[command(name = "toass")]
#[command(version)]
#[command(about = "Convert subtitles to styled ASS")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "toass converts SRT, WebVTT and ASS subtitles into styled ASS scripts.

EXAMPLES:
    toass movie.srt                             # Convert next to the source
    toass -s movie.srt                          # Also convert to simplified Chinese
    toass -i logo -i credits /subs/             # Append two insert configs to every file
    toass -o out --font Arial --font-size 40 a.vtt
    toass inserts add logo --text '{\\an7}LOGO' --end 00:00:10.000
    toass completions bash > toass.bash         # Generate bash completions

CONFIGURATION:
    Insert configs and colors live in sub.json, everything else in
    settings.json. Missing files are created with defaults.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    convert: ConvertArgs,

    /// Insert-config file path
    #[arg(long = "config", global = true, default_value = "sub.json")]
    config_path: PathBuf,

    /// Settings file path
    #[arg(long = "settings", global = true, default_value = "settings.json")]
    settings_path: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Everything passes the logger; the effective level is set below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(level) = &cli.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "toass", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Inserts { action }) => run_inserts(&cli.config_path, action),
        Some(Commands::Convert(args)) => {
            run_convert(args, &cli.config_path, &cli.settings_path, cli.log_level.is_some()).await
        }
        None => {
            if cli.convert.paths.is_empty() {
                CommandLineOptions::command().print_help()?;
                return Err(anyhow!("PATHS is required when no subcommand is specified"));
            }
            run_convert(cli.convert, &cli.config_path, &cli.settings_path, cli.log_level.is_some()).await
        }
    }
}

async fn run_convert(
    args: ConvertArgs,
    config_path: &Path,
    settings_path: &Path,
    log_level_from_cli: bool,
) -> Result<()> {
    let mut config = Config::load_or_create(config_path, settings_path)?;

    // If log level was not set via command line, update it from settings now
    if !log_level_from_cli {
        log::set_max_level(level_filter(&config.settings.log_level));
    }

    // Override config with CLI options if provided
    if let Some(font) = args.font {
        config.settings.font_family = font;
    }
    if let Some(font_size) = args.font_size {
        config.settings.font_size = font_size;
    }
    if let Some(color) = args.color {
        config.subtitles.subtitle_color = color;
    }
    if let Some(color) = args.outline_color {
        config.subtitles.outline_color = color;
    }
    if let Some(jobs) = args.jobs {
        config.settings.concurrent_jobs = jobs;
    }
    if args.strict_lines {
        config.settings.short_reply_policy = ShortReplyPolicy::Fail;
    }

    for name in &args.inserts {
        if name != app_config::NO_INSERTION && config.subtitles.find(name).is_none() {
            warn!("Insert config '{}' is not defined in {}, it will be skipped", name, config_path.display());
        }
    }

    let text_conversion = &config.settings.text_conversion;
    let client = ZhConvert::from_config(text_conversion).context("Failed to create zhconvert client")?;
    let converter: Arc<dyn TextConverter> = Arc::new(Retrying::new(
        client,
        text_conversion.retry_count,
        text_conversion.retry_backoff_ms,
    ));

    let controller = Controller::with_config(config, converter)?;

    let options = BatchOptions {
        selected_inserts: args.inserts,
        convert_text: args.to_simplified,
        delete_original: args.delete_original,
        output_dir: args.output_dir,
        force: args.force,
        quiet: false,
    };

    let report = controller.convert_paths(&args.paths, &options).await?;

    for error in report.delete_failures() {
        warn!("{}", error);
    }

    if report.has_failures() {
        for (source, e) in report.failures() {
            error!("{}: {}", source.display(), e);
        }
        return Err(anyhow!("{} of {} file(s) failed", report.failed, report.total));
    }

    Ok(())
}

fn run_inserts(config_path: &Path, action: InsertAction) -> Result<()> {
    let mut subtitles: SubtitleConfigs = app_config::load_or_create(config_path)?;

    match action {
        InsertAction::List => {
            if subtitles.subtitle_configs.is_empty() {
                info!("No insert configs defined in {}", config_path.display());
            }
            for config in &subtitles.subtitle_configs {
                println!(
                    "{}\t{} --> {}\t{}",
                    config.name, config.start_time, config.end_time, config.ass_statement
                );
            }
            return Ok(());
        }
        InsertAction::Add {
            name,
            start,
            end,
            text,
            replace,
        } => {
            let config = InsertConfig::new(name.clone(), start, end, text);
            if replace {
                subtitles.upsert(config)?;
            } else {
                subtitles.add(config)?;
            }
            info!("Saved insert config '{}'", name);
        }
        InsertAction::Remove { name } => {
            if subtitles.remove(&name).is_none() {
                return Err(anyhow!("Insert config '{}' not found", name));
            }
            info!("Removed insert config '{}'", name);
        }
    }

    app_config::save(config_path, &subtitles)
}
