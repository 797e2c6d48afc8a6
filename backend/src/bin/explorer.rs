//! NGTS Explorer interactive shell.
//!
//! Loads a crossmatch catalogue and its photometry, then reads commands from
//! stdin to browse objects, search for periods and fold lightcurves.
//!
//! # Usage
//!
//! ```bash
//! # CSV tables
//! ngts-explorer --match crossmatch.csv --data photometry.csv --airmass headers.csv
//!
//! # Repository from explorer.toml or the environment
//! ngts-explorer --config explorer.toml
//! ```
//!
//! # Environment Variables
//!
//! - `REPOSITORY_TYPE`: `local`, `file` or `postgres`
//! - `NGTS_MATCH_FILE`, `NGTS_DATA_FILE`, `NGTS_AIRMASS_FILE`: CSV tables
//! - `DATABASE_URL`: PostgreSQL connection string (`postgres-repo` feature)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ngts_explorer::config::ExplorerConfig;
use ngts_explorer::db::FileSources;
use ngts_explorer::services::{ExplorerSession, Selection};
use ngts_explorer::{PeriodogramConfig, PhaseOptions};

const HELP: &str = "\
Commands:
  keys                          list object classes
  count [class]                 number of objects in a class (default: current)
  select <class> [index]        load the index-th object of a class (default 0)
  info                          describe the current object
  period [min max [n]] [--detrend]
                                Lomb-Scargle periodogram of the current object
  fold <period> [epoch] [--jd] [--detrend] [--single]
                                phase-folded lightcurve
  show [--detrend]              lightcurve against time
  help                          this message
  quit                          leave the shell";

/// Command line arguments for the explorer shell
#[derive(Parser, Debug)]
#[command(author, version, about = "Explore NGTS lightcurves of crossmatched objects")]
struct Args {
    /// Crossmatch CSV (main_id, otype, Sequence_number, V)
    #[arg(long = "match", value_name = "FILE", requires = "data")]
    match_file: Option<PathBuf>,

    /// Photometry CSV (sequence_number, tmid, flux, fluxerr, ...)
    #[arg(long = "data", value_name = "FILE", requires = "match_file")]
    data: Option<PathBuf>,

    /// Exposure header CSV with image_id and airmass
    #[arg(long, value_name = "FILE")]
    airmass: Option<PathBuf>,

    /// Explorer configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum ShellCommand {
    Keys,
    Count(Option<String>),
    Select { label: String, index: usize },
    Info,
    Period {
        range: Option<(f64, f64)>,
        n: Option<usize>,
        detrend: bool,
    },
    Fold {
        period: f64,
        options: PhaseOptions,
        detrend: bool,
    },
    Show { detrend: bool },
    Help,
    Quit,
}

fn parse_number<T: std::str::FromStr>(word: &str, what: &str) -> Result<T, String> {
    word.parse()
        .map_err(|_| format!("invalid {}: '{}'", what, word))
}

fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, rest)) = words.split_first() else {
        return Ok(None);
    };
    let flag = |f: &str| rest.iter().any(|w| *w == f);
    let args: Vec<&str> = rest.iter().copied().filter(|w| !w.starts_with("--")).collect();

    let command = match name {
        "keys" => ShellCommand::Keys,
        "count" => ShellCommand::Count(args.first().map(|s| s.to_string())),
        "select" => {
            let label = args.first().ok_or("usage: select <class> [index]")?;
            let index = match args.get(1) {
                Some(w) => parse_number(w, "index")?,
                None => 0,
            };
            ShellCommand::Select {
                label: label.to_string(),
                index,
            }
        }
        "info" => ShellCommand::Info,
        "period" => {
            let range = match args.len() {
                0 => None,
                1 => return Err("usage: period [min max [n]] [--detrend]".to_string()),
                _ => Some((
                    parse_number(args[0], "min period")?,
                    parse_number(args[1], "max period")?,
                )),
            };
            let n = match args.get(2) {
                Some(w) => Some(parse_number(w, "grid size")?),
                None => None,
            };
            ShellCommand::Period {
                range,
                n,
                detrend: flag("--detrend"),
            }
        }
        "fold" => {
            let period = parse_number(
                args.first()
                    .ok_or("usage: fold <period> [epoch] [--jd] [--detrend] [--single]")?,
                "period",
            )?;
            let epoch: f64 = match args.get(1) {
                Some(w) => parse_number(w, "epoch")?,
                None => 0.0,
            };
            let options = if flag("--jd") {
                PhaseOptions::default().with_jd_epoch(epoch)
            } else {
                PhaseOptions::default().with_epoch(epoch)
            };
            ShellCommand::Fold {
                period,
                options: options.with_double(!flag("--single")),
                detrend: flag("--detrend"),
            }
        }
        "show" => ShellCommand::Show {
            detrend: flag("--detrend"),
        },
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

struct Shell {
    session: ExplorerSession,
    current: Option<Selection>,
}

impl Shell {
    fn current(&self) -> anyhow::Result<&Selection> {
        self.current
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no object selected, use 'select <class> [index]'"))
    }

    /// Run one command. Returns false when the shell should exit.
    async fn execute(&mut self, command: ShellCommand) -> anyhow::Result<bool> {
        match command {
            ShellCommand::Keys => {
                for key in self.session.keys() {
                    println!("{:<12} {}", key, self.session.nobjects(key));
                }
            }
            ShellCommand::Count(label) => {
                let label = match label {
                    Some(label) => label,
                    None => self.current()?.label().to_string(),
                };
                println!("{} {} objects", self.session.nobjects(&label), label);
            }
            ShellCommand::Select { label, index } => {
                let selection = self.session.select_object(&label, index).await?;
                println!(
                    "{} ({} of {} {} objects)",
                    selection.title(),
                    index + 1,
                    selection.class_size,
                    label
                );
                self.current = Some(selection);
            }
            ShellCommand::Info => {
                let s = self.current()?;
                println!("{}", s.title());
                println!(
                    "samples: {} ({} valid), baseline: {:.3} d, time axis: {}",
                    s.series.len(),
                    s.series.valid_count(),
                    s.series.baseline().unwrap_or(0.0),
                    s.time_label()
                );
                if let Some((first, last)) = s.series.date_range() {
                    println!(
                        "dates: {} to {} UTC",
                        first.format("%Y-%m-%d %H:%M"),
                        last.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("airmass: {}", if s.series.has_airmass() { "yes" } else { "no" });
            }
            ShellCommand::Period { range, n, detrend } => {
                let s = self.current()?;
                let mut config: PeriodogramConfig =
                    self.session.periodogram_config().clone().with_detrend(detrend);
                if let Some((min, max)) = range {
                    config = config.with_period_range(min, max);
                }
                if let Some(n) = n {
                    config = config.with_n_frequencies(n);
                }
                let power = self.session.find_period(s, &config)?;
                for warning in power.warnings() {
                    println!("warning: {}", warning);
                }
                println!(
                    "peak period: {:.6} d (power {:.4}, {} points)",
                    power.peak_period(),
                    power.peak_power(),
                    power.valid_points()
                );
                for (period, p) in power.top_peaks(5).into_iter().skip(1) {
                    println!("  next: {:.6} d (power {:.4})", period, p);
                }
            }
            ShellCommand::Fold {
                period,
                options,
                detrend,
            } => {
                let s = self.current()?;
                let folded = self.session.fold(s, period, options, detrend)?;
                println!("# {}  P = {} d", s.title(), period);
                println!("phase\tvalue\terror");
                for ((phase, value), err) in folded
                    .phases
                    .iter()
                    .zip(&folded.values)
                    .zip(&folded.uncertainties)
                {
                    println!("{:.5}\t{:.6}\t{}", phase, value, format_error(*err));
                }
            }
            ShellCommand::Show { detrend } => {
                let s = self.current()?;
                let view = s.view(detrend);
                let origin = view.time_origin().map_or(0.0, |o| o.value());
                println!("# {}", s.title());
                println!("{}\tvalue\terror", s.time_label());
                for o in view.valid() {
                    println!(
                        "{:.6}\t{:.6}\t{}",
                        o.time - origin,
                        o.value,
                        format_error(o.uncertainty)
                    );
                }
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => return Ok(false),
        }
        Ok(true)
    }
}

fn format_error(err: Option<f64>) -> String {
    err.map_or_else(|| "-".to_string(), |e| format!("{:.6}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = ExplorerConfig::load(args.config.as_deref())?;
    if let (Some(match_file), Some(data)) = (args.match_file, args.data) {
        let mut sources = FileSources::new(match_file, data);
        if let Some(airmass) = args.airmass {
            sources = sources.with_airmass_file(airmass);
        }
        config = config.with_file_sources(sources);
    }

    let session = ExplorerSession::from_config(&config).await?;
    info!("Loaded {} object classes", session.keys().len());

    println!("== NGTS Explorer\n{}", HELP);
    let mut shell = Shell {
        session,
        current: None,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };
        match shell.execute(command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {}", e),
        }
    }

    Ok(())
}
