mod adapters;
mod commands;
mod core;
mod stores;
mod ui;
mod version;

use clap::{Parser, Subcommand};
use core::error::{ShipError, print_error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Keep app versions in sync across the manifest, Android, iOS and the stores
#[derive(Parser)]
#[command(name = "shipver")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct ShipverCli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Create a starter shipver.toml for this project
  Init {
    /// Overwrite an existing configuration
    #[arg(long)]
    force: bool,
  },

  /// Reconcile local versions against the stores and write the result
  Resolve {
    /// Sync policy, e.g. store-or-fallback:minor (default: from shipver.toml)
    #[arg(long)]
    policy: Option<String>,
    /// Show the decision without writing any descriptor
    #[arg(long)]
    dry_run: bool,
    /// Fail instead of bumping when a store is at or past the local version
    #[arg(long)]
    no_auto_increment: bool,
    /// Ignore cached store observations
    #[arg(long)]
    fresh: bool,
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Compare local descriptor versions without touching anything
  DriftCheck {
    /// Exit non-zero when descriptors disagree
    #[arg(long)]
    strict: bool,
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Converge drifted descriptors, then reconcile against the stores
  AutoFix {
    /// Sync policy, e.g. store-or-fallback:minor (default: from shipver.toml)
    #[arg(long)]
    policy: Option<String>,
    /// Ignore cached store observations
    #[arg(long)]
    fresh: bool,
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = ShipverCli::parse();

  // Ctrl-C flips a flag the engine polls between phases and between writes.
  let interrupt = Arc::new(AtomicBool::new(false));
  {
    let flag = interrupt.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
      eprintln!("Warning: Could not install interrupt handler: {}", e);
    }
  }

  let result = match cli.command {
    Commands::Init { force } => commands::run_init(force),
    Commands::Resolve {
      policy,
      dry_run,
      no_auto_increment,
      fresh,
      json,
    } => commands::run_resolve(policy, dry_run, no_auto_increment, fresh, json, interrupt),
    Commands::DriftCheck { strict, json } => commands::run_drift_check(strict, json),
    Commands::AutoFix { policy, fresh, json } => {
      commands::run_auto_fix(policy, fresh, json, interrupt)
    }
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ShipError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
