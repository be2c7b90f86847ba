mod bindings;
mod core;
mod gates;
mod graph;
mod package;
mod pipeline;
mod publish;
mod ui;
mod version;

use clap::Parser;
use clap::error::ErrorKind;

use crate::core::config::ReleaseConfig;
use crate::core::error::print_error;
use crate::pipeline::Pipeline;
use crate::version::ReleaseVersion;

/// Release ddk-ffi and its language bindings as one coordinated version
#[derive(Parser)]
#[command(name = "ddk-release")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Version to release: MAJOR.MINOR.PATCH[-PRERELEASE], e.g. 1.2.0
  version: String,
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
  // The contract is exit 0 for --help/--version and exit 1 for every
  // invalid invocation, so clap's default exit 2 is handled by hand
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
      let _ = err.print();
      std::process::exit(0);
    }
    Err(err) => {
      let _ = err.print();
      std::process::exit(1);
    }
  };

  let release_version = match ReleaseVersion::parse(&cli.version) {
    Ok(v) => v,
    Err(err) => {
      print_error(&err);
      std::process::exit(1);
    }
  };

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(err) => {
      eprintln!("Error: Failed to get current directory: {}", err);
      std::process::exit(1);
    }
  };

  let result = ReleaseConfig::load_or_default(&root)
    .and_then(|config| Pipeline::new(root, config, release_version))
    .and_then(|pipeline| pipeline.run());

  if let Err(err) = result {
    print_error(&err);
    std::process::exit(1);
  }
}
