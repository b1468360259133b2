//! rof - run a command, roll the directory back if it fails.
//!
//! This is the main entry point for the rof CLI.

mod config;
mod executor;
mod log;
mod runner;

use clap::Parser;
use config::Config;
use executor::ShellExecutor;
use rof_snapshot::SnapshotStore;
use runner::Runner;
use tracing::warn;

#[derive(Parser)]
#[command(name = "rof")]
#[command(
    author,
    version,
    about = "Run a command and restore the directory's files if it fails",
    long_about = None
)]
// `-h` and `-V` belong to the command being wrapped.
#[command(
    disable_help_flag = true,
    disable_version_flag = true,
    args_override_self = true
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Command to run, passed to the shell as one line
    #[arg(
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    command: Vec<String>,
}

/// Join the command words into the line handed to the shell.
fn command_line(words: &[String]) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command_line) = command_line(&cli.command) else {
        eprintln!("Usage: rof <command>");
        std::process::exit(1);
    };

    let (config, issues) = Config::load().await;
    let level = if cli.verbose {
        log::LogLevel::Debug
    } else {
        config.log_level
    };
    log::init(level);
    for issue in issues {
        warn!("{}", issue);
    }

    let cwd = std::env::current_dir()?;
    let store = SnapshotStore::new(config.snapshot_config(), cwd.clone())?;
    let runner = Runner::new(store, ShellExecutor::new(config.shell.as_str()), cwd);

    // A snapshot from another run aborts here, leaving the snapshots on disk.
    let code = runner.run(&command_line).await?;
    std::process::exit(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_joins_with_spaces() {
        let words = vec!["sh".to_string(), "-c".to_string(), "exit 1".to_string()];
        assert_eq!(command_line(&words).as_deref(), Some("sh -c exit 1"));
    }

    #[test]
    fn test_command_line_empty() {
        assert_eq!(command_line(&[]), None);
    }

    #[test]
    fn test_cli_keeps_command_flags() {
        let cli = Cli::parse_from(["rof", "ls", "-la", "--color"]);
        assert!(!cli.verbose);
        assert_eq!(cli.command, vec!["ls", "-la", "--color"]);
    }

    #[test]
    fn test_cli_verbose_before_command() {
        let cli = Cli::parse_from(["rof", "-v", "make", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.command, vec!["make", "-v"]);
    }

    #[test]
    fn test_cli_help_and_version_go_to_command() {
        let cli = Cli::parse_from(["rof", "-h"]);
        assert_eq!(cli.command, vec!["-h"]);

        let cli = Cli::parse_from(["rof", "--version"]);
        assert_eq!(cli.command, vec!["--version"]);

        let cli = Cli::parse_from(["rof", "-V", "x"]);
        assert_eq!(cli.command, vec!["-V", "x"]);
    }

    #[test]
    fn test_cli_double_dash_ends_rof_flags() {
        let cli = Cli::parse_from(["rof", "--", "-v", "ls"]);
        assert!(!cli.verbose);
        assert_eq!(cli.command, vec!["-v", "ls"]);
    }

    #[test]
    fn test_cli_repeated_verbose() {
        let cli = Cli::parse_from(["rof", "-v", "-v", "make"]);
        assert!(cli.verbose);
        assert_eq!(cli.command, vec!["make"]);
    }

    #[test]
    fn test_cli_no_command() {
        let cli = Cli::parse_from(["rof"]);
        assert!(cli.command.is_empty());
    }
}
