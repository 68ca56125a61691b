//! Command dispatch logic for codeq

use super::{GenerateArgs, InitArgs, ValidateArgs, generate_report, init_config, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "codeq", author, version, long_about = None)]
#[command(about = "Merge coverage, code metrics, and static-analysis findings into one quality report")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: CodeqSubcommand,
}

#[derive(Subcommand, Debug)]
enum CodeqSubcommand {
    /// Parse input documents and write a quality report
    Generate(Box<GenerateArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        CodeqSubcommand::Generate(generate_args) => generate_report(host, generate_args).await,
        CodeqSubcommand::Init(init_args) => init_config(host, init_args),
        CodeqSubcommand::Validate(validate_args) => validate_config(host, validate_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_arguments() {
        let cli = Cli::try_parse_from([
            "codeq",
            "generate",
            "--coverage",
            "a.xml",
            "--coverage",
            "b.xml",
            "--sarif",
            "c.sarif",
            "--baseline",
            "base.json",
            "--rotate-baseline",
            "--color",
            "never",
        ])
        .unwrap();

        let CodeqSubcommand::Generate(args) = cli.command else {
            unreachable!("expected the generate command");
        };
        assert_eq!(args.coverage.len(), 2);
        assert!(args.metrics.is_empty());
        assert_eq!(args.sarif.len(), 1);
        assert!(args.rotate_baseline);
        assert_eq!(args.report.as_str(), "codeq-report.json");
    }

    #[test]
    fn test_rotation_requires_baseline() {
        assert!(Cli::try_parse_from(["codeq", "generate", "--metrics", "m.xml", "--rotate-baseline"]).is_err());
    }
}
