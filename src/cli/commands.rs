//! CLI definition using clap.

use clap::Parser;
use std::path::PathBuf;

/// toolgen - generate typed wrappers from declarative tool descriptions
#[derive(Parser, Debug)]
#[command(name = "toolgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the *.json tool descriptions
    pub directory: PathBuf,

    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output root (default: current directory)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Compute everything, write nothing, report the plan
    #[arg(long)]
    pub dry_run: bool,

    /// Stop at the first failed file
    #[arg(long, conflicts_with = "continue_on_error")]
    pub fail_fast: bool,

    /// Keep going after a failed file (default)
    #[arg(long)]
    pub continue_on_error: bool,

    /// Skip reference synchronization
    #[arg(long)]
    pub no_references: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Explicit fail-fast choice, if one was given on the command line.
    pub fn fail_fast_override(&self) -> Option<bool> {
        match (self.fail_fast, self.continue_on_error) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_directory() {
        assert!(Cli::try_parse_from(["toolgen"]).is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["toolgen", "defs"]).unwrap();
        assert_eq!(cli.directory, PathBuf::from("defs"));
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert!(cli.out_dir.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.no_references);
        assert_eq!(cli.fail_fast_override(), None);
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["toolgen", "-v", "defs"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["toolgen", "-c", "/path/to/toolgen.yml", "defs"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/toolgen.yml")));
    }

    #[test]
    fn test_cli_out_dir_and_flags() {
        let cli = Cli::try_parse_from(["toolgen", "defs", "-o", "gen", "--dry-run", "--no-references"]).unwrap();
        assert_eq!(cli.out_dir, Some(PathBuf::from("gen")));
        assert!(cli.dry_run);
        assert!(cli.no_references);
    }

    #[test]
    fn test_cli_failure_policy() {
        let cli = Cli::try_parse_from(["toolgen", "defs", "--fail-fast"]).unwrap();
        assert_eq!(cli.fail_fast_override(), Some(true));

        let cli = Cli::try_parse_from(["toolgen", "defs", "--continue-on-error"]).unwrap();
        assert_eq!(cli.fail_fast_override(), Some(false));

        assert!(Cli::try_parse_from(["toolgen", "defs", "--fail-fast", "--continue-on-error"]).is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
