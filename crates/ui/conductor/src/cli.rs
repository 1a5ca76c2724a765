use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::screens::ScreenKind;

#[derive(Parser, Debug)]
#[command(name = "conductor", version, about = "Music school administration console")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Cmd {
    /// Run interactive TUI (default)
    Run {
        /// Screen shown first; overrides `ui.start_screen`
        #[arg(long, value_enum)]
        screen: Option<ScreenKind>,
    },
    /// Print the form descriptors of a screen as JSON
    Describe {
        #[arg(value_enum)]
        screen: ScreenKind,
        /// Describe the form as it would open for this record (JSON5)
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Validate a record file (JSON5) against a screen's form; exits non-zero on errors
    Check {
        #[arg(value_enum)]
        screen: ScreenKind,
        record: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["conductor"]).unwrap();
        assert_eq!(cli.cmd, None);
    }

    #[test]
    fn screens_parse_in_kebab_case() {
        let cli = Cli::try_parse_from(["conductor", "check", "payments", "p.json5"]).unwrap();
        assert_eq!(
            cli.cmd,
            Some(Cmd::Check {
                screen: ScreenKind::Payments,
                record: PathBuf::from("p.json5"),
            })
        );
        let cli = Cli::try_parse_from(["conductor", "run", "--screen", "sessions"]).unwrap();
        assert_eq!(
            cli.cmd,
            Some(Cmd::Run {
                screen: Some(ScreenKind::Sessions)
            })
        );
    }
}
