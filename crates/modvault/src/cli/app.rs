use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::Overrides;

#[derive(Clone, Debug, Parser)]
#[command(name = "modvault", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Extra settings file (JSON, or TOML by extension)
    #[arg(long, global = true)]
    pub config:  Option<PathBuf>,
    /// -v for debug output, -vv for trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub cmd:     Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "run", name = "archive", about = "Archive new and updated catalog entries")]
    Archive(ArchiveArg),
    #[command(name = "sizes", about = "Sum the declared size of what an archive run would fetch")]
    Sizes(ListingArg),
    #[command(alias = "ls", name = "ledger", about = "Show archived entries")]
    Ledger(LedgerArg),
}

#[derive(Args, Clone, Debug, Default)]
pub struct ListingArg {
    /// Stop after the first catalog page
    #[arg(long)]
    pub first_page_only: bool,
    /// Only list favorites (needs an API key)
    #[arg(long)]
    pub favorites_only:  bool,
    #[arg(long, value_name = "FILE")]
    pub ledger:          Option<PathBuf>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ArchiveArg {
    #[command(flatten)]
    pub listing:       ListingArg,
    #[arg(long)]
    pub size_only:     bool,
    /// Revisit entries the ledger already holds
    #[arg(long)]
    pub force_recheck: bool,
    #[arg(short, long, value_name = "DIR")]
    pub output:        Option<PathBuf>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct LedgerArg {
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,
}

fn flag(set: bool) -> Option<bool> { set.then_some(true) }

impl ListingArg {
    fn overrides(&self) -> Overrides {
        Overrides {
            first_page_only: flag(self.first_page_only),
            favorites_only: flag(self.favorites_only),
            ledger_path: self.ledger.clone(),
            ..Overrides::default()
        }
    }
}

impl Commands {
    /// Settings this command line pins, over every other layer.
    pub fn overrides(&self) -> Overrides {
        match self {
            Commands::Archive(arg) => Overrides {
                only_size: flag(arg.size_only),
                force_recheck: flag(arg.force_recheck),
                output_dir: arg.output.clone(),
                ..arg.listing.overrides()
            },
            Commands::Sizes(arg) => Overrides {
                only_size: Some(true),
                ..arg.overrides()
            },
            Commands::Ledger(arg) => Overrides {
                ledger_path: arg.ledger.clone(),
                ..Overrides::default()
            },
        }
    }
}
