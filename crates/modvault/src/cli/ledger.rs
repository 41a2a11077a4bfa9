use anyhow::{Context, Result};
use modvault_ledger::Ledger;

use crate::config::Settings;
use crate::ui::table::{Formatter, LedgerRow};

pub fn run(settings: &Settings) -> Result<()> {
    let path = &settings.ledger_path;
    let ledger = Ledger::load_read_only(path).with_context(|| format!("failed to read ledger {}", path.display()))?;

    let rows: Vec<LedgerRow> = ledger.records().map(LedgerRow::from).collect();
    let incomplete = rows.iter().filter(|r| r.missing > 0).count();
    let table = Formatter {
        header:   Some(format!("{} ({} entries)", path.display(), rows.len())),
        footer:   (incomplete > 0).then(|| format!("{incomplete} entries have missing files")),
        col_name: false,
    }
    .build(rows);

    println!("{table}");
    Ok(())
}
