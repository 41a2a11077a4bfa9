use modvault_ledger::LedgerRecord;
use tabled::settings::object::Rows;
use tabled::settings::{Panel, Remove, Style};
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    pub header:   Option<String>,
    pub footer:   Option<String>,
    /// Drop the column-name row.
    pub col_name: bool,
}

impl Formatter {
    pub fn build<T: Tabled, I: IntoIterator<Item = T>>(self, data: I) -> Table {
        let mut table = Table::new(data);
        if self.col_name {
            table.with(Remove::row(Rows::first()));
        }
        if let Some(header) = self.header {
            table.with(Panel::header(header));
        }
        if let Some(footer) = self.footer {
            table.with(Panel::footer(footer));
        }
        table.with(Style::blank());
        table
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct LedgerRow {
    #[tabled(rename = "ID")]
    pub id:      String,
    #[tabled(rename = "NAME")]
    pub name:    String,
    #[tabled(rename = "TYPE")]
    pub kind:    String,
    #[tabled(rename = "VERSION")]
    pub version: String,
    #[tabled(rename = "MISSING")]
    pub missing: usize,
}

impl From<&LedgerRecord> for LedgerRow {
    fn from(record: &LedgerRecord) -> Self {
        let entry = record.entry();
        Self {
            id:      entry.id.to_string(),
            name:    entry.name.clone(),
            kind:    entry.model_type.to_string(),
            version: record
                .latest_version_id()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
            missing: record.missing_files().len(),
        }
    }
}
