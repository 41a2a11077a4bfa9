pub mod app;
pub mod archive;
pub mod ledger;
