pub mod log;
pub mod table;
pub mod tracker;
