pub mod backup;
pub mod catalog;
pub mod chart;
pub mod query;
pub mod spreadsheet;
