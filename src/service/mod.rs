pub mod backups;
pub mod batch;
pub mod mysql_cli;
pub mod query_guard;
pub mod workbook;
