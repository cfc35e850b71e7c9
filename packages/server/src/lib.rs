// Naver Land listing collector - core library
//
// Harvests apartment listings for the complexes listed in a Google Sheet,
// stores them in Postgres and republishes a daily summary to the sheet.
// The server and run_task binaries are thin shells over this crate.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
