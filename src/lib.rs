//! TV Show Renamer Library
//!
//! Parses TV episode file names (Latin and CJK conventions), plans
//! normalized destinations and moves files with backups, an undo log and a
//! resumable checkpoint.

pub mod cli;
pub mod core;
pub mod error;
pub mod generators;
pub mod models;
pub mod preflight;
pub mod utils;

pub use error::{Error, Result};
