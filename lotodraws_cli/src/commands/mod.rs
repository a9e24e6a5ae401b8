//! CLI subcommand implementations.

pub mod backfill;
pub mod extract;
pub mod parse;
