//! CLI subcommand implementations.

pub mod init;
pub mod replay;
pub mod status;
pub mod track;
