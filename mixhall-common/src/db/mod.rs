//! Database models and queries

pub mod init;
pub mod settings;
pub mod songs;
pub mod submissions;

pub use init::*;
pub use settings::*;
