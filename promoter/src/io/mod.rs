//! I/O helpers and external collaborator contracts.

pub mod cluster;
pub mod config;
pub mod credentials;
pub mod steps_file;
pub mod workdir;
