//! Subcommand implementations

pub mod cache;
pub mod families;
pub mod predict;
pub mod recommend;
pub mod zones;
