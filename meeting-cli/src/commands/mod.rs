pub mod busy;
pub mod config;
