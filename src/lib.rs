pub mod cli;
pub mod config;
pub mod job;
pub mod logging;
pub mod remote;
pub mod shutdown;
pub mod theme;
