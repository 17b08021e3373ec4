//! Ambient process concerns shared by the relay binary: configuration and logging.

pub mod config;
pub mod logging;
