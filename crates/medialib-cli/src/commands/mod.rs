//! Command handlers

pub mod config;
pub mod init;
pub mod playlist;
pub mod reset;
pub mod song;
pub mod stats;
pub mod status;
pub mod subtitle;
