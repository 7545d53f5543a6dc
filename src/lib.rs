//! Data preparation and charts for the C-REM scenario website.

pub mod archive;
pub mod cli;
pub mod config;
pub mod data;
pub mod demo;
pub mod error;
pub mod io;
pub mod logging;
pub mod viz;

#[cfg(feature = "api")]
pub mod api;
