#![forbid(unsafe_code)]

pub mod app;
pub mod challenge;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod formats;
pub mod fusion;
pub mod html;
pub mod inspect;
pub mod logging;
pub mod progress;
pub mod rss;
pub mod snapshot;
