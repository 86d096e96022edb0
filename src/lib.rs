// src/lib.rs
// pagewatch - AI change analysis and notification dispatch for monitored
// web pages

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod store;

pub use error::{PagewatchError, Result};
