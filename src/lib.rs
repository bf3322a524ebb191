//! Word of the day library
//!
//! Fetches a random word and its dictionary definitions from public HTTP APIs,
//! retries transient failures, caches the composed result and falls back to a
//! fixed word when upstreams are down. The binary in `main.rs` is a thin CLI
//! over [`service::WordOfTheDayService`].

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod retry;
pub mod service;
