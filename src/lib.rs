//! Curator - personal media acquisition backend
//!
//! Tracks a library of films and series, finds torrent releases for them
//! through a remote search service, ranks the candidates, hands the chosen
//! ones to a download backend and keeps each item's content reconciled
//! over time.

pub mod analysis;
pub mod config;
pub mod jobs;
pub mod locker;
pub mod models;
pub mod scheduler;
pub mod search;
pub mod selector;
pub mod services;
pub mod watcher;
