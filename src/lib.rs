// src/lib.rs
pub mod types;
pub mod config;
pub mod metrics;
pub mod symbols;
pub mod providers;
pub mod cache;
pub mod snapshot;
pub mod arbitrage;
pub mod funding;
pub mod dedup;
pub mod publishing;
pub mod scanner;
