pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod models;
pub mod schedule;
pub mod storage;
