pub mod cli;
pub mod config;
pub mod db;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod store;
pub mod util;

pub mod error;
