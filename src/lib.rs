pub mod box_score;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export_block;
pub mod fake_export;
pub mod game_clock;
pub mod ingest;
pub mod ingest_log;
pub mod metrics;
pub mod persist;
pub mod state;
pub mod table_export;
pub mod view;
