pub mod cli;
pub mod commands;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod storage;
pub mod summary;
pub mod timer;
pub mod types;
pub mod utils;
