pub mod auth;
pub mod chain;
pub mod cmd;
pub mod config;
pub mod errors;
pub mod harness;
pub mod http;
pub mod log;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod server;
pub mod utils;
