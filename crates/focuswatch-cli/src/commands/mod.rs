pub mod activity;
pub mod config;
pub mod focus;
