pub mod app;
pub mod browse;
pub mod card;
pub mod client;
pub mod config;
pub mod debounce;
pub mod detail;
pub mod models;
pub mod tmdb;
