pub mod client;
pub mod fetcher;
pub mod models;
