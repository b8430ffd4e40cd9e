pub mod client;
mod response;

pub use client::{YahooClient, DEFAULT_BASE_URL};
