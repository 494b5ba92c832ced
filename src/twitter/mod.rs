//! Twitter as a mention source.

pub mod client;
pub mod models;
pub mod oauth;

pub use client::TwitterClient;
