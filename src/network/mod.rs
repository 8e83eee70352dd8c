//! Network module
//!
//! Outgoing HTTP for the vendor providers.

mod client;

pub use client::HttpClient;
