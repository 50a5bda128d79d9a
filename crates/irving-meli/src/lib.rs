//! Mercado Libre API bindings: implements the engine's order, ad-insights
//! and token-refresh collaborators over the public REST API.

pub mod client;
pub mod config;
pub mod dto;

pub use client::MeliClient;
pub use config::MeliConfig;
