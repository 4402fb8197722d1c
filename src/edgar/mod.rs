// src/edgar/mod.rs
pub mod client;
pub mod crawler;
pub mod lookup;
pub mod models;

pub use client::{Archive, ClientConfig, EdgarClient};
pub use lookup::TickerLookup;
pub use models::{FilingBase, FilingReference, RegistrantKey};
