pub mod client;

pub use client::HttpFlightInventory;
