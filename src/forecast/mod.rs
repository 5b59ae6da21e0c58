// src/forecast/mod.rs
pub mod client;
pub mod models;
