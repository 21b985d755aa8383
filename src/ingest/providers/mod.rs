// src/ingest/providers/mod.rs
pub mod seoul_open_api;
