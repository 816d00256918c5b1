//! Data models shared by extraction and rendering.

pub mod config;
pub mod invoice;
