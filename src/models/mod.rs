//! Data model shared by the parsers, the catalog and the HTTP surface

pub mod playlist;

pub use playlist::*;
