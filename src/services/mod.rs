pub mod attributes;
pub mod catalog;
pub mod guide;
pub mod library;
pub mod m3u_parser;
pub mod metrics;
pub mod resolver;
pub mod xtream;
