pub mod common;
pub mod episode_links;
pub mod formatter;
pub mod metadata_parser;
pub mod rules;
