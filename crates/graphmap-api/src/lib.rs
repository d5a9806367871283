//! REST surface over a [`graphmap_template::GraphTemplate`].

pub mod config;
pub mod document;
pub mod server;
