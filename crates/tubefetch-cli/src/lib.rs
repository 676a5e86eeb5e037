//! Command-line front end for tubefetch.
//!
//! Parses arguments (with environment fallbacks) and turns them into the web
//! adapter's [`tubefetch_axum::ServerConfig`].

pub mod parser;

pub use parser::Cli;
