//! jellysub - Automated subtitle translation for Jellyfin libraries
//!
//! Walks a Jellyfin library, picks one subtitle stream per item that has no
//! track in the target language yet, translates it through ollama or gemini
//! while keeping timing and styling intact, and uploads the result.

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod poll;
pub mod pool;
pub mod selector;
pub mod server;
pub mod subtitle;
pub mod translate;
pub mod walker;
