pub mod analyzers;
pub mod config;
pub mod event;
pub mod loader;
pub mod output;
