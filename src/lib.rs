// Library exports for testing
pub mod classifier;
pub mod config;
pub mod journal;
pub mod logging;
pub mod mood;
pub mod mood_selector;
pub mod prompts;
pub mod renderer;
pub mod stats;
pub mod stats_builder;
pub mod store;
pub mod timefmt;
pub mod window;
