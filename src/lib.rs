pub mod binder;
pub mod config;
pub mod loader;
pub mod map;
pub mod parser;
pub mod profiling;
pub mod render;
pub mod stats;
pub mod viz;
