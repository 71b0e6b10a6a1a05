// Core trainer logic. The terminal front end in main.rs, the integration
// tests and the benchmarks all build on these modules.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod session;
pub mod store;
