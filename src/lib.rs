// Library target shared by the binary, the integration tests under tests/
// and the criterion benchmarks.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod session;
pub mod store;
pub mod ui;
