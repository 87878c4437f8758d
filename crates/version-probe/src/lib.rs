pub mod app;
pub mod config;
pub mod k8s;
pub mod metrics;
pub mod probe;
