//! Application module
//!
//! Lifecycle of the daemon: wiring of long-lived components, the background
//! tasks built from them and signal-driven shutdown.

pub mod builder;
pub mod core;
pub mod services;
pub mod tasks;

pub use builder::build_reconciler;
pub use builder::ApplicationBuilder;
pub use core::Application;
pub use services::ApplicationServices;
