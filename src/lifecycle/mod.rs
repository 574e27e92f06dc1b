//! Application lifecycle.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Configuration loading (ConfigService, ServerConfig)
//!    ↓
//! 2. Registration (injectables, controllers, bindings)
//!    ↓
//! 3. Routing (one execution container per controller prefix)
//!    ↓
//! 4. Eager singleton construction
//!    ↓
//! 5. Server start
//!    ↓
//! [Running...]
//!    ↓
//! 6. Shutdown signal (SIGTERM/SIGINT)
//!    ↓
//! 7. Server stop
//! ```

mod application;
mod shutdown;

pub use application::{Application, ApplicationBuilder};
pub use shutdown::shutdown_signal;
