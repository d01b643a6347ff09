//! Core translation components: type reconstruction, escape analysis, the emitted-text buffer,
//! and the ambient config/error/diagnostics stack that `ts2c_transpile` drives.

pub mod config;
pub mod diagnostics;
pub mod emitter;
pub mod error;
pub mod memory_manager;
pub mod type_helper;

pub use config::Config;
pub use diagnostics::Diagnostics;
pub use emitter::{Emitter, HeaderKey, Target};
pub use error::TranspileError;
pub use memory_manager::MemoryManager;
pub use type_helper::TypeHelper;
