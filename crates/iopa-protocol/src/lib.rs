//! IOPA Protocol Vocabulary
//!
//! The single source of truth for the runtime's wire-level names: context
//! field keys, method and protocol version strings, the scheme resolution
//! table, and the typed pipeline error. Independently-authored middleware
//! talk to each other through these keys, so they are preserved verbatim.

pub mod constants;
pub mod error;
pub mod scheme;

pub use constants::{APP, IOPA, METHODS, PORTS, PROTOCOLS, SCHEMES, SERVER};
pub use error::PipelineError;
pub use scheme::SchemeDefaults;
