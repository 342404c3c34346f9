//! Convenient imports for common functionality.
//!
//! ```rust
//! use crud_engine::prelude::*;
//! ```

pub use crate::config::{EngineConfig, EngineConfigBuilder, InitMode};
pub use crate::engine::Engine;
pub use crate::error::{EngineError, ValidationError};
pub use crate::filter::Filter;
pub use crate::logger::{LogLevel, QueryLogger, TracingLogger};
pub use crate::page::Pagination;
pub use crate::record::{Changeset, Record};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::translation::{PlaceholderStyle, translate_placeholders};
pub use crate::types::{Backend, RowValues};
