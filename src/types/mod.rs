//! Type definitions for the relay core
//!
//! This module contains the data model shared by the change feed and the
//! session layer, organized into logical submodules:
//!
//! - [`identifiers`] - Type-safe key wrappers (`RecordId`, `PhoneNumber`)
//! - [`records`] - Record kinds and the typed records the core dereferences

pub mod identifiers;
pub mod records;

// Re-export commonly used types
pub use identifiers::{PhoneNumber, RecordId};
pub use records::{Event, Location, Profile, Record, RecordKind, Tag, Task, User, tags};
