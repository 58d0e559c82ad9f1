//! Immutable data types: the manifest model, configuration and events.

mod config;
mod event;
mod manifest;

pub use config::{AssemblyConfig, MalformedFragmentPolicy};
pub use event::{AssemblyEvent, AttemptId, Discard, EventKind};
pub use manifest::{Assembled, FragmentSpec, Fragments, Manifest};
