//! structbind core library.
//!
//! Binds raw text onto typed struct fields. `#[derive(Bindable)]` classifies every field of a
//! struct into a [`FieldKind`] at compile time; [`extract`] turns that into a flat, cached
//! [`MetadataTable`] per type, and [`assign_to_field`] converts a raw string into one field by
//! name.
//!
//! ```text
//! #[derive(Bindable, Default)]
//! struct Listen {
//!     port: u16,
//!     #[bind(tag = r#"config_format:"snake""#)]
//!     host: String,
//! }
//!
//! #[derive(Bindable, Default)]
//! struct Server {
//!     #[bind(flatten)]
//!     listen: Listen,
//!     started: Option<chrono::DateTime<chrono::Utc>>,
//! }
//!
//! let mut server = Server::default();
//! structbind::assign_to_field(&mut server, "port", "8080")?;
//! structbind::assign_to_field(&mut server, "started", "2024-01-01T12:34:56Z")?;
//! ```
//!
//! The [`config`] and [`params`] modules build on the engine to fill structs from environment
//! variables and from HTTP requests.

extern crate self as structbind;

pub mod assign;
pub mod cache;
pub mod config;
pub mod convert;
pub mod errors;
pub mod metadata;
pub mod params;
pub mod registry;
pub mod stringcase;
pub mod types;
pub mod validate;

pub use assign::{assign_any, assign_to_field};
pub use cache::Cache;
pub use config::EnvProcessor;
pub use convert::FromText;
pub use errors::*;
pub use metadata::{Bindable, MetadataBuilder, extract};
pub use structbind_macros::Bindable;
pub use types::{FieldDescriptor, FieldKind, MetadataTable};
pub use validate::Validate;

// Re-exported for the derive macro's registration code.
#[doc(hidden)]
pub use inventory;
