//! # Lintel Type Names
//!
//! Human-readable type names for logs, telemetry and error payloads.
//!
//! [`std::any::type_name`] returns fully-qualified paths such as
//! `alloc::collections::btree::map::BTreeMap<alloc::string::String, alloc::vec::Vec<u8>>`.
//! This crate parses such names into a [`TypeDescriptor`] tree and renders
//! them back with configurable detail:
//!
//! - **Built-in aliases**: primitives and prelude types (`String`, `Vec`,
//!   `Option`, `Result`, `Box`) always render by their short name
//! - **Full or short names**: with or without the module path
//! - **Generics**: closed (`Vec<u8>`) and open (`Vec<_>` / `Vec<T>`)
//! - **Nested types**: enclosing types joined by a configurable delimiter
//! - **Arrays of any rank**: `[[u8; 2]; 3]`, `&[[i64]]`
//!
//! ## Example
//!
//! ```
//! use lintel_typename::{short_type_name, type_display_name, TypeDescriptor, TypeNameOptions};
//! use std::collections::BTreeMap;
//!
//! assert_eq!(
//!     type_display_name::<BTreeMap<String, Vec<u8>>>(),
//!     "alloc::collections::btree::map::BTreeMap<String, Vec<u8>>"
//! );
//! assert_eq!(short_type_name::<BTreeMap<String, Vec<u8>>>(), "BTreeMap<String, Vec<u8>>");
//!
//! let ty = TypeDescriptor::of::<[[u16; 2]; 3]>();
//! assert_eq!(ty.rank(), 2);
//! assert_eq!(ty.display_name(&TypeNameOptions::default()), "[[u16; 2]; 3]");
//! ```

#![doc(html_root_url = "https://docs.rs/lintel-typename/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aliases;
mod descriptor;
mod error;
mod format;
mod parse;

pub use descriptor::{ArrayLen, GenericArg, GenericArgs, PathSegment, TypeDescriptor, TypePath};
pub use error::TypeNameError;
pub use format::{format_type_name, short_type_name, type_display_name, TypeNameOptions};
pub use parse::{parse_type_name, MAX_NESTING_DEPTH};
