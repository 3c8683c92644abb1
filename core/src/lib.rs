//! Cairn Core Types
//!
//! This crate provides the foundational types shared by every Cairn crate:
//! - Absolute repository paths with same-name-sibling indices (Path, PathSegment)
//! - Property types and values (PropertyType, Value, PropertyData)
//! - Item snapshots handed out by a session (Node, Property, Item)
//! - Permission action names
//! - Well-known names and common error types

mod error;
mod item;
pub mod names;
mod path;
mod permission;
mod value;

pub use error::*;
pub use item::*;
pub use path::*;
pub use permission::*;
pub use value::*;
