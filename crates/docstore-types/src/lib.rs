//! Foundation types for docstore.
//!
//! docstore keeps typed JSON documents in a flat blob bucket. This crate
//! defines what a document *is* to the storage layer, independent of any
//! backend:
//!
//! - [`ObjectType`] -- the fixed set of document kinds, each with its own
//!   folder (`group`) and metadata filename
//! - [`Timestamped`] -- the capability every stored record carries
//!   (`lastModified` / `lastModifiedBy`)
//! - [`Document`] -- binds a record type to its [`ObjectType`]
//! - [`GenericDocument`], [`Application`], [`Pipeline`] -- concrete records

pub mod document;
pub mod error;
pub mod object_type;
pub mod timestamped;

pub use document::{Application, GenericDocument, Pipeline};
pub use error::TypeError;
pub use object_type::ObjectType;
pub use timestamped::{Document, Timestamped};
