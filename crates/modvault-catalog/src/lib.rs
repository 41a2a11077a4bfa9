//! Typed catalog model, variant selection and paginated listing.
//!
//! - [`model`] - [`CatalogEntry`], [`Version`], [`FileDescriptor`] and their tags
//! - [`select`] - which files of a version are worth archiving
//! - [`client`] - cursor-following listing of the remote catalog

pub mod client;
pub mod model;
pub mod select;

mod error;

pub use client::{
    CatalogClient, CatalogPage, DEFAULT_API_URL, DEFAULT_USER_AGENT, ListingOptions, Pages, TypeFilter,
};
pub use error::{CatalogError, Result};
pub use model::{
    CatalogEntry, FileDescriptor, FileFormat, FileMetadata, Identifier, ModelType, SizeClass,
    Version,
};
pub use select::{FORMAT_PRIORITY, declared_kb, select_files};
