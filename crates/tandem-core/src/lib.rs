#[macro_use]
mod macros;

pub mod cursor;

pub mod driver;
pub use driver::{IndexedStore, Relational};

mod error;
pub use error::Error;

pub mod mapping;
pub use mapping::FieldMapper;

pub mod schema;
pub use schema::Schema;

pub mod stmt;

/// A Result type alias that uses Tandem's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
