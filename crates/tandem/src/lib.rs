//! A schema-driven collection API over an indexed key-value store or a
//! relational database.
//!
//! Entities are described by a [`Schema`] and registered with a
//! [`Registry`], each bound to one [`Backend`]. Every registered entity gets
//! a [`Collection`] exposing the same reads and writes whichever backend
//! stores it.

mod accessor;
pub use accessor::{Accessor, Accessors, TypedAccessor};

pub mod collection;
pub use collection::{
    BatchGetResult, Collection, CreateManyResult, ErrorItem, Metadata, QueryOptions, QueryResult,
    ReconcileResult,
};

mod config;
pub use config::Config;

pub mod hooks;
pub use hooks::Hooks;

mod model;
pub use model::{Model, Related};

pub mod pipeline;

pub mod registry;
pub use registry::{connect, Registry};

mod strategy;
pub use strategy::Backend;

pub use tandem_core::{
    async_trait,
    driver::operation::Between,
    record,
    schema::{Attribute, AttributeType, Index, Reference, ReferenceKind},
    stmt::{Direction, Expr, FromValue, Record, Value},
    Error, Result, Schema,
};
