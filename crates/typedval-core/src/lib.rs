#![forbid(unsafe_code)]
//! typedval-core: the leaf layer of the typed-value stack.
//!
//! - `descriptor` / `registry`: immutable per-type metadata, populated once at
//!   bootstrap and shared read-only afterwards.
//! - `types`: the native representation every typed value carries.
//! - `convention`: operator kinds and calling conventions shared by the
//!   operator registry and the value layer.
//! - `block`: the single-value columnar block format used on the wire.
//!
//! No operator dispatch lives here; see `typedval-operators`.

pub mod block;
pub mod config;
pub mod convention;
pub mod descriptor;
pub mod error;
pub mod hash;
pub mod id;
pub mod prelude;
pub mod registry;
pub mod signature;
pub mod types;

pub use block::{Block, BlockBuilder};
pub use config::TypeSystemConfig;
pub use descriptor::{Formatter, Structure, Type, TypeDescriptor};
pub use error::{Error, OperatorFault, Result};
pub use id::TypeId;
pub use registry::{TypeRegistry, TypeRegistryBuilder};
pub use signature::TypeSignature;
pub use types::{NativeValue, RepresentationKind};
