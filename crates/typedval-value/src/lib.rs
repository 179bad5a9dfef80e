#![forbid(unsafe_code)]
//! typedval-value: the self-describing `(type, value-or-null)` pair.
//!
//! A `TypedValue` resolves its equality and hash operators once, at
//! construction, and keeps them for its lifetime. Null handling lives here,
//! not in the per-type operators: two nulls of the same type are equal, and a
//! null hashes to its type's identity hash.
//!
//! Wire surfaces:
//! - `bridge`: one value <-> one position of a columnar `Block`.
//! - `serial`: `{type, block}` envelope, serde-serializable.

pub mod bridge;
pub mod display;
pub mod serial;
pub mod value;

pub use bridge::{from_block, read_native, to_block, write_native};
pub use serial::SerializableValue;
pub use value::{TypedValue, EQUAL_CONVENTION, HASH_CONVENTION};
