//! Convenient re-exports for downstream crates.

pub use crate::block::{Block, BlockBuilder};
pub use crate::config::TypeSystemConfig;
pub use crate::convention::{
    ArgumentConvention, InvocationConvention, OperatorKind, ReturnConvention,
};
pub use crate::descriptor::{Formatter, Structure, Type, TypeDescriptor};
pub use crate::error::{Error, OperatorFault, Result};
pub use crate::id::TypeId;
pub use crate::registry::{TypeRegistry, TypeRegistryBuilder};
pub use crate::signature::TypeSignature;
pub use crate::types::{NativeValue, RepresentationKind};
