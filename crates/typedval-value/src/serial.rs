//! Wire envelope: `{"type": <signature>, "block": <length-one block>}`.
//!
//! A null value is written with a null-flagged block. On read, an absent
//! block is accepted as null as well.

use serde::{Deserialize, Serialize};

use typedval_core::prelude::{Block, Error, Result};
use typedval_operators::OperatorRegistry;

use crate::bridge::{from_block, to_block};
use crate::value::TypedValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableValue {
    #[serde(rename = "type")]
    pub type_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
}

impl SerializableValue {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TypedValue {
    pub fn to_serializable(&self) -> Result<SerializableValue> {
        Ok(SerializableValue {
            type_signature: self.get_type().signature().to_string(),
            block: Some(to_block(self)?),
        })
    }

    /// Resolve the envelope's type against `ops` and decode its single
    /// position.
    pub fn from_serializable(ops: &OperatorRegistry, envelope: &SerializableValue) -> Result<Self> {
        let ty = ops.types().describe(&envelope.type_signature)?;
        let value = match &envelope.block {
            None => TypedValue::as_null(ops, ty)?,
            Some(block) => {
                block.validate()?;
                if block.position_count() != 1 {
                    return Err(Error::CorruptBlock(format!(
                        "serialized value must have exactly one position, found {}",
                        block.position_count()
                    )));
                }
                from_block(ops, ty, block, 0)?
            }
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(ty = %value.get_type(), null = value.is_null(), "decoded typed value");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use typedval_core::{NativeValue, TypeRegistry, TypeSystemConfig};

    fn ops() -> OperatorRegistry {
        let config = TypeSystemConfig {
            extra_types: vec!["array(double)".into()],
            ..TypeSystemConfig::default()
        };
        OperatorRegistry::new(Arc::new(TypeRegistry::bootstrap(&config).unwrap()))
    }

    #[test]
    fn envelope_survives_json() {
        let ops = ops();
        let ty = ops.types().describe("array(double)").unwrap();
        let value = NativeValue::Structural(vec![Some(1.25f64.into()), None]);
        let tv = TypedValue::of(&ops, ty, value).unwrap();
        let json = tv.to_serializable().unwrap().to_json().unwrap();
        assert!(json.starts_with(r#"{"type":"array(double)","block":"#));
        let back =
            TypedValue::from_serializable(&ops, &SerializableValue::from_json(&json).unwrap())
                .unwrap();
        assert_eq!(back.native_value(), tv.native_value());
    }

    #[test]
    fn null_envelope_carries_a_null_flagged_block() {
        let ops = ops();
        let ty = ops.types().describe("bigint").unwrap();
        let env = TypedValue::as_null(&ops, ty).unwrap().to_serializable().unwrap();
        let block = env.block.as_ref().unwrap();
        assert!(block.is_null(0).unwrap());
        assert!(TypedValue::from_serializable(&ops, &env).unwrap().is_null());
    }

    #[test]
    fn absent_block_reads_as_null() {
        let ops = ops();
        let env = SerializableValue::from_json(r#"{"type":"BIGINT"}"#).unwrap();
        let tv = TypedValue::from_serializable(&ops, &env).unwrap();
        assert!(tv.is_null());
        assert_eq!(tv.get_type().signature(), "bigint");
    }

    #[test]
    fn unknown_type_and_multi_position_blocks_are_rejected() {
        let ops = ops();
        let env = SerializableValue {
            type_signature: "geometry".into(),
            block: None,
        };
        assert!(matches!(
            TypedValue::from_serializable(&ops, &env),
            Err(Error::UnknownType(_))
        ));

        let env = SerializableValue {
            type_signature: "boolean".into(),
            block: Some(Block::FixedWidth {
                width: 1,
                data: vec![0, 1],
                nulls: None,
            }),
        };
        assert!(matches!(
            TypedValue::from_serializable(&ops, &env),
            Err(Error::CorruptBlock(_))
        ));
    }
}
