//! Type-system configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeSystemConfig {
    /// Parametric types to register at bootstrap, e.g. `array(bigint)`.
    /// Built-in scalar types are always registered.
    pub extra_types: Vec<String>,

    /// Variable-width values are cut to this many bytes when displayed.
    pub display_max_bytes: usize,
}

impl Default for TypeSystemConfig {
    fn default() -> Self {
        Self {
            extra_types: Vec::new(),
            display_max_bytes: 256,
        }
    }
}

impl TypeSystemConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TYPEDVAL_EXTRA_TYPES`: `;`-separated type signatures
    /// - `TYPEDVAL_DISPLAY_MAX_BYTES`: display truncation limit
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TYPEDVAL_EXTRA_TYPES") {
            cfg.extra_types = parse_type_list(&s);
        }

        if let Ok(s) = std::env::var("TYPEDVAL_DISPLAY_MAX_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.display_max_bytes = v;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.display_max_bytes == 0 {
            return Err(Error::Config("display_max_bytes must be positive".into()));
        }
        if let Some(blank) = self.extra_types.iter().find(|s| s.trim().is_empty()) {
            return Err(Error::Config(format!("blank entry in extra_types: {blank:?}")));
        }
        Ok(())
    }
}

// Signatures contain commas (`row(a, b)`), so the list separator is `;`.
fn parse_type_list(s: &str) -> Vec<String> {
    s.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_list_splits_on_semicolons_only() {
        let parsed = parse_type_list(" array(bigint) ; row(bigint, varchar);;");
        assert_eq!(parsed, vec!["array(bigint)", "row(bigint, varchar)"]);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: TypeSystemConfig = serde_json::from_str(r#"{"extra_types":["array(double)"]}"#).unwrap();
        assert_eq!(cfg.display_max_bytes, 256);
        assert_eq!(cfg.extra_types, vec!["array(double)"]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_display_limit_is_rejected() {
        let cfg = TypeSystemConfig {
            display_max_bytes: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }
}
