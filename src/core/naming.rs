//! Operation name decoding
//!
//! An identifier such as `CM_Commit` decodes to the alias `cm` and the
//! display name `Commit`; `Status` decodes to `status` / `Status`.

use crate::error::{MulticallError, Result};
use regex::Regex;

/// Alias and display name decoded from an operation identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpName {
    pub alias: String,
    pub display_name: String,
}

/// Decoder for the `PREFIX_Name` operation naming convention
#[derive(Debug, Clone)]
pub struct NameCodec {
    re_name: Regex,
}

impl NameCodec {
    /// Create a new name codec
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_name: Regex::new(r"^(?:([A-Z]+)_)?([A-Z].*)$")
                .map_err(|e| MulticallError::config(format!("Failed to compile regex: {e}")))?,
        })
    }

    /// Whether `identifier` follows the naming convention
    pub fn is_eligible(&self, identifier: &str) -> bool {
        self.re_name.is_match(identifier)
    }

    /// Decode an operation identifier into its alias and display name
    pub fn decode(&self, identifier: &str) -> Result<OpName> {
        let caps = self
            .re_name
            .captures(identifier)
            .ok_or_else(|| MulticallError::invalid_name(identifier))?;

        let display_name = caps.get(2).map_or("", |m| m.as_str()).to_string();
        if display_name.is_empty() {
            return Err(MulticallError::EmptyDisplayName {
                identifier: identifier.to_string(),
            });
        }

        let alias = match caps.get(1) {
            Some(prefix) => prefix.as_str().to_lowercase(),
            None => display_name.to_lowercase(),
        };

        Ok(OpName {
            alias,
            display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_identifier() {
        let codec = NameCodec::new().unwrap();

        let name = codec.decode("CM_Commit").unwrap();
        assert_eq!(name.alias, "cm");
        assert_eq!(name.display_name, "Commit");

        let name = codec.decode("HTTP_Get_All").unwrap();
        assert_eq!(name.alias, "http");
        assert_eq!(name.display_name, "Get_All");
    }

    #[test]
    fn test_unprefixed_identifier() {
        let codec = NameCodec::new().unwrap();

        let name = codec.decode("Status").unwrap();
        assert_eq!(name.alias, "status");
        assert_eq!(name.display_name, "Status");

        // lowercase right after the first letter: no prefix
        let name = codec.decode("Get_All").unwrap();
        assert_eq!(name.alias, "get_all");
        assert_eq!(name.display_name, "Get_All");

        // prefix with nothing usable after it falls back to the whole name
        let name = codec.decode("CM_commit").unwrap();
        assert_eq!(name.alias, "cm_commit");
        assert_eq!(name.display_name, "CM_commit");
    }

    #[test]
    fn test_invalid_identifiers() {
        let codec = NameCodec::new().unwrap();

        for identifier in ["status", "_Commit", "", "1Up", "cM_Commit"] {
            assert!(
                !codec.is_eligible(identifier),
                "{identifier:?} should not be eligible"
            );
            assert!(matches!(
                codec.decode(identifier),
                Err(MulticallError::InvalidName { .. })
            ));
        }
    }
}
