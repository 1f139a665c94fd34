//! Alias resolution: exact match first, then a unique prefix match

use std::collections::BTreeMap;
use std::ops::Bound;

/// Result of resolving a user-supplied token against an alias table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The token is itself a registered alias
    Exact(&'a str),
    /// The token is a prefix of exactly one alias
    Prefix(&'a str),
    /// The token is a prefix of several aliases, in sorted order
    Ambiguous(Vec<&'a str>),
    NotFound,
}

impl<'a> Resolution<'a> {
    /// The resolved alias, if resolution succeeded
    pub fn alias(&self) -> Option<&'a str> {
        match self {
            Self::Exact(alias) | Self::Prefix(alias) => Some(*alias),
            Self::Ambiguous(_) | Self::NotFound => None,
        }
    }
}

/// Resolve `token` against the keys of `table`
pub fn resolve<'a, V>(table: &'a BTreeMap<String, V>, token: &str) -> Resolution<'a> {
    if let Some((alias, _)) = table.get_key_value(token) {
        return Resolution::Exact(alias);
    }

    // keys sharing a prefix are contiguous in the ordered map
    let candidates: Vec<&'a str> = table
        .range::<str, _>((Bound::Included(token), Bound::Unbounded))
        .map(|(alias, _)| alias.as_str())
        .take_while(|alias| alias.starts_with(token))
        .collect();

    match candidates.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Prefix(candidates[0]),
        _ => Resolution::Ambiguous(candidates),
    }
}
