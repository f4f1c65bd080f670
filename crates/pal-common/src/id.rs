//! Cell identity labels.
//!
//! A cell is identified only by its row label in the embedding. Labels are
//! opaque: no structure is parsed out of them.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque, unique row label of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub String);

impl CellId {
    pub fn new(label: impl Into<String>) -> Self {
        CellId(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CellId {
    fn from(label: &str) -> Self {
        CellId(label.to_string())
    }
}

impl From<String> for CellId {
    fn from(label: String) -> Self {
        CellId(label)
    }
}

impl Borrow<str> for CellId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_cell_id_display() {
        assert_eq!(CellId::new("AAACCTG-1").to_string(), "AAACCTG-1");
    }

    #[test]
    fn test_cell_id_serializes_transparently() {
        let json = serde_json::to_string(&CellId::from("c7")).unwrap();
        assert_eq!(json, "\"c7\"");
        let back: CellId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CellId::from("c7"));
    }

    #[test]
    fn test_cell_id_borrow_lookup() {
        let mut map = HashMap::new();
        map.insert(CellId::from("x"), 1);
        assert_eq!(map.get("x"), Some(&1));
    }
}
