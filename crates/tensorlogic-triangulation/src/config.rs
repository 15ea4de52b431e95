//! Triangulation configuration.

use serde::{Deserialize, Serialize};

/// Options of a triangulation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationConfig {
    /// Remove redundant fill-in edges after elimination (recursive thinning)
    pub minimality_required: bool,
    /// Keep the set of fill-in edges added by the elimination
    pub fill_ins_required: bool,
}

impl TriangulationConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a minimal triangulation.
    pub fn with_minimality(mut self, required: bool) -> Self {
        self.minimality_required = required;
        self
    }

    /// Request the fill-in edges.
    pub fn with_fill_ins(mut self, required: bool) -> Self {
        self.fill_ins_required = required;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = TriangulationConfig::new()
            .with_minimality(true)
            .with_fill_ins(true);
        assert!(config.minimality_required);
        assert!(config.fill_ins_required);
        assert_eq!(TriangulationConfig::default(), TriangulationConfig::new());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TriangulationConfig =
            serde_json::from_str(r#"{ "minimality_required": true }"#).unwrap();
        assert!(config.minimality_required);
        assert!(!config.fill_ins_required);
    }
}
