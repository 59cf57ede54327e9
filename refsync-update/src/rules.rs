//! Which files are treated as YAML manifests.

use glob::Pattern;

/// Explicit, enumerable selection of the files to parse as YAML.
/// Everything else is copied through byte-for-byte.
///
/// The defaults — `*.yaml`, `*.yml`, plus extension-less files such as a
/// bare `Kustomization` — match the manifest layouts this engine is
/// pointed at.
#[derive(Debug, Clone)]
pub struct SelectionRules {
    patterns: Vec<Pattern>,
    extensionless: bool,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self::new(&["*.yaml", "*.yml"], true).expect("default patterns are valid")
    }
}

impl SelectionRules {
    /// Build rules from file-name glob patterns and an extension-less
    /// toggle.
    pub fn new(globs: &[&str], extensionless: bool) -> Result<Self, glob::PatternError> {
        let patterns = globs
            .iter()
            .map(|g| Pattern::new(g))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            extensionless,
        })
    }

    /// Whether a file with this name (not path) is treated as YAML.
    pub fn matches(&self, file_name: &str) -> bool {
        if self.patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }
        self.extensionless && !file_name.is_empty() && !file_name.contains('.')
    }
}
