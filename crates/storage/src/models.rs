//! Descriptors for files the engine reports as produced.

use serde::{Deserialize, Serialize};

/// The `type` value of a genuine output artifact.  Anything else (`temp`,
/// `preview`, ...) is an intermediate file and is never materialized.
pub const OUTPUT_KIND: &str = "output";

/// One file named in an engine completion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFileDescriptor {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    OUTPUT_KIND.to_string()
}

impl OutputFileDescriptor {
    /// Convenience constructor for an `output`-typed file at the output root.
    pub fn output(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            subfolder: String::new(),
            kind: default_kind(),
        }
    }

    pub fn is_output(&self) -> bool {
        self.kind == OUTPUT_KIND
    }
}
