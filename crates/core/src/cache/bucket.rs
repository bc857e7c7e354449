//! Cache bucket kinds.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One of the three cache partitions the worker manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    /// Scripts, stylesheets, images and fonts.
    Static,
    /// JSON data files.
    Data,
    /// HTML pages.
    Html,
}

impl BucketKind {
    pub const ALL: [BucketKind; 3] = [BucketKind::Static, BucketKind::Data, BucketKind::Html];

    pub fn as_str(&self) -> &'static str {
        match self {
            BucketKind::Static => "static",
            BucketKind::Data => "data",
            BucketKind::Html => "html",
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
