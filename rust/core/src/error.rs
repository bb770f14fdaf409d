// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for city-model ingestion.

use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a city model from a source document.
#[derive(Error, Debug)]
pub enum Error {
    /// The document is syntactically valid JSON but not a usable CityJSON file.
    #[error("invalid CityJSON document: {0}")]
    InvalidDocument(String),

    /// JSON syntax error from the underlying parser.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A boundary ring references a vertex index outside the vertex table.
    #[error("vertex index {index} out of bounds (vertex table has {len} entries)")]
    VertexOutOfBounds { index: usize, len: usize },

    /// A transform block is present but malformed (wrong arity or non-numeric).
    #[error("malformed transform block: {0}")]
    MalformedTransform(String),
}
