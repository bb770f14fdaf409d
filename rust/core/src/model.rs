// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The city-model object tree.
//!
//! This is the narrow interface between source-format parsing and the
//! topology builder: objects own geometries, geometries own shells, shells
//! own polygon rings, and rings index into the model's shared vertex table.
//! Coordinates in the table are raw (pre-transform) values; the optional
//! [`TransformSpec`] records the per-axis quantization the consumer must
//! apply (`raw * scale + translate`).

use rustc_hash::FxHashMap;

/// Per-axis scale and offset recovered from the source document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSpec {
    pub scale: [f64; 3],
    pub translate: [f64; 3],
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0, 1.0],
            translate: [0.0, 0.0, 0.0],
        }
    }
}

/// A complete city model: vertex table, optional transform, ordered objects.
///
/// Objects are kept in deterministic order (the CityJSON reader sorts them by
/// identifier); the topology builder's welding behavior depends on visiting
/// them in a stable sequence.
#[derive(Debug, Clone, Default)]
pub struct CityModel {
    pub objects: Vec<CityObject>,
    pub vertices: Vec<[f64; 3]>,
    pub transform: Option<TransformSpec>,
}

impl CityModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw vertex to the shared table, returning its index.
    pub fn push_vertex(&mut self, v: [f64; 3]) -> usize {
        self.vertices.push(v);
        self.vertices.len() - 1
    }

    /// Builds a ring from raw points, appending each to the vertex table.
    ///
    /// Every point gets its own table entry even when coordinates repeat, so
    /// rings built this way never share vertex indices. Any identification of
    /// coincident points is left to the consumer's welding stage.
    pub fn ring_from_points(&mut self, points: &[[f64; 3]]) -> Ring {
        let indices = points.iter().map(|&p| self.push_vertex(p)).collect();
        Ring { indices }
    }
}

/// One city object: identifier, type tag, free-form attributes, geometries
/// and nested children.
#[derive(Debug, Clone, Default)]
pub struct CityObject {
    pub id: String,
    /// Source type tag, e.g. `Building` or `BridgePart`.
    pub kind: String,
    pub attributes: FxHashMap<String, String>,
    pub geometries: Vec<Geometry>,
    pub children: Vec<CityObject>,
}

impl CityObject {
    /// Creates an object with the given identifier and type tag.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }
}

/// The closed set of geometry kinds the builder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// An open (or at least not volume-bounding) collection of polygons.
    MultiSurface,
    /// One or more closed shells bounding a volume.
    Solid,
}

/// One geometry of an object.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub kind: GeometryKind,
    /// Level of detail as written in the source (`"1"`, `"2.2"`, ...).
    pub lod: Option<String>,
    /// One shell for a multi-surface, one per closed boundary for a solid.
    pub shells: Vec<Shell>,
    /// Semantic surface table; ring tags index into this.
    pub surfaces: Vec<SemanticSurface>,
}

impl Geometry {
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            lod: None,
            shells: Vec::new(),
            surfaces: Vec::new(),
        }
    }
}

/// A semantic surface classification, e.g. `RoofSurface` or `WallSurface`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticSurface {
    pub kind: String,
}

/// A sequence of polygon rings forming one surface patch or closed boundary.
#[derive(Debug, Clone, Default)]
pub struct Shell {
    pub rings: Vec<Ring>,
    /// Optional per-ring semantic tags, parallel to `rings`. Each entry is an
    /// index into the owning geometry's surface table, or `None` when the
    /// source left that ring unclassified.
    pub ring_tags: Option<Vec<Option<u32>>>,
}

impl Shell {
    pub fn from_rings(rings: Vec<Ring>) -> Self {
        Self {
            rings,
            ring_tags: None,
        }
    }
}

/// A polygon boundary: ordered vertex-table indices, first point not repeated.
#[derive(Debug, Clone, Default)]
pub struct Ring {
    pub indices: Vec<usize>,
}

impl Ring {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }
}
