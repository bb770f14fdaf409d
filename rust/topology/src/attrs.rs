// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute records shared by the darts of a cell.
//!
//! Vertex records carry geometry (the shared point); face and volume records
//! carry ownership and semantics copied from the source objects. All records
//! live in arenas keyed by [`crate::keys`] types and are referenced by every
//! dart of the cell they describe.

use nalgebra::Point3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::keys::DartId;

/// Free-form key → value properties copied from a source object.
pub type Properties = FxHashMap<String, String>;

/// Display color of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Deterministic pseudo-random color from a seed (splitmix64 step).
    ///
    /// Default volume colors must be stable across runs so that exports and
    /// repeated finalizer passes compare equal.
    pub fn from_seed(seed: u64) -> Self {
        let mut z = seed.wrapping_add(0x9e3779b97f4a7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^= z >> 31;
        Self {
            r: (z & 0xff) as u8,
            g: ((z >> 8) & 0xff) as u8,
            b: ((z >> 16) & 0xff) as u8,
        }
    }

    /// Hex name, e.g. `#1fa055`.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Attribute record of a 0-cell: the shared point and its source identity.
#[derive(Debug, Clone)]
pub struct VertexInfo {
    pub point: Point3<f64>,
    /// Index into the source document's vertex table, when known.
    pub external: Option<u64>,
    /// Darts currently referencing this record. Maintained by the store so
    /// welds can merge two records in time linear in the smaller one.
    pub(crate) darts: Vec<DartId>,
}

impl VertexInfo {
    pub(crate) fn new(point: Point3<f64>, external: Option<u64>) -> Self {
        Self {
            point,
            external,
            darts: Vec::new(),
        }
    }
}

/// Semantic surface classification of a face, e.g. `RoofSurface`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticTag {
    /// Index into the owning geometry's surface table.
    pub index: u32,
    pub kind: String,
}

/// Attribute record of a 2-cell: ownership and classification.
///
/// When two half-faces of adjacent solids are 3-sewn they share one record;
/// the object processed later overwrites the ownership fields.
#[derive(Debug, Clone, Default)]
pub struct FaceInfo {
    pub object_id: String,
    /// Geometry index within the owning object.
    pub geometry: Option<u32>,
    /// Shell (solid boundary) index within the geometry.
    pub shell: Option<u32>,
    pub semantic: Option<SemanticTag>,
}

/// Attribute record of a 3-cell: ownership, display state, properties.
#[derive(Debug, Clone)]
pub struct VolumeInfo {
    pub guid: String,
    pub color: Color,
    pub visible: bool,
    pub filled: bool,
    pub properties: Properties,
}

impl VolumeInfo {
    /// A fresh record with the given color: visible, filled, unowned.
    pub fn with_color(color: Color) -> Self {
        Self {
            guid: String::new(),
            color,
            visible: true,
            filled: true,
            properties: Properties::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_colors_are_stable() {
        assert_eq!(Color::from_seed(7), Color::from_seed(7));
        assert_ne!(Color::from_seed(7), Color::from_seed(8));
    }

    #[test]
    fn hex_formatting() {
        let c = Color { r: 31, g: 160, b: 85 };
        assert_eq!(c.hex(), "#1fa055");
    }

    #[test]
    fn default_volume_state() {
        let v = VolumeInfo::with_color(Color::from_seed(0));
        assert!(v.guid.is_empty());
        assert!(v.visible);
        assert!(v.filled);
        assert!(v.properties.is_empty());
    }
}
