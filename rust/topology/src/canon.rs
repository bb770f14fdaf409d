// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinate canonicalization.
//!
//! Welding identifies geometry through string keys, so every point must map
//! to one stable name. [`PointKeyer`] rounds each coordinate at a configured
//! decimal precision and formats it fixed-point; two points collide exactly
//! when all three coordinates round to the same values. [`Transform`] applies
//! the source document's per-axis quantization (`raw * scale + translate`)
//! before any keying happens.

use citycmap_core::TransformSpec;
use nalgebra::Point3;

/// Produces canonical string keys for points at a fixed decimal precision.
#[derive(Debug, Clone, Copy)]
pub struct PointKeyer {
    precision: usize,
}

impl PointKeyer {
    /// Creates a keyer rounding at `precision` decimal digits.
    pub fn new(precision: usize) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Canonical name of a point, e.g. `1.250-0.000-3.142`.
    pub fn key(&self, p: &Point3<f64>) -> String {
        format!(
            "{:.prec$}-{:.prec$}-{:.prec$}",
            self.round(p.x),
            self.round(p.y),
            self.round(p.z),
            prec = self.precision
        )
    }

    /// Directed edge key from two point keys.
    pub fn edge_key(&self, from: &str, to: &str) -> String {
        format!("{from}-{to}")
    }

    fn round(&self, v: f64) -> f64 {
        let ex = 10f64.powi(self.precision as i32);
        let r = (v * ex).round() / ex;
        // Collapse negative zero so -0.0001 and 0.0001 share a key at p=3.
        if r == 0.0 {
            0.0
        } else {
            r
        }
    }
}

impl Default for PointKeyer {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Per-axis affine transform applied to raw source coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: [f64; 3],
    pub translate: [f64; 3],
}

impl Transform {
    /// The identity transform, used when the source has no transform block.
    pub fn identity() -> Self {
        Self {
            scale: [1.0, 1.0, 1.0],
            translate: [0.0, 0.0, 0.0],
        }
    }

    /// Builds the transform from an optional source spec.
    pub fn from_spec(spec: Option<&TransformSpec>) -> Self {
        match spec {
            Some(t) => Self {
                scale: t.scale,
                translate: t.translate,
            },
            None => Self::identity(),
        }
    }

    /// Applies `raw * scale + translate` per axis.
    pub fn apply(&self, raw: [f64; 3]) -> Point3<f64> {
        Point3::new(
            raw[0] * self.scale[0] + self.translate[0],
            raw[1] * self.scale[1] + self.translate[1],
            raw[2] * self.scale[2] + self.translate[2],
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
