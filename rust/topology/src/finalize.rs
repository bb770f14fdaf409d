// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Finalization and structural statistics.
//!
//! After all objects are processed, any cell the propagator never reached
//! still needs an attribute record: untouched volumes get a deterministic
//! color, visible + filled flags, an empty GUID and no properties; untouched
//! faces get an unowned record. Running the pass twice changes nothing.

use serde::Serialize;

use crate::store::CellStore;

/// Creates default attributes for every cell that has none yet.
///
/// Idempotent: darts that already carry both attributes are left untouched.
pub fn fill_defaults(store: &mut CellStore) {
    let darts: Vec<_> = store.darts().collect();
    for d in darts {
        store.ensure_volume(d);
        store.ensure_face(d);
    }
}

/// Structural statistics of a built map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Characteristics {
    /// Objects processed by the builder.
    pub objects: usize,
    /// Geometries built (after level-of-detail filtering).
    pub geometries: usize,
    pub darts: usize,
    /// Cell counts per dimension 0..=3.
    pub cells: [usize; 4],
    /// All links mutual and no dart missing a required attribute.
    pub valid: bool,
}

impl Characteristics {
    pub fn compute(store: &CellStore, objects: usize, geometries: usize) -> Self {
        Self {
            objects,
            geometries,
            darts: store.dart_count(),
            cells: [
                store.vertex_count(),
                store.edge_count(),
                store.face_count(),
                store.volume_count(),
            ],
            valid: store.is_valid(),
        }
    }
}
