// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary-mesh export.
//!
//! Emits only the geometry of the built map: deduplicated vertex positions
//! and one polygonal index ring per 2-cell. Faces shared between two volumes
//! appear once. No topology links survive the export.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::keys::VertexId;
use crate::store::CellStore;

/// A polygonal boundary mesh.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SurfaceMesh {
    /// Vertex positions, one entry per welded vertex record.
    pub positions: Vec<[f64; 3]>,
    /// Polygonal faces as index rings into `positions`.
    pub faces: Vec<Vec<u32>>,
}

impl SurfaceMesh {
    /// Extracts the boundary surface of a built map.
    ///
    /// Walks one representative dart per 2-cell in creation order; degenerate
    /// chains with fewer than three vertices are left out.
    pub fn from_store(store: &CellStore) -> Self {
        let mut mesh = SurfaceMesh::default();
        let mut vertex_index: FxHashMap<VertexId, u32> = FxHashMap::default();
        let mut visited = FxHashSet::default();

        for d in store.darts() {
            if visited.contains(&d) {
                continue;
            }
            // Claim both half-faces so a shared face is emitted once.
            for m in store.orbit(d, &[0, 1, 3]) {
                visited.insert(m);
            }

            let cycle = store.face_cycle(d);
            if cycle.len() < 3 {
                continue;
            }

            let face = cycle
                .iter()
                .map(|&c| {
                    let vertex = store.vertex_of(c);
                    *vertex_index.entry(vertex).or_insert_with(|| {
                        let p = store.vertex_info(vertex).point;
                        mesh.positions.push([p.x, p.y, p.z]);
                        (mesh.positions.len() - 1) as u32
                    })
                })
                .collect();
            mesh.faces.push(face);
        }

        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Serializes the mesh to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weld::WeldIndex;
    use nalgebra::Point3;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn weld_ring(index: &mut WeldIndex, store: &mut CellStore, pts: &[Point3<f64>]) {
        let mut darts = Vec::new();
        for i in 0..pts.len() {
            if let Some(d) = index
                .weld_edge(store, pts[i], pts[(i + 1) % pts.len()], None, None)
                .unwrap()
            {
                darts.push(d);
            }
        }
        if darts.len() > 2 {
            index.weld_face(store, &darts).unwrap();
        }
    }

    #[test]
    fn empty_store_gives_empty_mesh() {
        let mesh = SurfaceMesh::from_store(&CellStore::new());
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn two_welded_triangles_share_positions() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();
        weld_ring(
            &mut index,
            &mut store,
            &[p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0)],
        );
        weld_ring(
            &mut index,
            &mut store,
            &[p(2.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(0.0, -2.0, 0.0)],
        );

        let mesh = SurfaceMesh::from_store(&store);
        assert_eq!(mesh.face_count(), 2);
        // The 2-sewn shared edge merged the vertex records it touches.
        assert_eq!(mesh.vertex_count(), 4);
        for face in &mesh.faces {
            assert_eq!(face.len(), 3);
        }
    }

    #[test]
    fn three_sewn_face_is_emitted_once() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();
        let tri = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0)];
        let mirror = [p(0.0, 0.0, 0.0), p(0.0, 2.0, 0.0), p(2.0, 0.0, 0.0)];
        weld_ring(&mut index, &mut store, &tri);
        weld_ring(&mut index, &mut store, &mirror);

        let mesh = SurfaceMesh::from_store(&store);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
    }
}
