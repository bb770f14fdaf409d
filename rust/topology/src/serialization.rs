// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Neighbor-table export.
//!
//! Serializes the map as one record per dart, in stable creation order:
//! the dart's neighbor in each dimension 1..=3 (`-1` when free), its owning
//! volume GUID, its vertex's external identifier and its face's ownership
//! ids. The format is designed to be embedded in or alongside the source
//! document, and the link graph can be reconstructed from it exactly.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keys::DartId;
use crate::store::CellStore;

/// Sentinel for a free link slot or an absent identifier.
const FREE: i64 = -1;

/// One dart's row in the neighbor table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DartRecord {
    pub id: usize,
    /// Peer ids in dimensions 1, 2 and 3; `-1` when free.
    pub links: [i64; 3],
    pub volume_guid: String,
    /// Source vertex-table index, `-1` when unknown.
    pub vertex_id: i64,
    pub face_geometry: i64,
    pub face_solid: i64,
    pub face_semantic: i64,
}

/// The full neighbor table of a built map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DartTable {
    pub count: usize,
    pub darts: Vec<DartRecord>,
}

impl DartTable {
    /// Builds the table from a store, numbering darts in creation order.
    pub fn from_store(store: &CellStore) -> Self {
        let mut sequence: FxHashMap<DartId, usize> = FxHashMap::default();
        for (i, d) in store.darts().enumerate() {
            sequence.insert(d, i);
        }

        let darts = store
            .darts()
            .enumerate()
            .map(|(i, d)| {
                let links = [1, 2, 3].map(|dim| {
                    store
                        .beta(d, dim)
                        .map_or(FREE, |peer| sequence[&peer] as i64)
                });

                let volume_guid = store
                    .volume_of(d)
                    .map(|v| store.volume_info(v).guid.clone())
                    .unwrap_or_default();

                let vertex_id = store
                    .vertex_info(store.vertex_of(d))
                    .external
                    .map_or(FREE, |e| e as i64);

                let (face_geometry, face_solid, face_semantic) = store
                    .face_of(d)
                    .map(|f| {
                        let info = store.face_info(f);
                        (
                            info.geometry.map_or(FREE, i64::from),
                            info.shell.map_or(FREE, i64::from),
                            info.semantic.as_ref().map_or(FREE, |s| i64::from(s.index)),
                        )
                    })
                    .unwrap_or((FREE, FREE, FREE));

                DartRecord {
                    id: i,
                    links,
                    volume_guid,
                    vertex_id,
                    face_geometry,
                    face_solid,
                    face_semantic,
                }
            })
            .collect();

        Self {
            count: store.dart_count(),
            darts,
        }
    }

    /// Serializes the table to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserializes a table from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Reconstructs the link graph as a fresh store.
    ///
    /// Every dart and every link is restored exactly; vertex records keep
    /// only their external identifier (the table carries no coordinates),
    /// and face/volume records are not rebuilt.
    pub fn restore_links(&self) -> Result<CellStore> {
        if self.darts.len() != self.count {
            return Err(Error::Serialization(format!(
                "table claims {} darts but has {} records",
                self.count,
                self.darts.len()
            )));
        }

        let mut store = CellStore::new();
        let ids: Vec<DartId> = self
            .darts
            .iter()
            .map(|rec| {
                let external = (rec.vertex_id >= 0).then_some(rec.vertex_id as u64);
                store.create_dart(nalgebra::Point3::origin(), external)
            })
            .collect();

        for (i, rec) in self.darts.iter().enumerate() {
            for (slot, dim) in [(0usize, 1usize), (1, 2), (2, 3)] {
                let peer = rec.links[slot];
                if peer == FREE {
                    continue;
                }
                let peer = usize::try_from(peer)
                    .ok()
                    .filter(|&p| p < self.count && p != i)
                    .ok_or_else(|| {
                        Error::Serialization(format!("record {i} links to invalid dart {peer}"))
                    })?;

                if dim == 1 {
                    store.link(ids[i], ids[peer], 1)?;
                } else if i < peer {
                    // Involutions appear twice in the table; check that the
                    // mirror record agrees before linking once.
                    if self.darts[peer].links[slot] != i as i64 {
                        return Err(Error::Serialization(format!(
                            "records {i} and {peer} disagree in dimension {dim}"
                        )));
                    }
                    store.link(ids[i], ids[peer], dim)?;
                }
            }
        }

        Ok(store)
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

    fn sample_store() -> CellStore {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();
        // Two triangles sharing one 2-sewn edge.
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
        crate::finalize::fill_defaults(&mut store);
        store
    }

    #[test]
    fn table_numbers_darts_sequentially() {
        let store = sample_store();
        let table = DartTable::from_store(&store);

        assert_eq!(table.count, 6);
        for (i, rec) in table.darts.iter().enumerate() {
            assert_eq!(rec.id, i);
        }
    }

    #[test]
    fn involutions_are_mirrored_in_the_table() {
        let store = sample_store();
        let table = DartTable::from_store(&store);

        for rec in &table.darts {
            for slot in 1..3 {
                let peer = rec.links[slot];
                if peer >= 0 {
                    assert_eq!(table.darts[peer as usize].links[slot], rec.id as i64);
                }
            }
        }
    }

    #[test]
    fn json_round_trip_preserves_records() {
        let table = DartTable::from_store(&sample_store());
        let json = table.to_json().unwrap();
        let restored = DartTable::from_json(&json).unwrap();

        assert_eq!(restored.count, table.count);
        assert_eq!(restored.darts, table.darts);
    }

    #[test]
    fn restore_links_reproduces_the_link_graph() {
        let store = sample_store();
        let table = DartTable::from_store(&store);

        let rebuilt = table.restore_links().unwrap();
        let rebuilt_table = DartTable::from_store(&rebuilt);

        assert_eq!(rebuilt_table.count, table.count);
        for (a, b) in table.darts.iter().zip(&rebuilt_table.darts) {
            assert_eq!(a.links, b.links);
            assert_eq!(a.vertex_id, b.vertex_id);
        }
    }

    #[test]
    fn restore_rejects_disagreeing_involutions() {
        let mut table = DartTable::from_store(&sample_store());
        // Corrupt one side of a 2-link.
        let i = table
            .darts
            .iter()
            .position(|r| r.links[1] >= 0)
            .expect("sample has a 2-sewn edge");
        table.darts[i].links[1] = (table.darts[i].links[1] + 1) % table.count as i64;

        assert!(table.restore_links().is_err());
    }

    #[test]
    fn restore_rejects_bad_count() {
        let mut table = DartTable::from_store(&sample_store());
        table.count += 1;
        assert!(table.restore_links().is_err());
    }
}
