// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Welding indices and the weld algorithm.
//!
//! Three keyed lookup structures let the builder find an existing, still
//! available counterpart to pair with instead of creating a duplicate:
//!
//! - the **vertex index** maps a point key to the darts at that location
//!   that are still free on some side; one location hosts several darts at
//!   once, one per incident edge-end, each claimed independently;
//! - the **edge index** holds one pending half-edge per directed edge key,
//!   waiting for the opposite traversal to 2-sew with;
//! - the **face index** holds one pending half-face per rotation-normalized
//!   signature, waiting for its mirror image to 3-sew with.
//!
//! Edge welding is directional and order-dependent by design: whichever ring
//! is processed first leaves its half-edge pending, and the next ring that
//! traverses the same edge in the opposite direction completes the pairing.
//! A second *same-direction* registration of a pending key means the input
//! exceeds the supported two-half-faces-per-face model and is rejected as an
//! invariant violation.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::canon::PointKeyer;
use crate::error::{Error, Result};
use crate::keys::DartId;
use crate::store::CellStore;

/// Mutable welding state for one run (or one object, in reset mode).
#[derive(Debug, Default)]
pub struct WeldIndex {
    keyer: PointKeyer,
    vertex: FxHashMap<String, Vec<DartId>>,
    edge: FxHashMap<String, DartId>,
    face: FxHashMap<String, DartId>,
}

impl WeldIndex {
    pub fn new(keyer: PointKeyer) -> Self {
        Self {
            keyer,
            vertex: FxHashMap::default(),
            edge: FxHashMap::default(),
            face: FxHashMap::default(),
        }
    }

    pub fn keyer(&self) -> &PointKeyer {
        &self.keyer
    }

    /// Clears all three indices. Used by the per-object reset mode, which
    /// bounds index memory at the cost of welding across objects.
    pub fn reset(&mut self) {
        self.vertex.clear();
        self.edge.clear();
        self.face.clear();
    }

    /// Number of half-edges still waiting for their opposite traversal.
    pub fn pending_edge_count(&self) -> usize {
        self.edge.len()
    }

    /// Number of half-faces still waiting for their mirror image.
    pub fn pending_face_count(&self) -> usize {
        self.face.len()
    }

    /// Iterates the pending edge keys and their darts.
    pub fn pending_edges(&self) -> impl Iterator<Item = (&str, DartId)> {
        self.edge.iter().map(|(k, &d)| (k.as_str(), d))
    }

    /// Finds or creates a dart at `point` that is free in `free_dim`.
    ///
    /// A reused dart is removed from the index immediately; a created dart
    /// is registered under the point key so later edge-ends at the same
    /// location can claim it.
    pub fn weld_vertex(
        &mut self,
        store: &mut CellStore,
        point: Point3<f64>,
        external: Option<u64>,
        free_dim: usize,
    ) -> DartId {
        let key = self.keyer.key(&point);

        if let Some(candidates) = self.vertex.get_mut(&key) {
            if let Some(pos) = candidates.iter().position(|&d| store.is_free(d, free_dim)) {
                let found = candidates.remove(pos);
                if candidates.is_empty() {
                    self.vertex.remove(&key);
                }
                return found;
            }
        }

        let created = store.create_dart(point, external);
        self.vertex.entry(key).or_default().push(created);
        created
    }

    /// Welds one oriented edge from `a` to `b`.
    ///
    /// Returns `None` when both points resolve to the same key (a degenerate
    /// repeated vertex — a no-op edge). Otherwise 1-sews a half-edge and
    /// either 2-sews it with the pending opposite traversal (consuming both
    /// keys) or leaves its forward key pending.
    pub fn weld_edge(
        &mut self,
        store: &mut CellStore,
        a: Point3<f64>,
        b: Point3<f64>,
        ext_a: Option<u64>,
        ext_b: Option<u64>,
    ) -> Result<Option<DartId>> {
        let key_a = self.keyer.key(&a);
        let key_b = self.keyer.key(&b);
        if key_a == key_b {
            return Ok(None);
        }

        let head = self.weld_vertex(store, a, ext_a, 1);
        let tail = self.weld_vertex(store, b, ext_b, 0);
        store.sew1(head, tail)?;

        let forward = self.keyer.edge_key(&key_a, &key_b);
        let reverse = self.keyer.edge_key(&key_b, &key_a);

        if let Some(mirror) = self.edge.remove(&reverse) {
            tracing::debug!(edge = %forward, "2-sewing with pending mirror");
            store.sew2(head, mirror)?;
        } else if self.edge.contains_key(&forward) {
            return Err(Error::PendingEdge(forward));
        } else {
            self.edge.insert(forward, head);
        }

        Ok(Some(head))
    }

    /// Welds a completed ring as a half-face.
    ///
    /// The caller guarantees the ring produced more than two distinct edges.
    /// If the inverse signature is pending, the two boundary cycles are
    /// 3-sewn into one shared face and both entries are consumed; otherwise
    /// the forward signature is left pending.
    pub fn weld_face(&mut self, store: &mut CellStore, darts: &[DartId]) -> Result<()> {
        let (forward, canonical) = self.face_signature(store, darts, true);
        let (inverse, _) = self.face_signature(store, darts, false);

        if let Some(mirror) = self.face.remove(&inverse) {
            tracing::debug!(face = %forward, "3-sewing with pending mirror face");
            store.sew3(canonical, mirror)?;
        } else if self.face.contains_key(&forward) {
            return Err(Error::PendingFace(forward));
        } else {
            self.face.insert(forward, canonical);
        }

        Ok(())
    }

    /// Rotation-normalized signature of a ring's face cycle.
    ///
    /// Starts at the dart with the lexicographically smallest vertex key and
    /// concatenates vertex keys walking forward (`links[1]`) or backward
    /// (`links[0]`). A ring and its mirror image share the same starting
    /// vertex, so the mirror's forward signature equals this ring's inverse.
    pub fn face_signature(
        &self,
        store: &CellStore,
        darts: &[DartId],
        forward: bool,
    ) -> (String, DartId) {
        debug_assert!(!darts.is_empty());

        let mut lowest = darts[0];
        let mut lowest_key = self.keyer.key(&store.point(lowest));
        for &d in &darts[1..] {
            let key = self.keyer.key(&store.point(d));
            if key < lowest_key {
                lowest_key = key;
                lowest = d;
            }
        }

        let dim = if forward { 1 } else { 0 };
        let mut signature = lowest_key;
        let mut cursor = store.beta(lowest, dim);
        while let Some(d) = cursor {
            if d == lowest {
                break;
            }
            signature.push('-');
            signature.push_str(&self.keyer.key(&store.point(d)));
            cursor = store.beta(d, dim);
        }

        (signature, lowest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    /// Welds a ring of points, returning the darts of its distinct edges.
    fn weld_ring(index: &mut WeldIndex, store: &mut CellStore, pts: &[Point3<f64>]) -> Vec<DartId> {
        let mut darts = Vec::new();
        for i in 0..pts.len() {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            if let Some(d) = index.weld_edge(store, a, b, None, None).unwrap() {
                darts.push(d);
            }
        }
        if darts.len() > 2 {
            index.weld_face(store, &darts).unwrap();
        }
        darts
    }

    #[test]
    fn ring_consumes_its_own_vertex_entries() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();

        weld_ring(
            &mut index,
            &mut store,
            &[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
        );

        // Each dart was claimed once as 1-free and once as 0-free.
        assert!(index.vertex.is_empty());
        assert_eq!(store.dart_count(), 3);
        assert_eq!(index.pending_edge_count(), 3);
    }

    #[test]
    fn degenerate_pair_is_a_noop_edge() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();

        let result = index
            .weld_edge(
                &mut store,
                p(1.0, 2.0, 3.0),
                p(1.0001, 2.0, 3.0),
                None,
                None,
            )
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.dart_count(), 0);
        assert_eq!(index.pending_edge_count(), 0);
    }

    #[test]
    fn opposite_traversals_2_sew_and_consume_both_keys() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();

        let ab = index
            .weld_edge(&mut store, p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), None, None)
            .unwrap()
            .unwrap();
        assert_eq!(index.pending_edge_count(), 1);

        let ba = index
            .weld_edge(&mut store, p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.0), None, None)
            .unwrap()
            .unwrap();

        assert_eq!(index.pending_edge_count(), 0);
        assert_eq!(store.beta(ab, 2), Some(ba));
        assert_eq!(store.beta(ba, 2), Some(ab));
    }

    #[test]
    fn same_direction_duplicate_is_fatal() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();

        index
            .weld_edge(&mut store, p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), None, None)
            .unwrap();
        let err = index
            .weld_edge(&mut store, p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), None, None)
            .unwrap_err();

        assert!(matches!(err, Error::PendingEdge(_)));
    }

    #[test]
    fn mirror_rings_3_sew_into_one_face() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();

        let tri = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0)];
        let mirror = [p(0.0, 0.0, 0.0), p(0.0, 2.0, 0.0), p(2.0, 0.0, 0.0)];

        let first = weld_ring(&mut index, &mut store, &tri);
        assert_eq!(index.pending_face_count(), 1);

        weld_ring(&mut index, &mut store, &mirror);
        assert_eq!(index.pending_face_count(), 0);

        for d in first {
            assert!(store.beta(d, 3).is_some());
        }
    }

    #[test]
    fn identical_rings_conflict_instead_of_sewing() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();

        let tri = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0)];
        weld_ring(&mut index, &mut store, &tri);

        // The same traversal again registers a directed edge key that is
        // still pending from the first ring.
        let err = index
            .weld_edge(&mut store, tri[0], tri[1], None, None)
            .unwrap_err();
        assert!(matches!(err, Error::PendingEdge(_)));
    }

    #[test]
    fn signature_starts_at_lowest_vertex_key() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();

        // Ring deliberately not starting at the lowest corner.
        let ring = weld_ring(
            &mut index,
            &mut store,
            &[p(2.0, 0.0, 0.0), p(0.0, 2.0, 0.0), p(0.0, 0.0, 0.0)],
        );

        let (sig, canonical) = index.face_signature(&store, &ring, true);
        assert!(sig.starts_with("0.000-0.000-0.000"));
        assert_eq!(
            index.keyer.key(&store.point(canonical)),
            "0.000-0.000-0.000"
        );
    }

    #[test]
    fn reset_clears_all_indices() {
        let mut index = WeldIndex::default();
        let mut store = CellStore::new();

        weld_ring(
            &mut index,
            &mut store,
            &[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
        );
        assert!(index.pending_edge_count() > 0);

        index.reset();
        assert_eq!(index.pending_edge_count(), 0);
        assert_eq!(index.pending_face_count(), 0);
        assert!(index.vertex.is_empty());
    }
}
