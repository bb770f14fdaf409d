// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for darts and cell attributes.
//!
//! The [`CellStore`] owns every dart and every attribute record. A dart has
//! four neighbor links: `links[1]` is the next dart around the face cycle,
//! `links[0]` the previous one (together they form the 0/1 traversal pair),
//! `links[2]` and `links[3]` are mutual involutions crossing to the opposite
//! side of an edge and of a face. Darts are append-only: once created they
//! only ever gain links.
//!
//! Sewing is the only way links are set. `sew2` and `sew3` also merge the
//! vertex records of the cycles they join, so that after a weld all darts
//! meeting at one corner share a single 0-cell record. Face and volume
//! records are attached lazily through `ensure_face`/`ensure_volume`, which
//! walk the cell orbit and share one record across it.

use nalgebra::Point3;
use rustc_hash::FxHashSet;
use slotmap::SlotMap;

use crate::attrs::{Color, FaceInfo, VertexInfo, VolumeInfo};
use crate::error::{Error, Result};
use crate::keys::{DartId, FaceId, VertexId, VolumeId};

/// The atomic oriented element of the map.
#[derive(Debug, Clone)]
pub struct Dart {
    pub(crate) links: [Option<DartId>; 4],
    pub(crate) vertex: VertexId,
    pub(crate) face: Option<FaceId>,
    pub(crate) volume: Option<VolumeId>,
}

/// Central owner of all darts and attribute records.
#[derive(Debug, Default)]
pub struct CellStore {
    pub(crate) darts: SlotMap<DartId, Dart>,
    pub(crate) vertices: SlotMap<VertexId, VertexInfo>,
    pub(crate) faces: SlotMap<FaceId, FaceInfo>,
    pub(crate) volumes: SlotMap<VolumeId, VolumeInfo>,
}

impl CellStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Dart creation and lookup ---

    /// Creates a free dart at the given point with a fresh vertex record.
    pub fn create_dart(&mut self, point: Point3<f64>, external: Option<u64>) -> DartId {
        let vertex = self.vertices.insert(VertexInfo::new(point, external));
        let dart = self.darts.insert(Dart {
            links: [None; 4],
            vertex,
            face: None,
            volume: None,
        });
        self.vertices[vertex].darts.push(dart);
        dart
    }

    /// The neighbor of `d` in the given dimension, or `None` if free.
    pub fn beta(&self, d: DartId, dim: usize) -> Option<DartId> {
        self.darts[d].links[dim]
    }

    /// `true` when `d` has no neighbor in the given dimension.
    pub fn is_free(&self, d: DartId, dim: usize) -> bool {
        self.darts[d].links[dim].is_none()
    }

    /// The point of the dart's vertex record.
    pub fn point(&self, d: DartId) -> Point3<f64> {
        self.vertices[self.darts[d].vertex].point
    }

    pub fn vertex_of(&self, d: DartId) -> VertexId {
        self.darts[d].vertex
    }

    pub fn face_of(&self, d: DartId) -> Option<FaceId> {
        self.darts[d].face
    }

    pub fn volume_of(&self, d: DartId) -> Option<VolumeId> {
        self.darts[d].volume
    }

    pub fn vertex_info(&self, id: VertexId) -> &VertexInfo {
        &self.vertices[id]
    }

    pub fn face_info(&self, id: FaceId) -> &FaceInfo {
        &self.faces[id]
    }

    pub fn face_info_mut(&mut self, id: FaceId) -> &mut FaceInfo {
        &mut self.faces[id]
    }

    pub fn volume_info(&self, id: VolumeId) -> &VolumeInfo {
        &self.volumes[id]
    }

    pub fn volume_info_mut(&mut self, id: VolumeId) -> &mut VolumeInfo {
        &mut self.volumes[id]
    }

    /// Iterates all darts in creation order.
    pub fn darts(&self) -> impl Iterator<Item = DartId> + '_ {
        self.darts.keys()
    }

    // --- Linking ---

    /// Sets the mutual neighbor relation between `a` and `b` in `dim`.
    ///
    /// Dimension 1 sets the traversal pair (`a.links[1] = b`,
    /// `b.links[0] = a`); dimensions 2 and 3 set the involution on both
    /// sides. Fails if either slot is already occupied.
    pub fn link(&mut self, a: DartId, b: DartId, dim: usize) -> Result<()> {
        debug_assert!((1..=3).contains(&dim));
        debug_assert_ne!(a, b);

        match dim {
            1 => {
                if !self.is_free(a, 1) {
                    return Err(Error::AlreadyLinked(a, 1));
                }
                if !self.is_free(b, 0) {
                    return Err(Error::AlreadyLinked(b, 0));
                }
                self.darts[a].links[1] = Some(b);
                self.darts[b].links[0] = Some(a);
            }
            _ => {
                if !self.is_free(a, dim) {
                    return Err(Error::AlreadyLinked(a, dim));
                }
                if !self.is_free(b, dim) {
                    return Err(Error::AlreadyLinked(b, dim));
                }
                self.darts[a].links[dim] = Some(b);
                self.darts[b].links[dim] = Some(a);
            }
        }
        Ok(())
    }

    /// 1-sew: `b` becomes the next dart after `a` around their face.
    pub fn sew1(&mut self, a: DartId, b: DartId) -> Result<()> {
        self.link(a, b, 1)
    }

    /// 2-sew: `a` and `b` are opposite traversals of the same edge.
    ///
    /// Joins the vertex cycles at both edge ends: `a` starts where `b`'s
    /// successor starts, and vice versa.
    pub fn sew2(&mut self, a: DartId, b: DartId) -> Result<()> {
        self.link(a, b, 2)?;
        if let Some(bn) = self.beta(b, 1) {
            self.merge_vertex_records(a, bn);
        }
        if let Some(an) = self.beta(a, 1) {
            self.merge_vertex_records(b, an);
        }
        Ok(())
    }

    /// 3-sew: the faces of `a` and `b` are the two half-faces of one shared
    /// face between adjacent volumes.
    ///
    /// `a` and `b` are the canonical darts of two mirror-image face cycles
    /// starting at the same vertex. Every dart of `a`'s cycle is paired with
    /// the opposite-direction dart of `b`'s cycle, and the vertex records
    /// along the shared boundary are merged.
    pub fn sew3(&mut self, a: DartId, b: DartId) -> Result<()> {
        if self.face_cycle(a).len() != self.face_cycle(b).len() {
            return Err(Error::FaceCycleMismatch);
        }

        let mut f = a;
        let mut g = self.beta(b, 0).ok_or(Error::FaceCycleMismatch)?;
        loop {
            self.link(f, g, 3)?;
            if let Some(gn) = self.beta(g, 1) {
                self.merge_vertex_records(f, gn);
            }
            f = self.beta(f, 1).ok_or(Error::FaceCycleMismatch)?;
            g = self.beta(g, 0).ok_or(Error::FaceCycleMismatch)?;
            if f == a {
                break;
            }
        }
        Ok(())
    }

    /// Merges the vertex records of two darts, keeping `a`'s record.
    fn merge_vertex_records(&mut self, a: DartId, b: DartId) {
        let keep = self.darts[a].vertex;
        let lose = self.darts[b].vertex;
        if keep == lose {
            return;
        }

        let Some(lost) = self.vertices.remove(lose) else {
            return;
        };
        for d in &lost.darts {
            self.darts[*d].vertex = keep;
        }
        let kept = &mut self.vertices[keep];
        kept.darts.extend(lost.darts);
        if kept.external.is_none() {
            kept.external = lost.external;
        }
    }

    // --- Orbits and cycles ---

    /// All darts reachable from `start` via the given link dimensions.
    ///
    /// Breadth-first, deterministic discovery order starting at `start`.
    pub fn orbit(&self, start: DartId, dims: &[usize]) -> Vec<DartId> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        let mut queue = std::collections::VecDeque::new();

        seen.insert(start);
        queue.push_back(start);
        while let Some(d) = queue.pop_front() {
            result.push(d);
            for &dim in dims {
                if let Some(n) = self.darts[d].links[dim] {
                    if seen.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
        result
    }

    /// The darts of `start`'s face cycle in traversal order.
    ///
    /// For a closed ring this walks `links[1]` once around. For an open
    /// chain (a degenerate ring that never closed) it rewinds to the chain
    /// head first and returns the forward walk from there.
    pub fn face_cycle(&self, start: DartId) -> Vec<DartId> {
        let budget = self.darts.len();

        // Rewind to the chain head, stopping if we loop back to start.
        let mut head = start;
        for _ in 0..budget {
            match self.beta(head, 0) {
                Some(prev) if prev != start => head = prev,
                _ => break,
            }
        }

        let mut cycle = vec![head];
        let mut cursor = head;
        for _ in 0..budget {
            match self.beta(cursor, 1) {
                Some(next) if next != head => {
                    cycle.push(next);
                    cursor = next;
                }
                _ => break,
            }
        }
        cycle
    }

    // --- Lazy cell attributes ---

    /// Returns the volume record of `d`'s 3-cell, creating and sharing a
    /// default record across the whole cell when none exists yet.
    pub fn ensure_volume(&mut self, d: DartId) -> VolumeId {
        if let Some(v) = self.darts[d].volume {
            return v;
        }

        let orbit = self.orbit(d, &[0, 1, 2]);
        let existing = orbit.iter().find_map(|&m| self.darts[m].volume);
        let chosen = match existing {
            Some(v) => v,
            None => {
                let seed = self.volumes.len() as u64;
                self.volumes
                    .insert(VolumeInfo::with_color(Color::from_seed(seed)))
            }
        };

        for m in orbit {
            match self.darts[m].volume {
                Some(v) if v == chosen => {}
                Some(stray) => {
                    // Two records met inside one cell; keep the first.
                    self.volumes.remove(stray);
                    self.darts[m].volume = Some(chosen);
                }
                None => self.darts[m].volume = Some(chosen),
            }
        }
        chosen
    }

    /// Returns the face record of `d`'s 2-cell, creating and sharing a
    /// default record across both half-faces when none exists yet.
    pub fn ensure_face(&mut self, d: DartId) -> FaceId {
        if let Some(f) = self.darts[d].face {
            return f;
        }

        let orbit = self.orbit(d, &[0, 1, 3]);
        let existing = orbit.iter().find_map(|&m| self.darts[m].face);
        let chosen = existing.unwrap_or_else(|| self.faces.insert(FaceInfo::default()));

        for m in orbit {
            match self.darts[m].face {
                Some(f) if f == chosen => {}
                Some(stray) => {
                    self.faces.remove(stray);
                    self.darts[m].face = Some(chosen);
                }
                None => self.darts[m].face = Some(chosen),
            }
        }
        chosen
    }

    // --- Counts ---

    pub fn dart_count(&self) -> usize {
        self.darts.len()
    }

    /// Number of 0-cells (distinct vertex records).
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of 1-cells: orbits of the `{2, 3}` links.
    pub fn edge_count(&self) -> usize {
        let mut seen: FxHashSet<DartId> = FxHashSet::default();
        let mut count = 0;
        for d in self.darts.keys() {
            if seen.contains(&d) {
                continue;
            }
            count += 1;
            for m in self.orbit(d, &[2, 3]) {
                seen.insert(m);
            }
        }
        count
    }

    /// Number of 2-cells (distinct face records).
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of 3-cells (distinct volume records).
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    // --- Validity ---

    /// Checks that every link is correctly mutual and every dart carries the
    /// attributes the finalizer guarantees.
    pub fn is_valid(&self) -> bool {
        for (d, dart) in &self.darts {
            if let Some(n) = dart.links[1] {
                if self.darts[n].links[0] != Some(d) {
                    return false;
                }
            }
            if let Some(p) = dart.links[0] {
                if self.darts[p].links[1] != Some(d) {
                    return false;
                }
            }
            for dim in 2..=3 {
                if let Some(n) = dart.links[dim] {
                    if self.darts[n].links[dim] != Some(d) {
                        return false;
                    }
                }
            }
            if dart.face.is_none() || dart.volume.is_none() {
                return false;
            }
            if !self.vertices.contains_key(dart.vertex) {
                return false;
            }
        }
        true
    }
}
