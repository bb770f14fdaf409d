// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The topology builder: walks a city model and drives welding.
//!
//! Construction is strictly sequential — objects in model order, geometries
//! in source order, shells and rings in source order. The welding indices are
//! shared mutable state across the whole traversal, so 2-sew and 3-sew
//! results depend on this deterministic visitation order.
//!
//! Ownership annotation happens once per object, immediately after that
//! object's geometries finish building. It must not be deferred: a later
//! object may 3-sew onto these darts, and the shared face record must already
//! exist by then.

use citycmap_core::{CityModel, CityObject, Geometry, GeometryKind, Ring};
use nalgebra::Point3;

use crate::attrs::SemanticTag;
use crate::canon::{PointKeyer, Transform};
use crate::error::{Error, Result};
use crate::finalize::{self, Characteristics};
use crate::keys::DartId;
use crate::store::CellStore;
use crate::weld::WeldIndex;

/// Processing controls for one build run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Decimal digits used by the coordinate canonicalizer.
    pub precision: usize,
    /// Inclusive start index into the (filtered) object sequence.
    pub start_index: usize,
    /// Maximum number of objects to process, `None` for all.
    pub object_limit: Option<usize>,
    /// Substring filter on object identifiers.
    pub id_filter: Option<String>,
    /// Process only geometries with this level of detail.
    pub lod_filter: Option<String>,
    /// Clear the welding indices after every top-level object. Bounds index
    /// memory; objects no longer weld to each other.
    pub reset_indices_per_object: bool,
    /// Log a structural statistics summary when the build finishes.
    pub compute_stats: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            precision: 3,
            start_index: 0,
            object_limit: None,
            id_filter: None,
            lod_filter: None,
            reset_indices_per_object: false,
            compute_stats: true,
        }
    }
}

/// An input-structure error that aborted one geometry.
#[derive(Debug)]
pub struct GeometryError {
    pub object: String,
    pub geometry: usize,
    pub error: Error,
}

/// The darts of one welded ring, with the provenance the propagator needs.
struct RingDarts {
    geometry: u32,
    shell: u32,
    semantic: Option<SemanticTag>,
    darts: Vec<DartId>,
}

/// Builds a combinatorial map from a city model.
#[derive(Debug)]
pub struct MapBuilder {
    config: BuildConfig,
    store: CellStore,
    index: WeldIndex,
    transform: Transform,
    objects: usize,
    geometries: usize,
    errors: Vec<GeometryError>,
}

impl MapBuilder {
    pub fn new(config: BuildConfig) -> Self {
        let index = WeldIndex::new(PointKeyer::new(config.precision));
        Self {
            config,
            store: CellStore::new(),
            index,
            transform: Transform::identity(),
            objects: 0,
            geometries: 0,
            errors: Vec::new(),
        }
    }

    /// Processes the model's object list and finalizes the map.
    ///
    /// Input-structure errors abort only the geometry that produced them and
    /// are recorded on [`MapBuilder::geometry_errors`]; invariant violations
    /// abort the run. Statistics and logs emitted up to a fault remain
    /// available through [`MapBuilder::characteristics`].
    pub fn build(&mut self, model: &CityModel) -> Result<()> {
        self.transform = Transform::from_spec(model.transform.as_ref());

        let mut position = 0usize;
        let mut taken = 0usize;
        for obj in &model.objects {
            if let Some(filter) = &self.config.id_filter {
                if !obj.id.contains(filter.as_str()) {
                    continue;
                }
            }
            if position < self.config.start_index {
                position += 1;
                continue;
            }
            position += 1;

            if let Some(limit) = self.config.object_limit {
                if taken >= limit {
                    break;
                }
            }
            taken += 1;

            self.build_object(model, obj)?;

            if self.config.reset_indices_per_object {
                self.index.reset();
            }
        }

        finalize::fill_defaults(&mut self.store);

        if self.config.compute_stats {
            let stats = self.characteristics();
            tracing::info!(
                objects = stats.objects,
                geometries = stats.geometries,
                darts = stats.darts,
                vertices = stats.cells[0],
                edges = stats.cells[1],
                faces = stats.cells[2],
                volumes = stats.cells[3],
                valid = stats.valid,
                "map construction finished"
            );
        }

        Ok(())
    }

    fn build_object(&mut self, model: &CityModel, obj: &CityObject) -> Result<()> {
        tracing::debug!(
            object = %obj.id,
            kind = %obj.kind,
            geometries = obj.geometries.len(),
            "building object"
        );
        self.objects += 1;

        let mut built: Vec<RingDarts> = Vec::new();
        for (gi, geom) in obj.geometries.iter().enumerate() {
            if let (Some(filter), Some(lod)) = (&self.config.lod_filter, &geom.lod) {
                if lod != filter {
                    tracing::debug!(object = %obj.id, lod = %lod, "level-of-detail filter skip");
                    continue;
                }
            }

            match self.build_geometry(model, geom, gi as u32) {
                Ok(mut rings) => {
                    self.geometries += 1;
                    built.append(&mut rings);
                }
                Err(e) if e.is_invariant_violation() => return Err(e),
                Err(e) => {
                    tracing::warn!(object = %obj.id, geometry = gi, error = %e, "aborting geometry");
                    self.errors.push(GeometryError {
                        object: obj.id.clone(),
                        geometry: gi,
                        error: e,
                    });
                }
            }
        }

        self.propagate(obj, &built);

        for child in &obj.children {
            self.build_object(model, child)?;
        }
        Ok(())
    }

    fn build_geometry(
        &mut self,
        model: &CityModel,
        geom: &Geometry,
        gi: u32,
    ) -> Result<Vec<RingDarts>> {
        // Validate the input structure before any welding happens, so an
        // aborted geometry leaves no partial darts behind.
        for shell in &geom.shells {
            if let Some(tags) = &shell.ring_tags {
                if tags.len() != shell.rings.len() {
                    return Err(Error::SemanticsMismatch {
                        rings: shell.rings.len(),
                        tags: tags.len(),
                    });
                }
                for &tag in tags.iter().flatten() {
                    if tag as usize >= geom.surfaces.len() {
                        return Err(Error::SemanticTagOutOfRange {
                            index: tag,
                            len: geom.surfaces.len(),
                        });
                    }
                }
            }
            for ring in &shell.rings {
                for &index in &ring.indices {
                    if index >= model.vertices.len() {
                        return Err(Error::RingIndexOutOfBounds {
                            index,
                            len: model.vertices.len(),
                        });
                    }
                }
            }
        }

        match geom.kind {
            GeometryKind::Solid => {
                tracing::debug!(shells = geom.shells.len(), "building solid")
            }
            GeometryKind::MultiSurface => {
                tracing::debug!(
                    rings = geom.shells.first().map_or(0, |s| s.rings.len()),
                    "building multi-surface"
                )
            }
        }

        let mut result = Vec::new();
        for (si, shell) in geom.shells.iter().enumerate() {
            for (ri, ring) in shell.rings.iter().enumerate() {
                let darts = self.build_ring(model, ring)?;
                if darts.is_empty() {
                    continue;
                }
                let semantic = shell
                    .ring_tags
                    .as_ref()
                    .and_then(|tags| tags[ri])
                    .map(|index| SemanticTag {
                        index,
                        kind: geom.surfaces[index as usize].kind.clone(),
                    });
                result.push(RingDarts {
                    geometry: gi,
                    shell: si as u32,
                    semantic,
                    darts,
                });
            }
        }
        Ok(result)
    }

    fn build_ring(&mut self, model: &CityModel, ring: &Ring) -> Result<Vec<DartId>> {
        if ring.indices.len() <= 2 {
            tracing::warn!(points = ring.indices.len(), "ignoring degenerate ring");
            return Ok(Vec::new());
        }

        let points: Vec<(Point3<f64>, u64)> = ring
            .indices
            .iter()
            .map(|&i| (self.transform.apply(model.vertices[i]), i as u64))
            .collect();

        let mut darts = Vec::new();
        for i in 0..points.len() {
            let (a, ext_a) = points[i];
            let (b, ext_b) = points[(i + 1) % points.len()];
            if let Some(d) = self
                .index
                .weld_edge(&mut self.store, a, b, Some(ext_a), Some(ext_b))?
            {
                darts.push(d);
            }
        }

        if darts.len() <= 2 {
            tracing::warn!(
                edges = darts.len(),
                "ring reduced to fewer than three distinct edges, not face-welded"
            );
            return Ok(darts);
        }

        self.index.weld_face(&mut self.store, &darts)?;
        Ok(darts)
    }

    /// Attaches ownership to every cell this object's geometries touched.
    fn propagate(&mut self, obj: &CityObject, rings: &[RingDarts]) {
        for ring in rings {
            for &d in &ring.darts {
                let volume = self.store.ensure_volume(d);
                let info = self.store.volume_info_mut(volume);
                info.guid = obj.id.clone();
                info.properties
                    .extend(obj.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

                let face = self.store.ensure_face(d);
                let info = self.store.face_info_mut(face);
                info.object_id = obj.id.clone();
                info.geometry = Some(ring.geometry);
                info.shell = Some(ring.shell);
                info.semantic = ring.semantic.clone();
            }
        }
    }

    /// Structural statistics of the current map state.
    pub fn characteristics(&self) -> Characteristics {
        Characteristics::compute(&self.store, self.objects, self.geometries)
    }

    /// Input-structure errors recorded so far (aborted geometries).
    pub fn geometry_errors(&self) -> &[GeometryError] {
        &self.errors
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn into_store(self) -> CellStore {
        self.store
    }

    pub fn weld_index(&self) -> &WeldIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citycmap_core::Shell;

    /// A unit square as a single multi-surface ring at z=0.
    fn square_model() -> CityModel {
        let mut model = CityModel::new();
        let ring = model.ring_from_points(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        let mut geom = Geometry::new(GeometryKind::MultiSurface);
        geom.shells.push(Shell::from_rings(vec![ring]));
        let mut obj = CityObject::new("sq-1", "GenericCityObject");
        obj.geometries.push(geom);
        model.objects.push(obj);
        model
    }

    #[test]
    fn single_ring_builds_one_face() {
        let mut builder = MapBuilder::new(BuildConfig::default());
        builder.build(&square_model()).unwrap();

        let stats = builder.characteristics();
        assert_eq!(stats.darts, 4);
        assert_eq!(stats.cells, [4, 4, 1, 1]);
        assert!(stats.valid);
        assert_eq!(builder.weld_index().pending_edge_count(), 4);
    }

    #[test]
    fn propagation_attaches_ownership() {
        let mut model = square_model();
        model.objects[0]
            .attributes
            .insert("usage".to_string(), "park".to_string());

        let mut builder = MapBuilder::new(BuildConfig::default());
        builder.build(&model).unwrap();

        let store = builder.store();
        let d = store.darts().next().unwrap();
        let volume = store.volume_info(store.volume_of(d).unwrap());
        assert_eq!(volume.guid, "sq-1");
        assert_eq!(volume.properties["usage"], "park");

        let face = store.face_info(store.face_of(d).unwrap());
        assert_eq!(face.object_id, "sq-1");
        assert_eq!(face.geometry, Some(0));
        assert_eq!(face.shell, Some(0));
    }

    #[test]
    fn id_filter_can_match_nothing() {
        let mut builder = MapBuilder::new(BuildConfig {
            id_filter: Some("no-such-object".to_string()),
            ..BuildConfig::default()
        });
        builder.build(&square_model()).unwrap();

        let stats = builder.characteristics();
        assert_eq!(stats.darts, 0);
        assert_eq!(stats.objects, 0);
        assert!(stats.valid);
    }

    #[test]
    fn object_window_applies_after_filter() {
        let mut model = CityModel::new();
        for name in ["a", "b", "c", "d"] {
            model.objects.push(CityObject::new(name, "Building"));
        }

        let mut builder = MapBuilder::new(BuildConfig {
            start_index: 1,
            object_limit: Some(2),
            ..BuildConfig::default()
        });
        builder.build(&model).unwrap();
        assert_eq!(builder.characteristics().objects, 2);
    }

    #[test]
    fn lod_filter_skips_other_levels() {
        let mut model = square_model();
        model.objects[0].geometries[0].lod = Some("1".to_string());

        let mut builder = MapBuilder::new(BuildConfig {
            lod_filter: Some("2".to_string()),
            ..BuildConfig::default()
        });
        builder.build(&model).unwrap();
        assert_eq!(builder.characteristics().darts, 0);
    }

    #[test]
    fn semantics_mismatch_aborts_only_that_geometry() {
        let mut model = square_model();
        // One tag for one ring is fine; force a mismatch instead.
        model.objects[0].geometries[0].shells[0].ring_tags = Some(vec![None, None]);

        let mut builder = MapBuilder::new(BuildConfig::default());
        builder.build(&model).unwrap();

        assert_eq!(builder.characteristics().darts, 0);
        assert_eq!(builder.geometry_errors().len(), 1);
        assert!(matches!(
            builder.geometry_errors()[0].error,
            Error::SemanticsMismatch { rings: 1, tags: 2 }
        ));
    }

    #[test]
    fn degenerate_ring_skips_without_harming_siblings() {
        let mut model = CityModel::new();
        let collapsed = model.ring_from_points(&[
            [5.0, 5.0, 5.0],
            [5.0001, 5.0, 5.0],
            [5.0, 5.0001, 5.0],
        ]);
        let square = model.ring_from_points(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        let mut geom = Geometry::new(GeometryKind::MultiSurface);
        geom.shells.push(Shell::from_rings(vec![collapsed, square]));
        let mut obj = CityObject::new("mix", "Building");
        obj.geometries.push(geom);
        model.objects.push(obj);

        let mut builder = MapBuilder::new(BuildConfig::default());
        builder.build(&model).unwrap();

        // The collapsed ring contributes nothing; the square still welds.
        let stats = builder.characteristics();
        assert_eq!(stats.darts, 4);
        assert_eq!(stats.cells[2], 1);
        assert!(builder.geometry_errors().is_empty());
    }

    #[test]
    fn transform_is_applied_before_keying() {
        let mut model = CityModel::new();
        model.transform = Some(citycmap_core::TransformSpec {
            scale: [0.001, 0.001, 0.001],
            translate: [0.0, 0.0, 0.0],
        });
        // Quantized integer coordinates for a unit square.
        let ring = model.ring_from_points(&[
            [0.0, 0.0, 0.0],
            [1000.0, 0.0, 0.0],
            [1000.0, 1000.0, 0.0],
            [0.0, 1000.0, 0.0],
        ]);
        let mut geom = Geometry::new(GeometryKind::MultiSurface);
        geom.shells.push(Shell::from_rings(vec![ring]));
        let mut obj = CityObject::new("q", "Building");
        obj.geometries.push(geom);
        model.objects.push(obj);

        let mut builder = MapBuilder::new(BuildConfig::default());
        builder.build(&model).unwrap();

        let store = builder.store();
        let d = store.darts().next().unwrap();
        let reached: Vec<f64> = store.darts().map(|d| store.point(d).x).collect();
        // 1000 * 0.001 lands within rounding noise of 1.0, never at 1000.
        assert!(reached.iter().all(|&x| x <= 1.0 + 1e-9));
        assert_eq!(store.point(d).x, 0.0);
    }
}
