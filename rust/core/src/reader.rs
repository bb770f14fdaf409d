// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityJSON ingestion.
//!
//! Reads a CityJSON document into the [`CityModel`] tree. Only the parts the
//! topology builder consumes are materialized: the vertex table, the
//! quantization transform, and per-object `Solid`/`MultiSurface` boundaries
//! with their semantic surface tags. Other geometry kinds (points, lines,
//! geometry templates) are skipped. Inner rings of a surface are skipped as
//! well; only the outer boundary of each polygon participates in welding.
//!
//! CityJSON stores city objects in a JSON map, so the reader sorts them by
//! identifier to give the builder a deterministic visitation order.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::*;

impl CityModel {
    /// Parses a CityJSON document.
    pub fn from_cityjson(text: &str) -> Result<CityModel> {
        let doc: Value = serde_json::from_str(text)?;

        let mut model = CityModel::new();
        model.vertices = parse_vertex_table(&doc)?;
        model.transform = parse_transform(&doc)?;

        let objects = doc
            .get("CityObjects")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::InvalidDocument("missing CityObjects map".to_string()))?;

        let mut ids: Vec<&String> = objects.keys().collect();
        ids.sort();

        for id in ids {
            let obj = parse_object(id, &objects[id], model.vertices.len())?;
            model.objects.push(obj);
        }

        Ok(model)
    }
}

fn parse_vertex_table(doc: &Value) -> Result<Vec<[f64; 3]>> {
    let raw = doc
        .get("vertices")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidDocument("missing vertices array".to_string()))?;

    raw.iter()
        .map(|v| triple(v).ok_or_else(|| Error::InvalidDocument("bad vertex entry".to_string())))
        .collect()
}

fn parse_transform(doc: &Value) -> Result<Option<TransformSpec>> {
    let block = match doc.get("transform") {
        Some(b) => b,
        None => return Ok(None),
    };

    let scale = triple(&block["scale"])
        .ok_or_else(|| Error::MalformedTransform("scale must be three numbers".to_string()))?;
    let translate = triple(&block["translate"])
        .ok_or_else(|| Error::MalformedTransform("translate must be three numbers".to_string()))?;

    Ok(Some(TransformSpec { scale, translate }))
}

fn triple(v: &Value) -> Option<[f64; 3]> {
    let arr = v.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    Some([arr[0].as_f64()?, arr[1].as_f64()?, arr[2].as_f64()?])
}

fn parse_object(id: &str, content: &Value, vertex_count: usize) -> Result<CityObject> {
    let mut obj = CityObject::new(
        id,
        content.get("type").and_then(Value::as_str).unwrap_or(""),
    );

    if let Some(attrs) = content.get("attributes").and_then(Value::as_object) {
        for (k, v) in attrs {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            obj.attributes.insert(k.clone(), text);
        }
    }

    if let Some(geoms) = content.get("geometry").and_then(Value::as_array) {
        for geom in geoms {
            if let Some(parsed) = parse_geometry(geom, vertex_count)? {
                obj.geometries.push(parsed);
            }
        }
    }

    // Children are references to other entries of the CityObjects map; those
    // entries are returned as top-level objects in their own right.
    Ok(obj)
}

fn parse_geometry(geom: &Value, vertex_count: usize) -> Result<Option<Geometry>> {
    let kind = match geom.get("type").and_then(Value::as_str) {
        Some("Solid") => GeometryKind::Solid,
        Some("MultiSurface") => GeometryKind::MultiSurface,
        _ => return Ok(None),
    };

    let mut parsed = Geometry::new(kind);

    parsed.lod = geom.get("lod").map(|l| match l {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    let boundaries = geom
        .get("boundaries")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidDocument("geometry without boundaries".to_string()))?;

    let (surfaces, values) = parse_semantics(geom);
    parsed.surfaces = surfaces;

    match kind {
        GeometryKind::MultiSurface => {
            let tags = values.as_ref().and_then(tag_row);
            parsed.shells.push(parse_shell(boundaries, tags, vertex_count)?);
        }
        GeometryKind::Solid => {
            for (i, shell_val) in boundaries.iter().enumerate() {
                let shell_surfaces = shell_val.as_array().ok_or_else(|| {
                    Error::InvalidDocument("solid shell is not an array".to_string())
                })?;
                let tags = values
                    .as_ref()
                    .and_then(Value::as_array)
                    .and_then(|rows| rows.get(i))
                    .and_then(tag_row);
                parsed
                    .shells
                    .push(parse_shell(shell_surfaces, tags, vertex_count)?);
            }
        }
    }

    Ok(Some(parsed))
}

/// Extracts the semantic surface table and the raw `values` block.
///
/// For a multi-surface the values are one flat row; for a solid they are one
/// row per shell, indexed by the caller.
fn parse_semantics(geom: &Value) -> (Vec<SemanticSurface>, Option<Value>) {
    let semantics = match geom.get("semantics") {
        Some(s) => s,
        None => return (Vec::new(), None),
    };

    let surfaces = semantics
        .get("surfaces")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|s| SemanticSurface {
                    kind: s
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    (surfaces, semantics.get("values").cloned())
}

/// Converts one row of semantic values (`[0, null, 2, ...]`) to ring tags.
fn tag_row(row: &Value) -> Option<Vec<Option<u32>>> {
    row.as_array()
        .map(|arr| arr.iter().map(|v| v.as_u64().map(|n| n as u32)).collect())
}

fn parse_shell(
    surfaces: &[Value],
    tags: Option<Vec<Option<u32>>>,
    vertex_count: usize,
) -> Result<Shell> {
    let mut shell = Shell::default();

    for surface in surfaces {
        let rings = surface
            .as_array()
            .ok_or_else(|| Error::InvalidDocument("surface is not a ring list".to_string()))?;
        // Outer boundary only; inner rings (holes) are not welded.
        let outer = rings
            .first()
            .ok_or_else(|| Error::InvalidDocument("surface with no rings".to_string()))?;
        shell.rings.push(parse_ring(outer, vertex_count)?);
    }

    shell.ring_tags = tags;
    Ok(shell)
}

fn parse_ring(ring: &Value, vertex_count: usize) -> Result<Ring> {
    let raw = ring
        .as_array()
        .ok_or_else(|| Error::InvalidDocument("ring is not an index list".to_string()))?;

    let mut indices = Vec::with_capacity(raw.len());
    for v in raw {
        let index = v
            .as_u64()
            .ok_or_else(|| Error::InvalidDocument("non-integer ring index".to_string()))?
            as usize;
        if index >= vertex_count {
            return Err(Error::VertexOutOfBounds {
                index,
                len: vertex_count,
            });
        }
        indices.push(index);
    }

    Ok(Ring::new(indices))
}
