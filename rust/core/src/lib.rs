// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # citycmap Core
//!
//! The in-memory city-model object tree consumed by the topology builder,
//! plus a compact CityJSON ingester built on [serde_json](https://docs.rs/serde_json).
//!
//! ## Overview
//!
//! A [`CityModel`] is a flat vertex table, an optional quantization
//! transform, and an ordered list of [`CityObject`]s. Each object carries an
//! identifier, a type tag, a free-form attribute map and a list of
//! [`Geometry`]s; each geometry is either a multi-surface (one shell) or a
//! solid (a sequence of closed shells); each shell is an ordered list of
//! polygon rings indexing into the shared vertex table, optionally paired
//! with per-ring semantic surface tags.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use citycmap_core::CityModel;
//!
//! let json = std::fs::read_to_string("rotterdam.city.json")?;
//! let model = CityModel::from_cityjson(&json)?;
//! println!("{} objects, {} vertices", model.objects.len(), model.vertices.len());
//! ```

pub mod error;
pub mod model;
pub mod reader;

pub use error::{Error, Result};
pub use model::{
    CityModel, CityObject, Geometry, GeometryKind, Ring, SemanticSurface, Shell, TransformSpec,
};
