// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # citycmap Topology
//!
//! Converts city-model geometry (independent polygon boundaries grouped into
//! objects and solids) into a 3-dimensional combinatorial map: every oriented
//! edge, face and volume boundary is explicitly linked to its neighbors.
//!
//! The atomic element is the *dart*, a directed half-edge instance. Darts are
//! stored in a slot-map arena with four neighbor links: `links[1]` steps
//! forward around a face, `links[0]` back, `links[2]` crosses to the opposite
//! traversal of the same edge, and `links[3]` crosses to the half-face of an
//! adjacent solid. Independently supplied polygon rings are *welded* together
//! through canonical string keys: coincident points share darts where a free
//! slot allows, opposite traversals of one edge are 2-sewn, and mirror-image
//! rings of adjacent solids are 3-sewn into one shared face.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use citycmap_core::CityModel;
//! use citycmap_topology::{BuildConfig, MapBuilder};
//!
//! let model = CityModel::from_cityjson(&json)?;
//! let mut builder = MapBuilder::new(BuildConfig::default());
//! builder.build(&model)?;
//!
//! let stats = builder.characteristics();
//! println!("{} darts, {} volumes, valid: {}", stats.darts, stats.cells[3], stats.valid);
//! ```

pub mod attrs;
pub mod builder;
pub mod canon;
pub mod error;
pub mod finalize;
pub mod keys;
pub mod mesh;
pub mod serialization;
pub mod store;
pub mod weld;

pub use attrs::{Color, FaceInfo, Properties, SemanticTag, VertexInfo, VolumeInfo};
pub use builder::{BuildConfig, GeometryError, MapBuilder};
pub use canon::{PointKeyer, Transform};
pub use error::{Error, Result};
pub use finalize::Characteristics;
pub use keys::{DartId, FaceId, VertexId, VolumeId};
pub use mesh::SurfaceMesh;
pub use serialization::{DartRecord, DartTable};
pub use store::CellStore;
pub use weld::WeldIndex;
