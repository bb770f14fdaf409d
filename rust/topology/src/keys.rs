// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena key types.
//!
//! Darts and attribute records live in `slotmap::SlotMap` arenas; all
//! cross-references between them are these stable generational keys, never
//! owned pointers.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a dart, the atomic oriented element of the map.
    pub struct DartId;

    /// Key for a vertex attribute record (0-cell).
    pub struct VertexId;

    /// Key for a face attribute record (2-cell).
    pub struct FaceId;

    /// Key for a volume attribute record (3-cell).
    pub struct VolumeId;
}
