use std::sync::Arc;

pub mod decode;

/// Prepared raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// The two raster layers the editor composites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterRole {
    Photo,
    Frame,
}

/// Token identifying one initiated decode for one role.
///
/// Decode completion order is not guaranteed to match initiation order; the
/// store installs a result only when its token is still the role's active
/// one, so the most recently initiated load always wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadToken {
    role: RasterRole,
    seq: u64,
}

impl LoadToken {
    pub fn role(self) -> RasterRole {
        self.role
    }
}

#[derive(Debug, Default)]
struct Slot {
    image: Option<Arc<PreparedImage>>,
    active: u64,
    issued: u64,
}

/// Holder for the photo and frame rasters with cancel-on-supersede installs.
#[derive(Debug, Default)]
pub struct RasterStore {
    photo: Slot,
    frame: Slot,
}

impl RasterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, role: RasterRole) -> &Slot {
        match role {
            RasterRole::Photo => &self.photo,
            RasterRole::Frame => &self.frame,
        }
    }

    fn slot_mut(&mut self, role: RasterRole) -> &mut Slot {
        match role {
            RasterRole::Photo => &mut self.photo,
            RasterRole::Frame => &mut self.frame,
        }
    }

    /// Start a load for `role`, superseding any in-flight load for it.
    pub fn begin_load(&mut self, role: RasterRole) -> LoadToken {
        let slot = self.slot_mut(role);
        slot.issued += 1;
        slot.active = slot.issued;
        LoadToken {
            role,
            seq: slot.active,
        }
    }

    /// Install a decoded raster. Returns `false` (and leaves the slot
    /// untouched) when the token has been superseded.
    pub fn install(&mut self, token: LoadToken, image: PreparedImage) -> bool {
        let slot = self.slot_mut(token.role);
        if token.seq != slot.active {
            tracing::debug!(
                role = ?token.role,
                seq = token.seq,
                active = slot.active,
                "discarding stale raster decode"
            );
            return false;
        }
        slot.image = Some(Arc::new(image));
        true
    }

    /// Decode-failure path: the role keeps its previous raster (or stays
    /// absent). Never an error.
    pub fn reject(&mut self, token: LoadToken, reason: &crate::error::TwibbonError) {
        tracing::warn!(
            role = ?token.role,
            seq = token.seq,
            %reason,
            "raster decode failed; keeping previous state"
        );
    }

    pub fn get(&self, role: RasterRole) -> Option<&Arc<PreparedImage>> {
        self.slot(role).image.as_ref()
    }

    pub fn photo(&self) -> Option<&Arc<PreparedImage>> {
        self.get(RasterRole::Photo)
    }

    pub fn frame(&self) -> Option<&Arc<PreparedImage>> {
        self.get(RasterRole::Frame)
    }

    /// Drop the raster for `role` and supersede any in-flight load.
    pub fn clear(&mut self, role: RasterRole) {
        let slot = self.slot_mut(role);
        slot.image = None;
        slot.issued += 1;
        slot.active = slot.issued;
    }
}
