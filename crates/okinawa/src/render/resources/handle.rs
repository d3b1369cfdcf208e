//! Generation-checked resource handles

use std::fmt;

/// Opaque reference to a GPU-backed resource
///
/// A pair of slot index and generation counter. The table bumps a slot's
/// generation every time it is released, so handles into reused slots go
/// stale instead of aliasing the new occupant.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index into the resource table
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation the handle was issued at
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}
