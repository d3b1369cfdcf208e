//! The surface contract the rendering core consumes

/// A drawable surface with a current-able graphics context
///
/// This is the full extent of windowing behavior the rendering core is
/// allowed to use; input, events, and window management stay on the other
/// side of the boundary.
pub trait RenderSurface {
    /// Make the surface's context current on the calling thread
    fn make_current(&mut self);

    /// Present the back buffer
    fn swap_buffers(&mut self);

    /// Drawable size in pixels
    fn framebuffer_size(&self) -> (u32, u32);
}
