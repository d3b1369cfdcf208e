//! Pipeline state tracking
//!
//! A [`PipelineState`] is a flat value snapshot of everything that affects
//! the next draw call. The [`StateTracker`] diffs a requested snapshot
//! against the last one it applied and issues only the native calls the
//! diff requires, in a fixed order, so native call sequences are
//! reproducible under test.

mod pipeline_state;
mod tracker;

pub use pipeline_state::{PipelineState, MAX_BUFFER_SLOTS, MAX_TEXTURE_SLOTS};
pub use tracker::{StateError, StateTracker};
