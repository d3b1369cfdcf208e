//! GPU resource ownership
//!
//! The resource table is the single owner of every GPU-backed object:
//! buffers, textures, and linked programs. Callers hold opaque
//! generation-checked [`Handle`]s; a handle into a reused slot never
//! resolves to the new occupant. Construction happens on explicit create
//! requests, destruction on explicit release or table teardown.
//!
//! Worker threads never touch the table directly: prepared bytes go
//! through the [`UploadQueue`], which the render thread drains at the
//! start of each frame.

mod descriptor;
mod handle;
mod table;
mod upload;

pub use descriptor::{Resource, ResourceDescriptor};
pub use handle::Handle;
pub use table::{ResourceError, ResourceTable};
pub use upload::{PendingUpload, UploadQueue};
