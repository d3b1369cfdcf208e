//! Shader program compilation and caching
//!
//! Programs are compiled and linked once per distinct source combination
//! and deduplicated by content hash. Reflection data is captured at link
//! time and never changes afterwards. Evicted programs survive until the
//! last outstanding [`ProgramRef`] is dropped.

mod cache;
mod reflection;
mod source;

pub use cache::{ProgramCache, ProgramRef, ShaderError};
pub use reflection::ProgramReflection;
pub use source::ShaderSource;
