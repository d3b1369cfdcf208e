//! The shader program cache

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use thiserror::Error;

use super::source::ShaderSource;
use crate::render::api::{GraphicsApi, NativeApiError, ShaderStage};
use crate::render::resources::{Handle, ResourceTable};

/// Shader build errors, carrying the full compiler/linker diagnostics
#[derive(Debug, Error)]
pub enum ShaderError {
    /// A stage failed to compile; no link was attempted
    #[error("{} shader stage failed to compile: {log}", .stage.name())]
    StageCompile {
        /// Stage that failed
        stage: ShaderStage,
        /// Compiler log
        log: String,
    },

    /// Stages compiled but the program failed to link
    #[error("shader program failed to link: {log}")]
    Link {
        /// Linker log
        log: String,
    },

    /// No stages were supplied
    #[error("cannot build a program from an empty stage list")]
    EmptyStageList,

    /// Reflection query failure after a successful link
    #[error(transparent)]
    Native(#[from] NativeApiError),
}

/// Counted reference to a cached program
///
/// While any `ProgramRef` for a program is alive, eviction will not
/// destroy the native object. The count is atomic: refs may be cloned on
/// the render thread and dropped from any thread; the deferred native
/// deletion always happens on the render thread during [`ProgramCache::maintain`].
#[derive(Debug)]
pub struct ProgramRef {
    handle: Handle,
    refs: Arc<AtomicU32>,
}

impl ProgramRef {
    fn adopt(handle: Handle, refs: Arc<AtomicU32>) -> Self {
        refs.fetch_add(1, Ordering::Relaxed);
        Self { handle, refs }
    }

    /// Table handle of the linked program, for use in pipeline state
    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl Clone for ProgramRef {
    fn clone(&self) -> Self {
        Self::adopt(self.handle, self.refs.clone())
    }
}

impl Drop for ProgramRef {
    fn drop(&mut self) {
        self.refs.fetch_sub(1, Ordering::Release);
    }
}

struct CacheEntry {
    handle: Handle,
    refs: Arc<AtomicU32>,
    last_use: u64,
}

struct Retired {
    handle: Handle,
    refs: Arc<AtomicU32>,
}

/// Content-addressed cache of linked programs with LRU eviction
///
/// Keyed by the hash of the constituent stage hashes in stage order; a
/// hit returns the existing program without touching the native compiler.
pub struct ProgramCache {
    entries: HashMap<u64, CacheEntry>,
    retired: Vec<Retired>,
    max_resident: usize,
    tick: u64,
}

impl ProgramCache {
    /// Create a cache bounded to `max_resident` programs
    ///
    /// A bound of zero is treated as one: the program being returned is
    /// always resident.
    pub fn new(max_resident: usize) -> Self {
        Self {
            entries: HashMap::new(),
            retired: Vec::new(),
            max_resident: max_resident.max(1),
            tick: 0,
        }
    }

    fn combined_key(sources: &[ShaderSource]) -> u64 {
        let mut hasher = DefaultHasher::new();
        for source in sources {
            hasher.write_u64(source.content_hash());
        }
        hasher.finish()
    }

    /// Return the program for `sources`, compiling and linking on a miss
    ///
    /// Stages compile in list order; the first failure aborts the build
    /// with its log and no link is attempted. Reflection is captured here,
    /// at link time, and is immutable afterwards.
    pub fn get_or_compile(
        &mut self,
        api: &mut dyn GraphicsApi,
        table: &mut ResourceTable,
        sources: &[ShaderSource],
    ) -> Result<ProgramRef, ShaderError> {
        if sources.is_empty() {
            return Err(ShaderError::EmptyStageList);
        }

        let key = Self::combined_key(sources);
        self.tick += 1;

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_use = self.tick;
            return Ok(ProgramRef::adopt(entry.handle, entry.refs.clone()));
        }

        let mut compiled = Vec::with_capacity(sources.len());
        for source in sources {
            match api.compile_stage(source.stage(), source.text()) {
                Ok(stage) => compiled.push(stage),
                Err(log) => {
                    log::error!("{} stage compilation failed:\n{}", source.stage().name(), log);
                    for stage in compiled {
                        api.destroy_stage(stage);
                    }
                    return Err(ShaderError::StageCompile { stage: source.stage(), log });
                }
            }
        }

        let program = match api.link_program(&compiled) {
            Ok(program) => program,
            Err(log) => {
                log::error!("program link failed:\n{}", log);
                for stage in compiled {
                    api.destroy_stage(stage);
                }
                return Err(ShaderError::Link { log });
            }
        };

        // Stage objects are no longer needed once linked
        for stage in compiled {
            api.destroy_stage(stage);
        }

        let reflection = match api.program_reflection(program) {
            Ok(reflection) => reflection,
            Err(err) => {
                api.destroy_program(program);
                return Err(err.into());
            }
        };

        let handle = table.insert_program(program, reflection);
        let refs = Arc::new(AtomicU32::new(0));
        self.entries.insert(
            key,
            CacheEntry { handle, refs: refs.clone(), last_use: self.tick },
        );
        log::info!("linked new shader program {:?} ({} resident)", handle, self.entries.len());

        self.evict_excess(api, table);
        Ok(ProgramRef::adopt(handle, refs))
    }

    fn evict_excess(&mut self, api: &mut dyn GraphicsApi, table: &mut ResourceTable) {
        while self.entries.len() > self.max_resident {
            let Some(oldest_key) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_use)
                .map(|(key, _)| *key)
            else {
                return;
            };
            let entry = match self.entries.remove(&oldest_key) {
                Some(entry) => entry,
                None => return,
            };

            if entry.refs.load(Ordering::Acquire) == 0 {
                log::debug!("evicting unreferenced program {:?}", entry.handle);
                table.release(api, entry.handle);
            } else {
                log::debug!("retiring still-referenced program {:?}", entry.handle);
                self.retired.push(Retired { handle: entry.handle, refs: entry.refs });
            }
        }
    }

    /// Destroy retired programs whose last reference has been dropped
    ///
    /// Runs on the render thread at the `begin_frame` drain point.
    pub fn maintain(&mut self, api: &mut dyn GraphicsApi, table: &mut ResourceTable) {
        for retired in std::mem::take(&mut self.retired) {
            if retired.refs.load(Ordering::Acquire) == 0 {
                log::debug!("destroying retired program {:?}", retired.handle);
                table.release(api, retired.handle);
            } else {
                self.retired.push(retired);
            }
        }
    }

    /// Number of resident (non-retired) programs
    pub fn resident_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of evicted programs kept alive by outstanding references
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Release everything the cache still tracks (teardown)
    pub fn clear(&mut self, api: &mut dyn GraphicsApi, table: &mut ResourceTable) {
        for (_, entry) in self.entries.drain() {
            table.release(api, entry.handle);
        }
        for retired in self.retired.drain(..) {
            table.release(api, retired.handle);
        }
    }
}
