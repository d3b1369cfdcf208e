//! The resource handle table

use thiserror::Error;

use super::descriptor::{Resource, ResourceDescriptor};
use super::handle::Handle;
use super::upload::{PendingUpload, UploadQueue};
use crate::render::api::{
    BufferUsage, GraphicsApi, NativeApiError, NativeBuffer, NativeProgram, NativeTexture,
    TextureDesc,
};
use crate::render::shaders::ProgramReflection;

/// Resource table errors
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Handle is out of range, stale, or points at an empty slot
    #[error("no live resource for {0:?}")]
    NotFound(Handle),

    /// Upload bounds exceed the resource's capacity
    #[error("upload of {len} bytes at offset {offset} exceeds capacity {capacity}")]
    SizeMismatch {
        /// Requested byte offset
        offset: usize,
        /// Requested payload length
        len: usize,
        /// Capacity of the target resource
        capacity: usize,
    },

    /// The resource kind takes no byte uploads (programs)
    #[error("{0:?} does not accept byte uploads")]
    InvalidTarget(Handle),

    /// Native construction or upload failure
    #[error(transparent)]
    Native(#[from] NativeApiError),
}

struct Slot {
    generation: u32,
    resource: Option<Resource>,
}

struct DeferredWrite {
    handle: Handle,
    offset: usize,
    bytes: Vec<u8>,
}

/// Owner of every GPU-backed resource, addressed by generation-checked
/// handles
///
/// Slots are dense and reused through a free list; each release bumps the
/// slot generation so stale handles fail to resolve instead of aliasing
/// the replacement resource.
pub struct ResourceTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    queue: UploadQueue,
    deferred: Vec<DeferredWrite>,
}

impl ResourceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            queue: UploadQueue::new(),
            deferred: Vec::new(),
        }
    }

    /// Construct a native resource and register it
    ///
    /// Construction happens before any slot is touched; a native failure
    /// yields the error and no handle.
    pub fn create(
        &mut self,
        api: &mut dyn GraphicsApi,
        descriptor: &ResourceDescriptor,
    ) -> Result<Handle, ResourceError> {
        let resource = match *descriptor {
            ResourceDescriptor::Buffer { size, usage } => {
                let native = api.create_buffer(size, usage)?;
                Resource::Buffer { native, size, usage }
            }
            ResourceDescriptor::Texture { desc } => {
                let native = api.create_texture(&desc)?;
                Resource::Texture { native, desc }
            }
        };

        let handle = self.occupy(resource);
        log::debug!("created {} as {:?}", self.resource_unchecked(handle).kind(), handle);
        Ok(handle)
    }

    /// Register a program linked by the shader cache
    pub(crate) fn insert_program(
        &mut self,
        native: NativeProgram,
        reflection: ProgramReflection,
    ) -> Handle {
        let handle = self.occupy(Resource::Program { native, reflection });
        log::debug!("registered linked program as {:?}", handle);
        handle
    }

    fn occupy(&mut self, resource: Resource) -> Handle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.resource = Some(resource);
            Handle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, resource: Some(resource) });
            Handle::new(index, 0)
        }
    }

    /// Look up a live resource
    pub fn resolve(&self, handle: Handle) -> Result<&Resource, ResourceError> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.resource.as_ref())
            .ok_or(ResourceError::NotFound(handle))
    }

    fn resource_unchecked(&self, handle: Handle) -> &Resource {
        self.slots[handle.index() as usize]
            .resource
            .as_ref()
            .unwrap_or_else(|| unreachable!("occupy just filled {handle:?}"))
    }

    /// Destroy a resource and retire its slot
    ///
    /// A stale or already-released handle is a no-op: teardown paths may
    /// release in any order without bookkeeping.
    pub fn release(&mut self, api: &mut dyn GraphicsApi, handle: Handle) {
        let Some(slot) = self
            .slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
        else {
            log::trace!("release of stale {:?} ignored", handle);
            return;
        };
        let Some(resource) = slot.resource.take() else {
            log::trace!("release of stale {:?} ignored", handle);
            return;
        };

        slot.generation = slot.generation.wrapping_add(1);
        match resource {
            Resource::Buffer { native, .. } => api.destroy_buffer(native),
            Resource::Texture { native, .. } => api.destroy_texture(native),
            Resource::Program { native, .. } => api.destroy_program(native),
        }
        self.free.push(handle.index());
        log::debug!("released {:?}", handle);
    }

    /// Copy `bytes` into the resource at `offset`
    ///
    /// Streaming buffers defer the copy so the render loop never stalls on
    /// them; deferred copies are applied before the next draw reads them.
    pub fn upload(
        &mut self,
        api: &mut dyn GraphicsApi,
        handle: Handle,
        bytes: &[u8],
        offset: usize,
    ) -> Result<(), ResourceError> {
        enum Action {
            WriteBuffer(NativeBuffer),
            Defer,
            WriteTexture(NativeTexture, TextureDesc),
        }

        let action = match self.resolve(handle)? {
            Resource::Buffer { native, size, usage } => {
                if offset + bytes.len() > *size {
                    return Err(ResourceError::SizeMismatch {
                        offset,
                        len: bytes.len(),
                        capacity: *size,
                    });
                }
                if *usage == BufferUsage::Streaming {
                    Action::Defer
                } else {
                    Action::WriteBuffer(*native)
                }
            }
            Resource::Texture { native, desc } => {
                let capacity = desc.byte_size();
                if offset != 0 || bytes.len() != capacity {
                    return Err(ResourceError::SizeMismatch {
                        offset,
                        len: bytes.len(),
                        capacity,
                    });
                }
                Action::WriteTexture(*native, *desc)
            }
            Resource::Program { .. } => return Err(ResourceError::InvalidTarget(handle)),
        };

        match action {
            Action::WriteBuffer(native) => api.write_buffer(native, offset, bytes)?,
            Action::Defer => self.deferred.push(DeferredWrite {
                handle,
                offset,
                bytes: bytes.to_vec(),
            }),
            Action::WriteTexture(native, desc) => api.write_texture(native, &desc, bytes)?,
        }
        Ok(())
    }

    /// Clone-able submission endpoint for worker threads
    pub fn uploader(&self) -> UploadQueue {
        self.queue.clone()
    }

    /// Apply worker-queued uploads
    ///
    /// Runs at the drain point in `begin_frame`. Uploads whose handle died
    /// since submission were cancelled by that release and are dropped;
    /// bounds violations have no caller left to surface to and are logged.
    pub(crate) fn drain_pending(&mut self, api: &mut dyn GraphicsApi) {
        for PendingUpload { handle, offset, bytes } in self.queue.take_all() {
            match self.upload(api, handle, &bytes, offset) {
                Ok(()) => {}
                Err(ResourceError::NotFound(_)) => {
                    log::debug!("queued upload for {:?} cancelled by release", handle);
                }
                Err(err) => {
                    log::warn!("dropping queued upload for {:?}: {}", handle, err);
                }
            }
        }
    }

    /// Apply deferred streaming copies
    ///
    /// Runs before draws read streaming buffers. Targets released since
    /// the copy was staged count as cancelled.
    pub(crate) fn flush_deferred(&mut self, api: &mut dyn GraphicsApi) {
        for DeferredWrite { handle, offset, bytes } in std::mem::take(&mut self.deferred) {
            match self.resolve(handle) {
                Ok(Resource::Buffer { native, .. }) => {
                    let native = *native;
                    if let Err(err) = api.write_buffer(native, offset, &bytes) {
                        log::warn!("deferred upload for {:?} failed: {}", handle, err);
                    }
                }
                _ => log::debug!("deferred upload for {:?} cancelled by release", handle),
            }
        }
    }

    /// Number of live resources
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.resource.is_some()).count()
    }

    /// Destroy every live resource (table teardown)
    pub fn clear(&mut self, api: &mut dyn GraphicsApi) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(resource) = slot.resource.take() {
                slot.generation = slot.generation.wrapping_add(1);
                match resource {
                    Resource::Buffer { native, .. } => api.destroy_buffer(native),
                    Resource::Texture { native, .. } => api.destroy_texture(native),
                    Resource::Program { native, .. } => api.destroy_program(native),
                }
                self.free.push(index as u32);
            }
        }
        self.deferred.clear();
        log::debug!("resource table cleared");
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}
