use std::alloc::Layout;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::buffer_view::BufferView;

/// Allocation callback: returns a pointer to `size` bytes, or null on
/// failure.
pub type AllocateFn = dyn Fn(usize) -> *mut u8 + Send + Sync;

/// Deallocation callback.  Receives the pointer and the size it was
/// allocated with (the Rust allocator needs the layout at free time).
pub type DeallocateFn = dyn Fn(*mut u8, usize) + Send + Sync;

/// Value-type memory resource wrapping an allocate and a deallocate
/// callable.
///
/// Every payload allocation made by the buffer containers goes through
/// one of these, so an API client can account for, cap, or fail
/// allocations without the containers being generic over an allocator
/// type.  Cloning is cheap and clones share the same callables.
///
/// The default resource uses the global allocator.
#[derive(Clone)]
pub struct MemoryResource {
    allocate: Arc<AllocateFn>,
    deallocate: Arc<DeallocateFn>,
}

impl MemoryResource {
    pub fn new<A, D>(allocate: A, deallocate: D) -> Self
    where
        A: Fn(usize) -> *mut u8 + Send + Sync + 'static,
        D: Fn(*mut u8, usize) + Send + Sync + 'static,
    {
        MemoryResource {
            allocate: Arc::new(allocate),
            deallocate: Arc::new(deallocate),
        }
    }

    /// Allocate `size` bytes.  `size` must be nonzero.
    ///
    /// Returns `None` when the underlying callable reports failure; the
    /// caller maps this to its out-of-memory status.
    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        debug_assert!(size > 0);
        NonNull::new((self.allocate)(size))
    }

    /// Release an allocation previously obtained from [`allocate`].
    ///
    /// `size` must be the size passed to the matching `allocate` call.
    ///
    /// [`allocate`]: Self::allocate
    pub fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        (self.deallocate)(ptr.as_ptr(), size)
    }
}

impl Default for MemoryResource {
    fn default() -> Self {
        MemoryResource::new(
            |size| match Layout::array::<u8>(size) {
                Ok(layout) => unsafe { std::alloc::alloc(layout) },
                Err(_) => std::ptr::null_mut(),
            },
            |ptr, size| {
                if let Ok(layout) = Layout::array::<u8>(size) {
                    unsafe { std::alloc::dealloc(ptr, layout) }
                }
            },
        )
    }
}

impl fmt::Debug for MemoryResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MemoryResource")
    }
}

/// An allocation owned through a [`MemoryResource`], released on drop.
///
/// This is the single ownership point for raw payload memory inside the
/// crate; the containers hand out [`BufferView`]s into it.
pub(crate) struct OwnedBuffer {
    ptr: NonNull<u8>,
    size: usize,
    resource: MemoryResource,
}

impl OwnedBuffer {
    pub(crate) fn allocate(resource: &MemoryResource, size: usize) -> Option<Self> {
        let ptr = resource.allocate(size)?;
        Some(OwnedBuffer {
            ptr,
            size,
            resource: resource.clone(),
        })
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn view(&self) -> BufferView {
        // The view is valid for as long as this allocation lives; the
        // containers guarantee they never hand out views that outlive it.
        unsafe { BufferView::new(self.ptr.as_ptr(), self.size) }
    }
}

impl Drop for OwnedBuffer {
    fn drop(&mut self) {
        self.resource.deallocate(self.ptr, self.size);
    }
}

impl fmt::Debug for OwnedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnedBuffer(ptr={:p}, size={})", self.ptr, self.size)
    }
}
