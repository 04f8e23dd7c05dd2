use std::fmt;
use std::ptr::NonNull;

#[derive(Debug)]
pub enum VmError {
    ReservationFailed(std::io::Error),
    CommitFailed(std::io::Error),
    ReleaseFailed(std::io::Error),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::ReservationFailed(e) => write!(f, "VM reservation failed: {e}"),
            VmError::CommitFailed(e) => write!(f, "VM commit failed: {e}"),
            VmError::ReleaseFailed(e) => write!(f, "VM release failed: {e}"),
        }
    }
}

impl std::error::Error for VmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VmError::ReservationFailed(e)
            | VmError::CommitFailed(e)
            | VmError::ReleaseFailed(e) => Some(e),
        }
    }
}

/// Abstract interface for virtual memory operations.
///
/// A reservation claims address space only; no physical pages back it until
/// they are committed. Commit is additive: the caller commits disjoint,
/// forward-moving ranges and never decommits. Release tears down the entire
/// reservation at once.
pub(crate) trait VmOps {
    /// Reserve address space without committing physical pages.
    /// Returns a pointer to the start of the reserved range.
    unsafe fn reserve(size: usize) -> Result<NonNull<u8>, VmError>;

    /// Commit (back with physical pages) a range within a reservation.
    ///
    /// Committing an already-committed range must be harmless; both OS
    /// primitives used here are idempotent over committed pages.
    unsafe fn commit(ptr: NonNull<u8>, size: usize) -> Result<(), VmError>;

    /// Release address space entirely (after which pointers are invalid).
    /// `ptr`/`size` must describe a whole range obtained from `reserve`.
    unsafe fn release(ptr: NonNull<u8>, size: usize) -> Result<(), VmError>;

    /// OS page size: the granularity of `commit`.
    fn page_size() -> usize;

    /// The granularity of `reserve`. On POSIX this equals the page size;
    /// on Windows it is the allocation granularity (typically 64KB).
    fn reservation_granularity() -> usize;
}

pub(crate) struct PlatformVmOps;

#[cfg(all(unix, not(any(loom, miri))))]
mod unix {
    use super::{NonNull, PlatformVmOps, VmError, VmOps};
    use std::io;

    impl VmOps for PlatformVmOps {
        unsafe fn reserve(size: usize) -> Result<NonNull<u8>, VmError> {
            // Safety: FFI call to mmap.
            let ptr = unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    size,
                    libc::PROT_NONE,
                    libc::MAP_PRIVATE | libc::MAP_ANON,
                    -1,
                    0,
                )
            };

            if ptr == libc::MAP_FAILED {
                return Err(VmError::ReservationFailed(io::Error::last_os_error()));
            }

            match NonNull::new(ptr.cast::<u8>()) {
                Some(p) => Ok(p),
                None => Err(VmError::ReservationFailed(io::Error::other(
                    "mmap returned null",
                ))),
            }
        }

        unsafe fn commit(ptr: NonNull<u8>, size: usize) -> Result<(), VmError> {
            // Safety: FFI call to mprotect.
            if unsafe {
                libc::mprotect(
                    ptr.as_ptr().cast::<libc::c_void>(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                )
            } != 0
            {
                return Err(VmError::CommitFailed(io::Error::last_os_error()));
            }

            #[cfg(target_os = "linux")]
            {
                // A freshly committed slab is about to be bumped over;
                // immediate physical backing avoids a burst of minor faults.
                // Safety: FFI call to madvise.
                unsafe {
                    libc::madvise(
                        ptr.as_ptr().cast::<libc::c_void>(),
                        size,
                        libc::MADV_WILLNEED,
                    )
                };
            }

            Ok(())
        }

        unsafe fn release(ptr: NonNull<u8>, size: usize) -> Result<(), VmError> {
            // Safety: FFI call to munmap.
            if unsafe { libc::munmap(ptr.as_ptr().cast::<libc::c_void>(), size) } != 0 {
                return Err(VmError::ReleaseFailed(io::Error::last_os_error()));
            }
            Ok(())
        }

        fn page_size() -> usize {
            use crate::sync::OnceLock;
            static CACHED: OnceLock<usize> = OnceLock::new();
            *CACHED.get_or_init(|| {
                // Safety: FFI call to sysconf.
                let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
                assert!(
                    raw > 0,
                    "sysconf(_SC_PAGESIZE) failed: {}",
                    io::Error::last_os_error()
                );
                // PORTABILITY: this crate supports only 64-bit targets; the
                // page size fits in usize there.
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                {
                    raw as usize
                }
            })
        }

        fn reservation_granularity() -> usize {
            // mmap reservations are page-granular.
            Self::page_size()
        }
    }
}

#[cfg(all(target_os = "windows", not(any(loom, miri))))]
mod windows {
    use super::{NonNull, PlatformVmOps, VmError, VmOps};
    use std::io;

    const MEM_COMMIT: u32 = 0x1000;
    const MEM_RESERVE: u32 = 0x2000;
    const MEM_RELEASE: u32 = 0x8000;
    const PAGE_NOACCESS: u32 = 0x01;
    const PAGE_READWRITE: u32 = 0x04;

    // Only the two size fields are read; the rest exist for layout.
    #[allow(dead_code)]
    #[repr(C)]
    struct SystemInfo {
        processor_arch: u16,
        reserved: u16,
        page_size: u32,
        minimum_application_address: *mut std::ffi::c_void,
        maximum_application_address: *mut std::ffi::c_void,
        active_processor_mask: usize,
        number_of_processors: u32,
        processor_type: u32,
        allocation_granularity: u32,
        processor_level: u16,
        processor_revision: u16,
    }

    extern "system" {
        fn VirtualAlloc(
            address: *mut std::ffi::c_void,
            size: usize,
            allocation_type: u32,
            protect: u32,
        ) -> *mut std::ffi::c_void;

        fn VirtualFree(address: *mut std::ffi::c_void, size: usize, free_type: u32) -> i32;

        fn GetSystemInfo(info: *mut SystemInfo);
    }

    fn system_info() -> (usize, usize) {
        use crate::sync::OnceLock;
        static CACHED: OnceLock<(usize, usize)> = OnceLock::new();
        *CACHED.get_or_init(|| {
            // Safety: FFI call to GetSystemInfo; the struct layout matches
            // the Win32 SYSTEM_INFO definition on 64-bit targets.
            let info = unsafe {
                let mut info = std::mem::zeroed::<SystemInfo>();
                GetSystemInfo(&mut info);
                info
            };
            (
                info.page_size as usize,
                info.allocation_granularity as usize,
            )
        })
    }

    impl VmOps for PlatformVmOps {
        unsafe fn reserve(size: usize) -> Result<NonNull<u8>, VmError> {
            // Safety: FFI call to VirtualAlloc.
            let ptr =
                unsafe { VirtualAlloc(std::ptr::null_mut(), size, MEM_RESERVE, PAGE_NOACCESS) };

            match NonNull::new(ptr.cast::<u8>()) {
                Some(p) => Ok(p),
                None => Err(VmError::ReservationFailed(io::Error::last_os_error())),
            }
        }

        unsafe fn commit(ptr: NonNull<u8>, size: usize) -> Result<(), VmError> {
            // Safety: FFI call to VirtualAlloc.
            let result = unsafe {
                VirtualAlloc(
                    ptr.as_ptr().cast::<std::ffi::c_void>(),
                    size,
                    MEM_COMMIT,
                    PAGE_READWRITE,
                )
            };

            if result.is_null() {
                return Err(VmError::CommitFailed(io::Error::last_os_error()));
            }

            Ok(())
        }

        unsafe fn release(ptr: NonNull<u8>, _size: usize) -> Result<(), VmError> {
            // VirtualFree with MEM_RELEASE requires size 0 and the base
            // address of the original reservation.
            // Safety: FFI call to VirtualFree.
            if unsafe { VirtualFree(ptr.as_ptr().cast::<std::ffi::c_void>(), 0, MEM_RELEASE) } == 0
            {
                return Err(VmError::ReleaseFailed(io::Error::last_os_error()));
            }
            Ok(())
        }

        fn page_size() -> usize {
            system_info().0
        }

        fn reservation_granularity() -> usize {
            system_info().1
        }
    }
}

// ---------------------------------------------------------------------------
// Loom/Miri mock: heap-backed VmOps (no real mmap/VirtualAlloc)
//
// Under `cfg(loom)` we cannot issue real VM syscalls — loom runs inside a
// single OS process with its own scheduler. Instead we back every
// "reservation" with a plain heap allocation (via `std::alloc`).
//
// `commit` is an intentional no-op: the memory is always accessible once
// reserved. `release` frees the heap block.
//
// This is sufficient for testing the *synchronization* logic of the ledger
// (loom) and detecting undefined behaviour in unsafe pointer code (Miri);
// actual page-fault behaviour is tested by the real platform implementation
// in normal builds.
// ---------------------------------------------------------------------------
#[cfg(any(loom, miri))]
impl VmOps for PlatformVmOps {
    unsafe fn reserve(size: usize) -> Result<NonNull<u8>, VmError> {
        if size == 0 {
            return Err(VmError::ReservationFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "zero-size reservation",
            )));
        }
        let layout = std::alloc::Layout::from_size_align(size, 4096)
            .map_err(|e| VmError::ReservationFailed(std::io::Error::other(e)))?;
        // Safety: layout has non-zero size.
        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).ok_or_else(|| {
            VmError::ReservationFailed(std::io::Error::new(
                std::io::ErrorKind::OutOfMemory,
                "alloc returned null",
            ))
        })
    }

    unsafe fn commit(_ptr: NonNull<u8>, _size: usize) -> Result<(), VmError> {
        Ok(()) // heap memory is always accessible
    }

    unsafe fn release(ptr: NonNull<u8>, size: usize) -> Result<(), VmError> {
        let layout = std::alloc::Layout::from_size_align(size, 4096)
            .map_err(|e| VmError::ReleaseFailed(std::io::Error::other(e)))?;
        // Safety: ptr was allocated with the same layout via `reserve`.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        Ok(())
    }

    fn page_size() -> usize {
        4096
    }

    fn reservation_granularity() -> usize {
        4096
    }
}
