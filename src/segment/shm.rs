use memmap2::{MmapMut, MmapOptions};
use std::cell::UnsafeCell;
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::unix::io::FromRawFd;
use std::sync::atomic::{AtomicBool, Ordering};

/// A contiguous fixed-size byte region, either anonymous (threads of this
/// process) or backed by a named POSIX shared memory object that other
/// contexts can attach to by name.
///
/// The segment only carries bytes. Callers must serialize all access
/// themselves; the synchronization primitives guarding a segment live in
/// process-local memory, so the byte region is the only cross-process-visible
/// part.
#[derive(Debug)]
pub struct Segment {
    map: UnsafeCell<MmapMut>,
    len: usize,
    name: Option<CString>,
    owner: bool,
    unlinked: AtomicBool,
}

unsafe impl Send for Segment {}
unsafe impl Sync for Segment {}

impl Segment {
    /// Maps an anonymous segment of exactly `len` bytes.
    pub fn anon(len: usize) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Segment length must be positive",
            ));
        }

        let map = MmapOptions::new().len(len).map_anon()?;

        Ok(Self {
            map: UnsafeCell::new(map),
            len,
            name: None,
            owner: true,
            unlinked: AtomicBool::new(false),
        })
    }

    /// Creates and maps a named segment of exactly `len` bytes. Fails with
    /// `AlreadyExists` when the name is taken.
    pub fn create(name: &str, len: usize) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Segment length must be positive",
            ));
        }

        let c_name = shm_name(name)?;

        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                0o600,
            )
        };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let file = unsafe { File::from_raw_fd(fd) };

        let map = file
            .set_len(len as u64)
            .and_then(|_| unsafe { MmapOptions::new().len(len).map_mut(&file) });

        let map = match map {
            Ok(map) => map,
            Err(e) => {
                unsafe {
                    libc::shm_unlink(c_name.as_ptr());
                }
                return Err(e);
            }
        };

        Ok(Self {
            map: UnsafeCell::new(map),
            len,
            name: Some(c_name),
            owner: true,
            unlinked: AtomicBool::new(false),
        })
    }

    /// Attaches to an existing named segment. The actual object length must
    /// match `expected_len`, so cooperating handles agree on the slot layout
    /// before either touches a byte.
    pub fn attach(name: &str, expected_len: usize) -> io::Result<Self> {
        let c_name = shm_name(name)?;

        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let file = unsafe { File::from_raw_fd(fd) };
        let actual = file.metadata()?.len() as usize;

        if actual != expected_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Segment length mismatch: expected {} bytes, found {}",
                    expected_len, actual
                ),
            ));
        }

        let map = unsafe { MmapOptions::new().len(expected_len).map_mut(&file) }?;

        Ok(Self {
            map: UnsafeCell::new(map),
            len: expected_len,
            name: Some(c_name),
            owner: false,
            unlinked: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(|n| n.to_str().ok())
    }

    #[inline]
    pub fn is_owner(&self) -> bool {
        self.owner
    }

    /// # Safety
    /// Caller must hold the lock that serializes access to this segment, and
    /// `offset + bytes.len()` must not exceed the segment length.
    #[inline]
    pub unsafe fn write_slot(&self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset + bytes.len() <= self.len);
        let map = unsafe { &mut *self.map.get() };
        map[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// # Safety
    /// Caller must hold the lock that serializes access to this segment, and
    /// `offset + out.len()` must not exceed the segment length.
    #[inline]
    pub unsafe fn read_slot(&self, offset: usize, out: &mut [u8]) {
        debug_assert!(offset + out.len() <= self.len);
        let map = unsafe { &*self.map.get() };
        out.copy_from_slice(&map[offset..offset + out.len()]);
    }

    /// Removes a named segment from the shared namespace so no further attach
    /// can find it. Only the creating handle unlinks; repeated calls and calls
    /// on anonymous or attached segments are no-ops.
    pub fn unlink(&self) -> io::Result<()> {
        let Some(name) = self.name.as_ref() else {
            return Ok(());
        };
        if !self.owner || self.unlinked.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let result = unsafe { libc::shm_unlink(name.as_ptr()) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        let _ = self.unlink();
    }
}

fn shm_name(name: &str) -> io::Result<CString> {
    let trimmed = name.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid segment name {:?}", name),
        ));
    }

    CString::new(format!("/{}", trimmed)).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid segment name {:?}", name),
        )
    })
}
