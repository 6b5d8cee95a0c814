//! Randomly writable destinations for downloaded bytes.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

#[cfg(not(unix))]
use std::io::{Seek, SeekFrom, Write};

/// A preallocated byte store accepting positional writes.
///
/// Workers call `write_at` concurrently with disjoint ranges, so every call
/// must be self-contained: no shared cursor may leak between two calls.
/// Calls may block; the session only ever makes them from tokio's blocking
/// pool.
pub trait OutputSink: Send + Sync {
    /// Size the store to exactly `len` bytes before any write.
    fn preallocate(&self, len: u64) -> io::Result<()>;

    /// Write all of `buf` starting at `offset`.
    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<()>;

    fn flush(&self) -> io::Result<()> { Ok(()) }
}

/// Run one sink call on the blocking pool, off the runtime's worker threads.
pub(crate) async fn blocking<S, T, F>(sink: &Arc<S>, call: F) -> Result<T>
where
    S: OutputSink + ?Sized + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> io::Result<T> + Send + 'static,
{
    let sink = Arc::clone(sink);
    tokio::task::spawn_blocking(move || call(&*sink))
        .await
        .map_err(|e| Error::Worker(e.to_string()))?
        .map_err(Error::Sink)
}

fn check_bounds(capacity: u64, offset: u64, len: usize) -> io::Result<()> {
    match offset.checked_add(len as u64) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("write of {len} bytes at {offset} exceeds sink capacity {capacity}"),
        )),
    }
}

/// File-backed sink.
///
/// On unix every write is a single positional `pwrite`; elsewhere the seek
/// and the write are serialized under one lock.
#[derive(Debug)]
pub struct FileSink {
    path:     PathBuf,
    file:     File,
    capacity: AtomicU64,
    #[cfg(not(unix))]
    cursor:   Mutex<()>,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::from_file(path, file))
    }

    fn from_file(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            file,
            capacity: AtomicU64::new(0),
            #[cfg(not(unix))]
            cursor: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn capacity(&self) -> u64 { self.capacity.load(Ordering::Acquire) }
}

impl OutputSink for FileSink {
    fn preallocate(&self, len: u64) -> io::Result<()> {
        self.file.set_len(len)?;
        self.capacity.store(len, Ordering::Release);
        Ok(())
    }

    #[cfg(unix)]
    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<()> {
        use std::os::unix::fs::FileExt;

        check_bounds(self.capacity(), offset, buf.len())?;
        self.file.write_all_at(buf, offset)
    }

    #[cfg(not(unix))]
    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<()> {
        check_bounds(self.capacity(), offset, buf.len())?;
        let _cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)
    }

    fn flush(&self) -> io::Result<()> { self.file.sync_all() }
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    buf: Mutex<Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self { Self::default() }

    /// Copy of the current contents.
    pub fn to_vec(&self) -> Vec<u8> { self.buf.lock().unwrap_or_else(|e| e.into_inner()).clone() }

    pub fn len(&self) -> usize { self.buf.lock().unwrap_or_else(|e| e.into_inner()).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl OutputSink for MemorySink {
    fn preallocate(&self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(|_| {
            io::Error::new(io::ErrorKind::OutOfMemory, format!("{len} bytes do not fit in memory"))
        })?;
        let mut buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        buf.clear();
        buf.resize(len, 0);
        Ok(())
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        let mut buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        check_bounds(buf.len() as u64, offset, data.len())?;
        let start = offset as usize;
        buf[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Arc<S> {
    fn preallocate(&self, len: u64) -> io::Result<()> { (**self).preallocate(len) }

    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<()> { (**self).write_at(offset, buf) }

    fn flush(&self) -> io::Result<()> { (**self).flush() }
}
