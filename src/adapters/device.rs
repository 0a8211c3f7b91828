use crate::domain::ports::BlockDevice;
use crate::utils::error::Result;
use std::collections::BTreeMap;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

/// A block device node or a filesystem image.
#[derive(Debug)]
pub struct FileDevice {
    path: PathBuf,
    file: Mutex<File>,
    writable: bool,
}

impl FileDevice {
    pub async fn open(path: impl AsRef<Path>, writable: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(&path)
            .await?;

        tracing::debug!(path = %path.display(), writable, "Opened device");

        Ok(Self {
            path,
            file: Mutex::new(file),
            writable,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockDevice for FileDevice {
    async fn size(&self) -> Result<u64> {
        // metadata().len() is zero for block device nodes, seeking works for both.
        let mut file = self.file.lock().await;
        let end = file.seek(SeekFrom::End(0)).await?;
        Ok(end)
    }

    async fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf).await?;
        Ok(buf)
    }

    async fn write_at(&self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} was opened read-only", self.path.display()),
            )
            .into());
        }

        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset)).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn sync(&self) -> Result<()> {
        if self.writable {
            self.file.lock().await.sync_all().await?;
        }
        Ok(())
    }
}

const PAGE_SIZE: u64 = 4096;

/// Sparse in-memory device. Unwritten ranges read back as zeroes, so a
/// device large enough to hold every mirror costs only the touched pages.
#[derive(Debug, Default)]
pub struct MemoryDevice {
    size: u64,
    pages: StdMutex<BTreeMap<u64, Vec<u8>>>,
}

impl MemoryDevice {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            pages: StdMutex::new(BTreeMap::new()),
        }
    }

    fn check_bounds(&self, offset: u64, len: usize) -> io::Result<()> {
        match offset.checked_add(len as u64) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "range {:#x}+{} is outside the {} byte device",
                    offset, len, self.size
                ),
            )),
        }
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, BTreeMap<u64, Vec<u8>>>> {
        self.pages
            .lock()
            .map_err(|_| io::Error::other("memory device lock poisoned"))
    }

    fn read_sync(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.check_bounds(offset, len)?;
        let pages = self.lock()?;
        let mut out = vec![0u8; len];

        for (i, byte) in out.iter_mut().enumerate() {
            let pos = offset + i as u64;
            if let Some(page) = pages.get(&(pos / PAGE_SIZE)) {
                *byte = page[(pos % PAGE_SIZE) as usize];
            }
        }

        Ok(out)
    }

    fn write_sync(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.check_bounds(offset, data.len())?;
        let mut pages = self.lock()?;

        for (i, byte) in data.iter().enumerate() {
            let pos = offset + i as u64;
            let page = pages
                .entry(pos / PAGE_SIZE)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize]);
            page[(pos % PAGE_SIZE) as usize] = *byte;
        }

        Ok(())
    }
}

impl BlockDevice for MemoryDevice {
    async fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    async fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        Ok(self.read_sync(offset, len)?)
    }

    async fn write_at(&self, offset: u64, data: &[u8]) -> Result<()> {
        Ok(self.write_sync(offset, data)?)
    }

    async fn sync(&self) -> Result<()> {
        Ok(())
    }
}
