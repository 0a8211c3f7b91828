use crate::utils::error::Result;

/// Random access to a device or image holding superblock copies.
pub trait BlockDevice: Send + Sync {
    /// Size in bytes, used to decide which mirrors exist.
    fn size(&self) -> impl std::future::Future<Output = Result<u64>> + Send;
    fn read_at(
        &self,
        offset: u64,
        len: usize,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_at(
        &self,
        offset: u64,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn sync(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where superblock backups are kept before a device is modified.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
