// Adapters layer: concrete devices and backup storage.

pub mod device;
pub mod storage;

pub use device::{FileDevice, MemoryDevice};
pub use storage::LocalStorage;
