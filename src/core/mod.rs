pub mod checksum;
pub mod repair;
pub mod report;
pub mod sanity;
pub mod scanner;

pub use crate::domain::model::{CsumType, Superblock};
pub use crate::domain::ports::{BlockDevice, Storage};
pub use crate::utils::error::Result;
