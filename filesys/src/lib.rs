pub mod build;
pub mod cnmt;
pub mod nacp;
pub mod nca;
pub mod nsp;
pub mod pfs;
pub mod romfs;
pub mod vfs;
pub mod xci;

// Re-export commonly used types
pub use cnmt::{Cnmt, TitleType};
pub use nacp::Nacp;
pub use nca::{ContentType, Nca};
pub use nsp::Nsp;
pub use pfs::Partition;
pub use romfs::RomFs;
pub use vfs::{HostFilesystem, MemoryFilesystem, VfsFile, VirtualFilesystem};
pub use xci::Xci;
