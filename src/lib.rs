pub mod inspect;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod resolve;

pub use logging::{LogLevel, Logger};
pub use manifest::{ManifestEntry, SelectionManifest};
pub use pipeline::{ContainerKind, DropReason, application_meta, resolve_files, title_meta};
