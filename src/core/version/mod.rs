pub mod manifest;
pub mod version_file;

pub use manifest::{ManifestClient, VersionEntry, VersionManifest};
pub use version_file::{LibraryRef, VersionDetail, VersionJson, DEFAULT_MAIN_CLASS};
