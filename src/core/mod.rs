// ─── MobiLauncher Core ───
// Backend for launching vanilla Minecraft from a local data directory.
//
// Architecture:
//   core/
//     version/    Version catalog + per-version detail documents
//     downloader/ Idempotent downloads with atomic placement
//     launch/     Classpath resolver + process spawner
//     java/       Runtime requirement, probing and installation
//     auth/       Username/password login
//     state/      Persisted launcher configuration
//     http/       Transport seam shared by catalog and downloads

pub mod auth;
pub mod downloader;
pub mod error;
pub mod http;
pub mod java;
pub mod launch;
pub mod state;
pub mod version;
