pub mod app_state;

pub use app_state::{LauncherConfig, Preferences, DEFAULT_AUTH_URL, DEFAULT_MANIFEST_URL, DEFAULT_PROFILE_URL};
