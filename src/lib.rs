#![deny(warnings)]

#[macro_use]
extern crate serde_derive;

pub use config::{Credential, IdRange, Locator, Profile, SambaVersion};
pub use confsave::save_submission;
pub use error::PrefsError;
pub use preferences::{Field, PreferenceSet};
pub use session::{MemorySession, Session, SubmissionFile};
pub use store::{FsProfileStore, MemoryStore, ProfileLock, ProfileStore};
pub use validate::{validate, Validated};
pub use writer::{apply_preferences, SaveReport};

pub mod config;
mod confsave;
mod error;
pub mod logging;
mod preferences;
#[cfg(feature = "tui")]
pub mod prompt;
mod session;
mod store;
mod validate;
mod writer;

/// Environment variable naming the profile directory.
pub const PROFILE_DIR_ENV: &str = "DIRECTORY_PREFS_DIR";

/// Profile directory used when neither an option nor the environment names one.
pub const DEFAULT_PROFILE_DIR: &str = "config";

/// Resolve the profile directory: explicit option, then environment, then default.
pub fn profile_dir(option: Option<String>) -> std::path::PathBuf {
    option
        .or_else(|| std::env::var(PROFILE_DIR_ENV).ok())
        .filter(|dir| !dir.is_empty())
        .unwrap_or_else(|| DEFAULT_PROFILE_DIR.to_string())
        .into()
}
