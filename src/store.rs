use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::{Locator, Profile, PROFILE_EXTENSION};
use crate::error::PrefsError;

/// Durable storage of profiles, addressed by locator.
pub trait ProfileStore {
    fn load(&self, locator: &Locator) -> Result<Profile, PrefsError>;

    /// Replace the stored profile as a whole. Readers see either the old or the new record.
    fn save(&self, profile: &Profile) -> Result<(), PrefsError>;

    /// Names of all stored profiles, sorted.
    fn list(&self) -> Result<Vec<Locator>, PrefsError>;

    /// Exclude other writers of `locator` until the returned guard is dropped.
    fn lock(&self, locator: &Locator) -> Result<ProfileLock, PrefsError>;
}

/// Guard returned by [`ProfileStore::lock`].
#[derive(Debug)]
pub struct ProfileLock {
    path: Option<PathBuf>,
}

impl ProfileLock {
    /// A guard that holds nothing, for stores without concurrent writers.
    pub fn none() -> ProfileLock {
        ProfileLock { path: None }
    }
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(err) = fs::remove_file(&path) {
                warn!(
                    target = "store::fs",
                    op = "unlock",
                    path = %path.display(),
                    error = %err,
                    "failed to remove lock file"
                );
            }
        }
    }
}

/// Profiles kept as `<locator>.conf` TOML files in one directory.
#[derive(Clone, Debug)]
pub struct FsProfileStore {
    dir: PathBuf,
}

impl FsProfileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> FsProfileStore {
        FsProfileStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, locator: &Locator) -> PathBuf {
        self.dir.join(format!("{}.{}", locator, PROFILE_EXTENSION))
    }

    fn lock_path(&self, locator: &Locator) -> PathBuf {
        self.dir
            .join(format!("{}.{}.lock", locator, PROFILE_EXTENSION))
    }

    fn storage_error(path: &Path) -> impl FnOnce(std::io::Error) -> PrefsError + '_ {
        move |source| PrefsError::Storage {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl ProfileStore for FsProfileStore {
    fn load(&self, locator: &Locator) -> Result<Profile, PrefsError> {
        let path = self.path_for(locator);
        if !path.is_file() {
            return Err(PrefsError::NotFound(locator.clone()));
        }
        Profile::from_file(&path)
    }

    fn save(&self, profile: &Profile) -> Result<(), PrefsError> {
        let path = self.path_for(&profile.locator);
        let data = profile.to_toml()?;

        fs::create_dir_all(&self.dir).map_err(Self::storage_error(&self.dir))?;

        // Write next to the target so the final rename stays on one filesystem.
        let mut file = NamedTempFile::new_in(&self.dir).map_err(Self::storage_error(&path))?;
        file.write_all(data.as_bytes())
            .map_err(Self::storage_error(&path))?;
        file.as_file()
            .sync_all()
            .map_err(Self::storage_error(&path))?;
        file.persist(&path)
            .map_err(|err| PrefsError::Storage {
                path: path.clone(),
                source: err.error,
            })?;

        debug!(
            target = "store::fs",
            op = "save",
            profile = %profile.locator,
            path = %path.display(),
            bytes = data.len() as u64,
            "profile written"
        );
        Ok(())
    }

    fn list(&self) -> Result<Vec<Locator>, PrefsError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Self::storage_error(&self.dir)(err)),
        };

        let mut locators = Vec::new();
        for entry_res in entries {
            let entry = entry_res.map_err(Self::storage_error(&self.dir))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PROFILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if let Ok(locator) = stem.parse() {
                    locators.push(locator);
                }
            }
        }
        locators.sort();
        Ok(locators)
    }

    fn lock(&self, locator: &Locator) -> Result<ProfileLock, PrefsError> {
        fs::create_dir_all(&self.dir).map_err(Self::storage_error(&self.dir))?;

        let path = self.lock_path(locator);
        let created = match create_lock_file(&path) {
            Err(err) if err.kind() == ErrorKind::AlreadyExists && lock_is_stale(&path) => {
                warn!(
                    target = "store::fs",
                    op = "lock",
                    profile = %locator,
                    path = %path.display(),
                    "removing lock left by a process that is gone"
                );
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => return Err(Self::storage_error(&path)(err)),
                }
                create_lock_file(&path)
            }
            res => res,
        };

        match created {
            Ok(()) => Ok(ProfileLock { path: Some(path) }),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(PrefsError::Locked(locator.clone()))
            }
            Err(err) => Err(Self::storage_error(&path)(err)),
        }
    }
}

/// Create `path` exclusively and record the holder's pid in it.
fn create_lock_file(path: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(err) = writeln!(file, "{}", process::id()) {
        // Without a pid the lock can't be reclaimed automatically, but it still excludes.
        debug!(
            target = "store::fs",
            op = "lock",
            path = %path.display(),
            error = %err,
            "failed to record lock holder"
        );
    }
    Ok(())
}

/// A lock is stale when it names a pid that no longer runs. Unreadable or empty lock
/// files count as held.
fn lock_is_stale(path: &Path) -> bool {
    let pid = match fs::read_to_string(path) {
        Ok(contents) => contents.trim().parse::<libc::pid_t>().ok(),
        Err(_) => None,
    };
    match pid {
        Some(pid) if pid > 0 => !process_alive(pid),
        _ => false,
    }
}

fn process_alive(pid: libc::pid_t) -> bool {
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    // EPERM: the process exists but belongs to someone else.
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// In-memory store. Counts writes, which makes it handy for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: RefCell<BTreeMap<Locator, Profile>>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with_profile(profile: Profile) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .profiles
            .borrow_mut()
            .insert(profile.locator.clone(), profile);
        store
    }

    /// Number of successful `save` calls so far.
    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl ProfileStore for MemoryStore {
    fn load(&self, locator: &Locator) -> Result<Profile, PrefsError> {
        self.profiles
            .borrow()
            .get(locator)
            .cloned()
            .ok_or_else(|| PrefsError::NotFound(locator.clone()))
    }

    fn save(&self, profile: &Profile) -> Result<(), PrefsError> {
        self.profiles
            .borrow_mut()
            .insert(profile.locator.clone(), profile.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Locator>, PrefsError> {
        Ok(self.profiles.borrow().keys().cloned().collect())
    }

    fn lock(&self, _locator: &Locator) -> Result<ProfileLock, PrefsError> {
        Ok(ProfileLock::none())
    }
}
