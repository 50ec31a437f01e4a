use std::fmt;

use tracing::info;

use crate::config::Profile;
use crate::error::PrefsError;
use crate::preferences::PreferenceSet;
use crate::store::ProfileStore;
use crate::validate::validate;

/// What a successful save reports back to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReport {
    pub profile: Profile,
    pub password_changed: bool,
}

impl fmt::Display for SaveReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.password_changed {
            writeln!(f, "Password changed!")?;
            writeln!(f)?;
        }
        writeln!(
            f,
            "The following settings were saved to profile: {}",
            self.profile.locator
        )?;
        writeln!(f)?;
        for (field, value) in self.profile.summary() {
            writeln!(f, "{}: {}", field.label(), value)?;
        }
        Ok(())
    }
}

/// Validate `candidate` against `current` and store the result with a single write.
///
/// Nothing is written when authentication or any rule fails.
pub fn apply_preferences<S: ProfileStore + ?Sized>(
    store: &S,
    candidate: &PreferenceSet,
    current: &Profile,
) -> Result<SaveReport, PrefsError> {
    let validated = validate(candidate, current)?;
    store.save(&validated.profile)?;

    info!(
        target = "writer",
        op = "apply_preferences",
        result = "saved",
        profile = %validated.profile.locator,
        password_changed = validated.password_changed,
        "preferences saved"
    );

    Ok(SaveReport {
        profile: validated.profile,
        password_changed: validated.password_changed,
    })
}

#[cfg(test)]
mod test {
    use super::apply_preferences;
    use crate::config::Locator;
    use crate::error::PrefsError;
    use crate::preferences::Field;
    use crate::store::{FsProfileStore, MemoryStore, ProfileStore};
    use crate::validate::test::{candidate, current, PASSWORD};

    #[test]
    fn saves_once_and_reports_locator() {
        let current = current();
        let store = MemoryStore::with_profile(current.clone());

        let report = apply_preferences(&store, &candidate(), &current).unwrap();
        assert_eq!(store.saves(), 1);
        assert_eq!(report.profile.samba3.as_flag(), "no");
        assert_eq!(report.profile.domain_sid, "");

        let text = report.to_string();
        assert!(text.starts_with("The following settings were saved to profile: lam"));
        assert!(text.contains("Server address: ldap://dir.example.com"));
        assert!(!text.contains("Password changed!"));
    }

    #[test]
    fn failures_write_nothing() {
        let current = current();
        let store = MemoryStore::with_profile(current.clone());

        let mut missing = candidate();
        missing.remove(Field::HostSuffix);
        let wrong_password = candidate().with(Field::Password, "nope");
        let mismatch = candidate()
            .with(Field::NewPassword, "a")
            .with(Field::ConfirmPassword, "b");

        for set in [missing, wrong_password, mismatch] {
            assert!(apply_preferences(&store, &set, &current).is_err());
        }
        assert_eq!(store.saves(), 0);
        assert_eq!(store.load(&Locator::default()).unwrap(), current);
    }

    #[test]
    fn mismatch_keeps_stored_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsProfileStore::new(dir.path());
        let current = current();
        store.save(&current).unwrap();

        let set = candidate()
            .with(Field::NewPassword, "first")
            .with(Field::ConfirmPassword, "second");
        assert!(matches!(
            apply_preferences(&store, &set, &current),
            Err(PrefsError::PasswordMismatch)
        ));
        let stored = store.load(&current.locator).unwrap();
        assert!(stored.password.verify(PASSWORD));
        assert!(!stored.password.verify("first"));
    }

    #[test]
    fn saved_profile_loads_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsProfileStore::new(dir.path());
        let current = current();
        store.save(&current).unwrap();

        let set = candidate()
            .with(Field::Samba3, "yes")
            .with(Field::DomainSid, "S-1-5-21-99")
            .with(Field::ScriptServer, "admin.example.com");
        let report = apply_preferences(&store, &set, &current).unwrap();
        assert_eq!(store.load(&current.locator).unwrap(), report.profile);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsProfileStore::new(dir.path());
        let current = current();
        store.save(&current).unwrap();

        apply_preferences(&store, &candidate(), &current).unwrap();
        let first = store.load(&current.locator).unwrap();
        apply_preferences(&store, &candidate(), &first).unwrap();
        let second = store.load(&current.locator).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn resubmitting_current_password_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsProfileStore::new(dir.path());
        let current = current();
        store.save(&current).unwrap();
        let set = candidate()
            .with(Field::NewPassword, PASSWORD)
            .with(Field::ConfirmPassword, PASSWORD);

        let report = apply_preferences(&store, &set, &current).unwrap();
        assert!(!report.password_changed);
        let first = store.load(&current.locator).unwrap();
        apply_preferences(&store, &set, &first).unwrap();
        let second = store.load(&current.locator).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.password, current.password);
    }

    #[test]
    fn password_change_is_reported() {
        let current = current();
        let store = MemoryStore::with_profile(current.clone());
        let set = candidate()
            .with(Field::NewPassword, "changed")
            .with(Field::ConfirmPassword, "changed");

        let report = apply_preferences(&store, &set, &current).unwrap();
        assert!(report.to_string().starts_with("Password changed!"));
        assert!(store
            .load(&current.locator)
            .unwrap()
            .password
            .verify("changed"));
    }
}
