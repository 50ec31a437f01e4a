//! Validation of a submitted preference set against the current profile.
//!
//! Rules run in a fixed order and stop at the first failure, so the user is
//! always told about exactly one problem at a time.

use crate::config::{Credential, IdRange, Profile, SambaVersion};
use crate::error::PrefsError;
use crate::preferences::{Field, PreferenceSet};

type Rule = fn(&PreferenceSet) -> Result<(), PrefsError>;

/// Checks applied after authentication, in order.
const RULES: [Rule; 5] = [
    required_fields,
    samba_domain_sid,
    numeric_fields,
    ordered_ranges,
    new_password_confirmed,
];

const RANGES: [(Field, Field); 3] = [
    (Field::MinUid, Field::MaxUid),
    (Field::MinGid, Field::MaxGid),
    (Field::MinMachine, Field::MaxMachine),
];

const NUMERIC: [Field; 7] = [
    Field::MinUid,
    Field::MaxUid,
    Field::MinGid,
    Field::MaxGid,
    Field::MinMachine,
    Field::MaxMachine,
    Field::MaxListEntries,
];

/// Outcome of a successful validation: the profile as it would be saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validated {
    pub profile: Profile,
    pub password_changed: bool,
}

/// Check the caller's password, run every rule and build the updated profile.
///
/// `current` is never modified; the returned profile is a new value.
pub fn validate(candidate: &PreferenceSet, current: &Profile) -> Result<Validated, PrefsError> {
    let password = candidate.get_or_empty(Field::Password);
    if !current.password.verify(password) {
        return Err(PrefsError::Authentication);
    }

    for rule in RULES {
        rule(candidate)?;
    }

    build(candidate, current, password)
}

fn required_fields(candidate: &PreferenceSet) -> Result<(), PrefsError> {
    match Field::REQUIRED
        .iter()
        .find(|field| !candidate.is_present(**field))
    {
        Some(field) => Err(PrefsError::MissingField(*field)),
        None => Ok(()),
    }
}

fn samba_domain_sid(candidate: &PreferenceSet) -> Result<(), PrefsError> {
    let samba3: SambaVersion = candidate.get_or_empty(Field::Samba3).parse()?;
    if samba3.needs_domain_sid() && !candidate.is_present(Field::DomainSid) {
        return Err(PrefsError::MissingField(Field::DomainSid));
    }
    Ok(())
}

fn numeric_fields(candidate: &PreferenceSet) -> Result<(), PrefsError> {
    for field in NUMERIC {
        number(candidate, field)?;
    }
    Ok(())
}

fn ordered_ranges(candidate: &PreferenceSet) -> Result<(), PrefsError> {
    for (min, max) in RANGES {
        if !range(candidate, min, max)?.is_ordered() {
            return Err(PrefsError::InvalidRange { min, max });
        }
    }
    Ok(())
}

fn new_password_confirmed(candidate: &PreferenceSet) -> Result<(), PrefsError> {
    if candidate.get_or_empty(Field::NewPassword) != candidate.get_or_empty(Field::ConfirmPassword)
    {
        return Err(PrefsError::PasswordMismatch);
    }
    Ok(())
}

fn number(candidate: &PreferenceSet, field: Field) -> Result<u32, PrefsError> {
    let value = candidate.get_or_empty(field);
    value.parse().map_err(|_| PrefsError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn range(candidate: &PreferenceSet, min: Field, max: Field) -> Result<IdRange, PrefsError> {
    Ok(IdRange::new(number(candidate, min)?, number(candidate, max)?))
}

fn text(candidate: &PreferenceSet, field: Field) -> String {
    candidate.get_or_empty(field).to_string()
}

fn build(
    candidate: &PreferenceSet,
    current: &Profile,
    password: &str,
) -> Result<Validated, PrefsError> {
    let mut profile = current.clone();

    profile.server_url = text(candidate, Field::ServerUrl);
    profile.admins = text(candidate, Field::Admins);
    profile.user_suffix = text(candidate, Field::UserSuffix);
    profile.group_suffix = text(candidate, Field::GroupSuffix);
    profile.host_suffix = text(candidate, Field::HostSuffix);
    profile.uid = range(candidate, Field::MinUid, Field::MaxUid)?;
    profile.gid = range(candidate, Field::MinGid, Field::MaxGid)?;
    profile.machine = range(candidate, Field::MinMachine, Field::MaxMachine)?;
    profile.user_list_attributes = text(candidate, Field::UserListAttributes);
    profile.group_list_attributes = text(candidate, Field::GroupListAttributes);
    profile.host_list_attributes = text(candidate, Field::HostListAttributes);
    profile.max_list_entries = number(candidate, Field::MaxListEntries)?;
    profile.default_language = text(candidate, Field::Language);
    profile.samba3 = candidate.get_or_empty(Field::Samba3).parse()?;
    profile.domain_sid = text(candidate, Field::DomainSid);
    // Omitted optional values clear what was stored before.
    profile.script_path = text(candidate, Field::ScriptPath);
    profile.script_server = text(candidate, Field::ScriptServer);

    let password_changed = match candidate.get(Field::NewPassword) {
        // Resubmitting the current password keeps the stored hash and its salt.
        Some(new_password)
            if !current.password.is_legacy() && current.password.verify(new_password) =>
        {
            false
        }
        Some(new_password) => {
            profile.password = Credential::hash(new_password)?;
            true
        }
        None => {
            if current.password.is_legacy() {
                profile.password = Credential::hash(password)?;
            }
            false
        }
    };

    Ok(Validated {
        profile,
        password_changed,
    })
}

#[cfg(test)]
pub(crate) mod test {
    use super::validate;
    use crate::config::{Credential, IdRange, Locator, Profile, SambaVersion};
    use crate::error::PrefsError;
    use crate::preferences::{Field, PreferenceSet};

    pub(crate) const PASSWORD: &str = "lam";

    pub(crate) fn current() -> Profile {
        let mut profile = Profile::new(Locator::default(), PASSWORD).unwrap();
        profile.script_path = "/usr/local/bin/lamdaemon.pl".to_string();
        profile.script_server = "files.example.com".to_string();
        profile
    }

    pub(crate) fn candidate() -> PreferenceSet {
        PreferenceSet::new()
            .with(Field::Password, PASSWORD)
            .with(Field::ServerUrl, "ldap://dir.example.com")
            .with(Field::Admins, "cn=admin")
            .with(Field::UserSuffix, "ou=people,dc=example,dc=com")
            .with(Field::GroupSuffix, "ou=groups,dc=example,dc=com")
            .with(Field::HostSuffix, "ou=hosts,dc=example,dc=com")
            .with(Field::MinUid, "1000")
            .with(Field::MaxUid, "60000")
            .with(Field::MinGid, "1000")
            .with(Field::MaxGid, "60000")
            .with(Field::MinMachine, "1000")
            .with(Field::MaxMachine, "60000")
            .with(Field::UserListAttributes, "uid,cn")
            .with(Field::GroupListAttributes, "cn,gidNumber")
            .with(Field::HostListAttributes, "cn")
            .with(Field::MaxListEntries, "30")
            .with(Field::Language, "en")
            .with(Field::Samba3, "no")
    }

    #[test]
    fn accepts_complete_submission() {
        let current = current();
        let validated = validate(&candidate(), &current).unwrap();
        let profile = validated.profile;

        assert!(!validated.password_changed);
        assert_eq!(profile.server_url, "ldap://dir.example.com");
        assert_eq!(profile.admins, "cn=admin");
        assert_eq!(profile.user_suffix, "ou=people,dc=example,dc=com");
        assert_eq!(profile.group_suffix, "ou=groups,dc=example,dc=com");
        assert_eq!(profile.host_suffix, "ou=hosts,dc=example,dc=com");
        assert_eq!(profile.uid, IdRange::new(1000, 60000));
        assert_eq!(profile.gid, IdRange::new(1000, 60000));
        assert_eq!(profile.machine, IdRange::new(1000, 60000));
        assert_eq!(profile.user_list_attributes, "uid,cn");
        assert_eq!(profile.group_list_attributes, "cn,gidNumber");
        assert_eq!(profile.host_list_attributes, "cn");
        assert_eq!(profile.max_list_entries, 30);
        assert_eq!(profile.default_language, "en");
        assert_eq!(profile.samba3, SambaVersion::V2);
        assert_eq!(profile.domain_sid, "");
        assert_eq!(profile.password, current.password);
        assert_eq!(profile.locator, current.locator);
    }

    #[test]
    fn each_missing_required_field_is_reported() {
        let current = current();
        for field in Field::REQUIRED {
            for emptied in [None, Some("")] {
                let mut set = candidate();
                match emptied {
                    Some(value) => set.set(field, value),
                    None => {
                        set.remove(field);
                    }
                }
                match validate(&set, &current) {
                    Err(PrefsError::MissingField(missing)) => assert_eq!(missing, field),
                    other => panic!("{}: expected missing field, got {:?}", field, other),
                }
            }
        }
    }

    #[test]
    fn first_missing_field_wins() {
        let mut set = candidate();
        set.remove(Field::Language);
        set.remove(Field::Admins);
        set.remove(Field::MaxMachine);
        match validate(&set, &current()) {
            Err(PrefsError::MissingField(field)) => assert_eq!(field, Field::Admins),
            other => panic!("expected missing admins, got {:?}", other),
        }
    }

    #[test]
    fn samba_3_requires_domain_sid() {
        let set = candidate().with(Field::Samba3, "yes");
        match validate(&set, &current()) {
            Err(PrefsError::MissingField(field)) => assert_eq!(field, Field::DomainSid),
            other => panic!("expected missing domain SID, got {:?}", other),
        }

        let set = set.with(Field::DomainSid, "S-1-5-21-3623811015-3361044348-30300820");
        let profile = validate(&set, &current()).unwrap().profile;
        assert_eq!(profile.samba3, SambaVersion::V3);
        assert_eq!(profile.domain_sid, "S-1-5-21-3623811015-3361044348-30300820");
    }

    #[test]
    fn samba_3_without_sid_fails_even_with_other_problems_later() {
        let set = candidate()
            .with(Field::Samba3, "yes")
            .with(Field::MinUid, "abc")
            .with(Field::NewPassword, "one")
            .with(Field::ConfirmPassword, "two");
        match validate(&set, &current()) {
            Err(PrefsError::MissingField(field)) => assert_eq!(field, Field::DomainSid),
            other => panic!("expected missing domain SID, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_samba_flag() {
        let set = candidate().with(Field::Samba3, "maybe");
        match validate(&set, &current()) {
            Err(PrefsError::InvalidSambaFlag(flag)) => assert_eq!(flag, "maybe"),
            other => panic!("expected invalid flag, got {:?}", other),
        }
    }

    #[test]
    fn rejects_non_numeric_bounds() {
        let set = candidate().with(Field::MaxGid, "60k");
        match validate(&set, &current()) {
            Err(PrefsError::InvalidNumber { field, value }) => {
                assert_eq!(field, Field::MaxGid);
                assert_eq!(value, "60k");
            }
            other => panic!("expected invalid number, got {:?}", other),
        }

        let set = candidate().with(Field::MaxListEntries, "-1");
        assert!(matches!(
            validate(&set, &current()),
            Err(PrefsError::InvalidNumber {
                field: Field::MaxListEntries,
                ..
            })
        ));
    }

    #[test]
    fn rejects_inverted_range() {
        let set = candidate()
            .with(Field::MinMachine, "70000")
            .with(Field::MaxMachine, "60000");
        match validate(&set, &current()) {
            Err(PrefsError::InvalidRange { min, max }) => {
                assert_eq!(min, Field::MinMachine);
                assert_eq!(max, Field::MaxMachine);
            }
            other => panic!("expected invalid range, got {:?}", other),
        }
    }

    #[test]
    fn wrong_password_hides_validation_errors() {
        let mut set = candidate().with(Field::Password, "wrong");
        set.remove(Field::ServerUrl);
        set.remove(Field::Samba3);
        assert!(matches!(
            validate(&set, &current()),
            Err(PrefsError::Authentication)
        ));

        set.remove(Field::Password);
        assert!(matches!(
            validate(&set, &current()),
            Err(PrefsError::Authentication)
        ));
    }

    #[test]
    fn mismatched_new_passwords_are_rejected() {
        let set = candidate()
            .with(Field::NewPassword, "new-secret")
            .with(Field::ConfirmPassword, "new-secreT");
        assert!(matches!(
            validate(&set, &current()),
            Err(PrefsError::PasswordMismatch)
        ));

        let set = candidate().with(Field::NewPassword, "new-secret");
        assert!(matches!(
            validate(&set, &current()),
            Err(PrefsError::PasswordMismatch)
        ));
    }

    #[test]
    fn matching_new_password_replaces_credential() {
        let set = candidate()
            .with(Field::NewPassword, "new-secret")
            .with(Field::ConfirmPassword, "new-secret");
        let validated = validate(&set, &current()).unwrap();
        assert!(validated.password_changed);
        assert!(validated.profile.password.verify("new-secret"));
        assert!(!validated.profile.password.verify(PASSWORD));
    }

    #[test]
    fn omitted_optional_fields_are_cleared() {
        let current = current();
        assert!(!current.script_path.is_empty());

        let profile = validate(&candidate(), &current).unwrap().profile;
        assert_eq!(profile.script_path, "");
        assert_eq!(profile.script_server, "");

        let set = candidate()
            .with(Field::ScriptPath, "/opt/lam/lamdaemon.pl")
            .with(Field::ScriptServer, "admin.example.com");
        let profile = validate(&set, &current).unwrap().profile;
        assert_eq!(profile.script_path, "/opt/lam/lamdaemon.pl");
        assert_eq!(profile.script_server, "admin.example.com");
    }

    #[test]
    fn legacy_password_is_upgraded() {
        let mut current = current();
        current.password = Credential::legacy(PASSWORD);

        let validated = validate(&candidate(), &current).unwrap();
        assert!(!validated.password_changed);
        assert!(!validated.profile.password.is_legacy());
        assert!(validated.profile.password.verify(PASSWORD));
    }
}
