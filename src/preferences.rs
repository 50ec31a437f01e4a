use std::collections::BTreeMap;
use std::fmt;

use crate::config::Profile;
use crate::session::Session;

/// A field of the preferences form, named by its submission key.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Field {
    Password,
    NewPassword,
    ConfirmPassword,
    ServerUrl,
    Admins,
    UserSuffix,
    GroupSuffix,
    HostSuffix,
    MinUid,
    MaxUid,
    MinGid,
    MaxGid,
    MinMachine,
    MaxMachine,
    UserListAttributes,
    GroupListAttributes,
    HostListAttributes,
    MaxListEntries,
    Language,
    ScriptPath,
    ScriptServer,
    Samba3,
    DomainSid,
    Filename,
}

impl Field {
    /// Every key a submission may carry, in form order.
    pub const ALL: [Field; 24] = [
        Field::Password,
        Field::NewPassword,
        Field::ConfirmPassword,
        Field::ServerUrl,
        Field::Admins,
        Field::UserSuffix,
        Field::GroupSuffix,
        Field::HostSuffix,
        Field::MinUid,
        Field::MaxUid,
        Field::MinGid,
        Field::MaxGid,
        Field::MinMachine,
        Field::MaxMachine,
        Field::UserListAttributes,
        Field::GroupListAttributes,
        Field::HostListAttributes,
        Field::MaxListEntries,
        Field::Language,
        Field::ScriptPath,
        Field::ScriptServer,
        Field::Samba3,
        Field::DomainSid,
        Field::Filename,
    ];

    /// Fields that must be present, in the order they are checked.
    pub const REQUIRED: [Field; 17] = [
        Field::ServerUrl,
        Field::Admins,
        Field::UserSuffix,
        Field::GroupSuffix,
        Field::HostSuffix,
        Field::MinUid,
        Field::MaxUid,
        Field::MinGid,
        Field::MaxGid,
        Field::MinMachine,
        Field::MaxMachine,
        Field::UserListAttributes,
        Field::GroupListAttributes,
        Field::HostListAttributes,
        Field::MaxListEntries,
        Field::Language,
        Field::Samba3,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Password => "passwd",
            Field::NewPassword => "passwd1",
            Field::ConfirmPassword => "passwd2",
            Field::ServerUrl => "serverurl",
            Field::Admins => "admins",
            Field::UserSuffix => "suffusers",
            Field::GroupSuffix => "suffgroups",
            Field::HostSuffix => "suffhosts",
            Field::MinUid => "minUID",
            Field::MaxUid => "maxUID",
            Field::MinGid => "minGID",
            Field::MaxGid => "maxGID",
            Field::MinMachine => "minMach",
            Field::MaxMachine => "maxMach",
            Field::UserListAttributes => "usrlstattr",
            Field::GroupListAttributes => "grplstattr",
            Field::HostListAttributes => "hstlstattr",
            Field::MaxListEntries => "maxlistentries",
            Field::Language => "lang",
            Field::ScriptPath => "scriptpath",
            Field::ScriptServer => "scriptserver",
            Field::Samba3 => "samba3",
            Field::DomainSid => "domainSID",
            Field::Filename => "filename",
        }
    }

    /// Human readable label, used by the summary and the interactive form.
    pub fn label(self) -> &'static str {
        match self {
            Field::Password => "Password",
            Field::NewPassword => "New password",
            Field::ConfirmPassword => "Reenter new password",
            Field::ServerUrl => "Server address",
            Field::Admins => "List of valid users",
            Field::UserSuffix => "UserSuffix",
            Field::GroupSuffix => "GroupSuffix",
            Field::HostSuffix => "HostSuffix",
            Field::MinUid => "Minimum UID number",
            Field::MaxUid => "Maximum UID number",
            Field::MinGid => "Minimum GID number",
            Field::MaxGid => "Maximum GID number",
            Field::MinMachine => "Minimum Machine number",
            Field::MaxMachine => "Maximum Machine number",
            Field::UserListAttributes => "Attributes in User List",
            Field::GroupListAttributes => "Attributes in Group List",
            Field::HostListAttributes => "Attributes in Host List",
            Field::MaxListEntries => "Maximum list entries",
            Field::Language => "Default language",
            Field::ScriptPath => "Path to external script",
            Field::ScriptServer => "Server of external script",
            Field::Samba3 => "Samba 3.x schema",
            Field::DomainSid => "Domain SID",
            Field::Filename => "Profile",
        }
    }

    /// Message shown when the field is required but was left empty. Only fields that
    /// can be required have one.
    pub fn missing_message(self) -> Option<&'static str> {
        let message = match self {
            Field::ServerUrl => "Server Address is empty!",
            Field::Admins => "List of admin users is empty!",
            Field::UserSuffix => "UserSuffix is empty!",
            Field::GroupSuffix => "GroupSuffix is empty!",
            Field::HostSuffix => "HostSuffix is empty!",
            Field::MinUid => "MinUID is empty!",
            Field::MaxUid => "MaxUID is empty!",
            Field::MinGid => "MinGID is empty!",
            Field::MaxGid => "MaxGID is empty!",
            Field::MinMachine => "MinMachine is empty!",
            Field::MaxMachine => "MaxMachine is empty!",
            Field::UserListAttributes => "No attributes in user list!",
            Field::GroupListAttributes => "No attributes in group list!",
            Field::HostListAttributes => "No attributes in host list!",
            Field::MaxListEntries => "Max list entries is empty!",
            Field::Language => "Language is not defined!",
            Field::Samba3 => "Samba version is not defined!",
            Field::DomainSid => "Samba 3 needs a domain SID!",
            _ => return None,
        };
        Some(message)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw candidate values of one submission, keyed by field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreferenceSet {
    values: BTreeMap<Field, String>,
}

impl PreferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn remove(&mut self, field: Field) -> Option<String> {
        self.values.remove(&field)
    }

    /// The value of `field` when it was submitted non-empty.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values
            .get(&field)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// The value of `field`, or `""` when absent.
    pub fn get_or_empty(&self, field: Field) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn is_present(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    /// Collect every known key from a session.
    pub fn from_session<S: Session + ?Sized>(session: &S) -> Self {
        let mut set = Self::new();
        for field in Field::ALL {
            if let Some(value) = session.get(field.key()) {
                set.set(field, value);
            }
        }
        set
    }

    /// Build a submission holding the current values of a profile, as the edit form shows them.
    /// Password fields are left out.
    pub fn from_profile(profile: &Profile) -> Self {
        Self::new()
            .with(Field::ServerUrl, profile.server_url.clone())
            .with(Field::Admins, profile.admins.clone())
            .with(Field::UserSuffix, profile.user_suffix.clone())
            .with(Field::GroupSuffix, profile.group_suffix.clone())
            .with(Field::HostSuffix, profile.host_suffix.clone())
            .with(Field::MinUid, profile.uid.min.to_string())
            .with(Field::MaxUid, profile.uid.max.to_string())
            .with(Field::MinGid, profile.gid.min.to_string())
            .with(Field::MaxGid, profile.gid.max.to_string())
            .with(Field::MinMachine, profile.machine.min.to_string())
            .with(Field::MaxMachine, profile.machine.max.to_string())
            .with(Field::UserListAttributes, profile.user_list_attributes.clone())
            .with(Field::GroupListAttributes, profile.group_list_attributes.clone())
            .with(Field::HostListAttributes, profile.host_list_attributes.clone())
            .with(Field::MaxListEntries, profile.max_list_entries.to_string())
            .with(Field::Language, profile.default_language.clone())
            .with(Field::ScriptPath, profile.script_path.clone())
            .with(Field::ScriptServer, profile.script_server.clone())
            .with(Field::Samba3, profile.samba3.as_flag())
            .with(Field::DomainSid, profile.domain_sid.clone())
            .with(Field::Filename, profile.locator.as_str())
    }
}
