use std::fs;
use std::path::Path;

use crate::error::PrefsError;
use crate::preferences::Field;

pub mod credential;
pub mod locator;
pub mod range;
pub mod samba;

pub use self::credential::Credential;
pub use self::locator::Locator;
pub use self::range::IdRange;
pub use self::samba::SambaVersion;

/// Extension of profile files in the profile directory.
pub const PROFILE_EXTENSION: &str = "conf";

/// One stored configuration profile.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Profile {
    #[serde(skip)]
    pub locator: Locator,
    #[serde(rename = "serverURL")]
    pub server_url: String,
    pub admins: String,
    #[serde(rename = "passwd")]
    pub password: Credential,
    #[serde(rename = "usersuffix")]
    pub user_suffix: String,
    #[serde(rename = "groupsuffix")]
    pub group_suffix: String,
    #[serde(rename = "hostsuffix")]
    pub host_suffix: String,
    #[serde(rename = "userlistAttributes")]
    pub user_list_attributes: String,
    #[serde(rename = "grouplistAttributes")]
    pub group_list_attributes: String,
    #[serde(rename = "hostlistAttributes")]
    pub host_list_attributes: String,
    #[serde(rename = "maxlistentries")]
    pub max_list_entries: u32,
    #[serde(rename = "defaultLanguage")]
    pub default_language: String,
    #[serde(rename = "scriptPath", default)]
    pub script_path: String,
    #[serde(rename = "scriptServer", default)]
    pub script_server: String,
    #[serde(default)]
    pub samba3: SambaVersion,
    #[serde(rename = "domainSID", default)]
    pub domain_sid: String,
    // Tables go last so the encoder can place them after the plain keys.
    pub uid: IdRange,
    pub gid: IdRange,
    pub machine: IdRange,
}

impl Profile {
    /// A fresh profile filled with the stock sample values.
    pub fn new(locator: Locator, password: &str) -> Result<Self, PrefsError> {
        Ok(Profile {
            locator,
            server_url: "ldap://localhost:389".to_string(),
            admins: "cn=Manager,dc=my-domain,dc=com".to_string(),
            password: Credential::hash(password)?,
            user_suffix: "ou=People,dc=my-domain,dc=com".to_string(),
            group_suffix: "ou=group,dc=my-domain,dc=com".to_string(),
            host_suffix: "ou=machines,dc=my-domain,dc=com".to_string(),
            user_list_attributes: "#uid;#givenName;#sn;#uidNumber;#gidNumber".to_string(),
            group_list_attributes: "#cn;#gidNumber;#memberUID;#description".to_string(),
            host_list_attributes: "#cn;#description;#uidNumber;#gidNumber".to_string(),
            max_list_entries: 30,
            default_language: "en_GB:ISO-8859-1:English".to_string(),
            script_path: String::new(),
            script_server: String::new(),
            samba3: SambaVersion::V2,
            domain_sid: String::new(),
            uid: IdRange::new(10000, 30000),
            gid: IdRange::new(10000, 20000),
            machine: IdRange::new(50000, 60000),
        })
    }

    /// Read a profile file. The locator is taken from the file stem.
    pub fn from_file(path: &Path) -> Result<Self, PrefsError> {
        let locator = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| PrefsError::InvalidLocator(path.display().to_string()))?
            .parse()?;

        let data = fs::read_to_string(path).map_err(|source| PrefsError::Storage {
            path: path.to_path_buf(),
            source,
        })?;
        let mut profile: Profile = toml::from_str(&data).map_err(|source| PrefsError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        profile.locator = locator;
        Ok(profile)
    }

    pub fn to_toml(&self) -> Result<String, PrefsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.locator, PROFILE_EXTENSION)
    }

    pub fn admin_list(&self) -> Vec<&str> {
        split_list(&self.admins)
    }

    pub fn user_list_attributes(&self) -> Vec<&str> {
        split_list(&self.user_list_attributes)
    }

    pub fn group_list_attributes(&self) -> Vec<&str> {
        split_list(&self.group_list_attributes)
    }

    pub fn host_list_attributes(&self) -> Vec<&str> {
        split_list(&self.host_list_attributes)
    }

    /// Saved settings as `(field, value)` pairs, in form order. The password is never listed.
    pub fn summary(&self) -> Vec<(Field, String)> {
        vec![
            (Field::ServerUrl, self.server_url.clone()),
            (Field::Admins, self.admins.clone()),
            (Field::UserSuffix, self.user_suffix.clone()),
            (Field::GroupSuffix, self.group_suffix.clone()),
            (Field::HostSuffix, self.host_suffix.clone()),
            (Field::MinUid, self.uid.min.to_string()),
            (Field::MaxUid, self.uid.max.to_string()),
            (Field::MinGid, self.gid.min.to_string()),
            (Field::MaxGid, self.gid.max.to_string()),
            (Field::MinMachine, self.machine.min.to_string()),
            (Field::MaxMachine, self.machine.max.to_string()),
            (Field::UserListAttributes, self.user_list_attributes.clone()),
            (Field::GroupListAttributes, self.group_list_attributes.clone()),
            (Field::HostListAttributes, self.host_list_attributes.clone()),
            (Field::MaxListEntries, self.max_list_entries.to_string()),
            (Field::Language, self.default_language.clone()),
            (Field::ScriptPath, self.script_path.clone()),
            (Field::ScriptServer, self.script_server.clone()),
            (Field::Samba3, self.samba3.as_flag().to_string()),
            (Field::DomainSid, self.domain_sid.clone()),
        ]
    }
}

fn split_list(value: &str) -> Vec<&str> {
    value
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}
