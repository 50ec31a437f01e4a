use std::fmt;
use std::str::FromStr;

use crate::error::PrefsError;

/// Samba schema in use. Stored and submitted as the `yes`/`no` answer to "Samba 3?".
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum SambaVersion {
    #[default]
    #[serde(rename = "no")]
    V2,
    #[serde(rename = "yes")]
    V3,
}

impl SambaVersion {
    pub fn as_flag(self) -> &'static str {
        match self {
            SambaVersion::V2 => "no",
            SambaVersion::V3 => "yes",
        }
    }

    /// Samba 3 accounts are bound to a domain SID.
    pub fn needs_domain_sid(self) -> bool {
        matches!(self, SambaVersion::V3)
    }
}

impl FromStr for SambaVersion {
    type Err = PrefsError;

    fn from_str(flag: &str) -> Result<Self, Self::Err> {
        match flag {
            "yes" => Ok(SambaVersion::V3),
            "no" => Ok(SambaVersion::V2),
            other => Err(PrefsError::InvalidSambaFlag(other.to_string())),
        }
    }
}

impl fmt::Display for SambaVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_flag())
    }
}
