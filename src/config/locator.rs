use std::fmt;
use std::str::FromStr;

use crate::error::PrefsError;

/// Name of a stored profile. Restricted to characters that are safe as a file stem.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Locator(String);

impl Locator {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(name: &str) -> bool {
        !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    }
}

impl Default for Locator {
    fn default() -> Self {
        Locator("lam".to_string())
    }
}

impl FromStr for Locator {
    type Err = PrefsError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(name) {
            Ok(Locator(name.to_string()))
        } else {
            Err(PrefsError::InvalidLocator(name.to_string()))
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
