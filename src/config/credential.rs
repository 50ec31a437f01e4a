use std::fmt;

use rand::Rng;
use subtle::ConstantTimeEq;

use crate::error::PrefsError;

const ARGON2_PREFIX: &str = "$argon2";

/// Profile password as stored in the profile file.
///
/// New credentials are Argon2 encoded hashes. Older profiles may still hold the
/// password in clear text; those are compared in constant time and replaced by a
/// hash on the next save.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn hash(password: &str) -> Result<Credential, PrefsError> {
        let mut salt = [0u8; 16];
        rand::rng().fill(&mut salt);
        let config = argon2::Config {
            variant: argon2::Variant::Argon2id,
            mem_cost: 19 * 1024,
            time_cost: 2,
            lanes: 1,
            ..argon2::Config::default()
        };
        argon2::hash_encoded(password.as_bytes(), &salt, &config)
            .map(Credential)
            .map_err(|err| PrefsError::Credential(err.to_string()))
    }

    /// Wrap a value read from an older, clear text profile.
    pub fn legacy(password: impl Into<String>) -> Credential {
        Credential(password.into())
    }

    pub fn is_legacy(&self) -> bool {
        !self.0.starts_with(ARGON2_PREFIX)
    }

    pub fn verify(&self, password: &str) -> bool {
        if self.is_legacy() {
            self.0.as_bytes().ct_eq(password.as_bytes()).into()
        } else {
            argon2::verify_encoded(&self.0, password.as_bytes()).unwrap_or(false)
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_legacy() {
            f.write_str("Credential(legacy)")
        } else {
            f.write_str("Credential(argon2)")
        }
    }
}
