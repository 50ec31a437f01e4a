use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::Locator;
use crate::preferences::Field;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("Invalid password!")]
    Authentication,
    #[error("{}", missing_field_message(.0))]
    MissingField(Field),
    #[error("Samba version must be \"yes\" or \"no\", not \"{0}\"")]
    InvalidSambaFlag(String),
    #[error("{} is not a number: \"{value}\"", .field.label())]
    InvalidNumber { field: Field, value: String },
    #[error("{} is greater than {}!", .min.label(), .max.label())]
    InvalidRange { min: Field, max: Field },
    #[error("Passwords are different!")]
    PasswordMismatch,
    #[error("No profile selected!")]
    NoProfile,
    #[error("invalid profile name \"{0}\"")]
    InvalidLocator(String),
    #[error("profile {0} does not exist")]
    NotFound(Locator),
    #[error("profile {0} is being saved by someone else")]
    Locked(Locator),
    #[error("{}: failed to decode: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to encode profile: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("{}: {source}", .path.display())]
    Storage { path: PathBuf, source: io::Error },
    #[error("failed to hash password: {0}")]
    Credential(String),
}

impl PrefsError {
    /// Submission key of the field the user has to correct, if any.
    pub fn field(&self) -> Option<Field> {
        match self {
            PrefsError::MissingField(field) => Some(*field),
            PrefsError::InvalidSambaFlag(_) => Some(Field::Samba3),
            PrefsError::InvalidNumber { field, .. } => Some(*field),
            PrefsError::InvalidRange { min, .. } => Some(*min),
            PrefsError::PasswordMismatch => Some(Field::NewPassword),
            PrefsError::Authentication => Some(Field::Password),
            PrefsError::NoProfile => Some(Field::Filename),
            _ => None,
        }
    }

    /// Errors caused by the submitted input rather than by the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PrefsError::Authentication
                | PrefsError::MissingField(_)
                | PrefsError::InvalidSambaFlag(_)
                | PrefsError::InvalidNumber { .. }
                | PrefsError::InvalidRange { .. }
                | PrefsError::PasswordMismatch
                | PrefsError::NoProfile
                | PrefsError::InvalidLocator(_)
        )
    }
}

fn missing_field_message(field: &Field) -> String {
    match field.missing_message() {
        Some(message) => message.to_string(),
        None => format!("{} is empty!", field.label()),
    }
}

#[cfg(test)]
mod test {
    use super::PrefsError;
    use crate::preferences::Field;

    #[test]
    fn messages_match_form_wording() {
        assert_eq!(
            PrefsError::MissingField(Field::ServerUrl).to_string(),
            "Server Address is empty!"
        );
        assert_eq!(
            PrefsError::MissingField(Field::DomainSid).to_string(),
            "Samba 3 needs a domain SID!"
        );
        assert_eq!(
            PrefsError::MissingField(Field::ScriptPath).to_string(),
            "Path to external script is empty!"
        );
        assert_eq!(PrefsError::PasswordMismatch.to_string(), "Passwords are different!");
        assert_eq!(
            PrefsError::InvalidRange {
                min: Field::MinUid,
                max: Field::MaxUid
            }
            .to_string(),
            "Minimum UID number is greater than Maximum UID number!"
        );
    }

    #[test]
    fn names_offending_field() {
        assert_eq!(
            PrefsError::MissingField(Field::HostSuffix).field(),
            Some(Field::HostSuffix)
        );
        assert_eq!(PrefsError::Authentication.field(), Some(Field::Password));
        assert!(PrefsError::Authentication.is_user_error());
        assert!(!PrefsError::Credential("oom".to_string()).is_user_error());
    }
}
