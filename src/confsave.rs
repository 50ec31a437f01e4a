use tracing::{info, warn};

use crate::config::Locator;
use crate::error::PrefsError;
use crate::preferences::{Field, PreferenceSet};
use crate::session::Session;
use crate::store::ProfileStore;
use crate::writer::{apply_preferences, SaveReport};

/// Save the preferences waiting in `session` to the profile it names.
///
/// The profile stays locked from load to save. Submitted keys are cleared from the
/// session only after the profile was written; on failure they are kept so the form
/// can be shown again. A session that cannot be cleared does not undo a save that
/// already happened.
pub fn save_submission<S, P>(session: &mut S, store: &P) -> Result<SaveReport, PrefsError>
where
    S: Session + ?Sized,
    P: ProfileStore + ?Sized,
{
    let result = save_locked(session, store);

    match &result {
        Ok(report) => {
            let keys: Vec<&str> = Field::ALL.iter().map(|field| field.key()).collect();
            match session.clear(&keys) {
                Ok(()) => info!(
                    target = "confsave",
                    op = "save_submission",
                    result = "ok",
                    profile = %report.profile.locator,
                    "submission consumed"
                ),
                Err(err) => warn!(
                    target = "confsave",
                    op = "save_submission",
                    result = "saved_session_kept",
                    profile = %report.profile.locator,
                    error = %err,
                    "profile saved but submission could not be cleared"
                ),
            }
        }
        Err(err) if err.is_user_error() => {
            info!(
                target = "confsave",
                op = "save_submission",
                result = "rejected",
                field = err.field().map(|field| field.key()).unwrap_or(""),
                error = %err,
                "submission rejected"
            );
        }
        Err(err) => {
            warn!(
                target = "confsave",
                op = "save_submission",
                result = "error",
                error = %err,
                "submission could not be saved"
            );
        }
    }

    result
}

fn save_locked<S, P>(session: &S, store: &P) -> Result<SaveReport, PrefsError>
where
    S: Session + ?Sized,
    P: ProfileStore + ?Sized,
{
    let locator: Locator = session
        .get(Field::Filename.key())
        .filter(|name| !name.is_empty())
        .ok_or(PrefsError::NoProfile)?
        .parse()?;

    let _lock = store.lock(&locator)?;
    let current = store.load(&locator)?;
    let candidate = PreferenceSet::from_session(session);
    apply_preferences(store, &candidate, &current)
}
