extern crate arg_parser;
extern crate directory_prefs;

use std::{env, process};

use anyhow::{bail, Result};
use arg_parser::ArgParser;

use directory_prefs::{
    apply_preferences, prompt, Field, FsProfileStore, Locator, PreferenceSet, PrefsError,
    Profile, ProfileStore,
};

const PASSWORD_ATTEMPTS: usize = 3;

/// Form fields in the order they are asked for.
const FORM: [Field; 20] = [
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
];

fn choose_profile(store: &FsProfileStore) -> Result<Locator> {
    let locators = store.list()?;
    if locators.is_empty() {
        bail!(
            "no profile found in {}, create one with directory_prefs --create",
            store.dir().display()
        );
    }

    loop {
        for (i, locator) in locators.iter().enumerate() {
            eprintln!("\x1B[1m{}\x1B[0m: {}", i + 1, locator);
        }
        let line = prompt::prompt_line(
            &format!("Select a profile from 1 to {}", locators.len()),
            "",
        )?;
        match line.trim().parse::<usize>() {
            Ok(i) if i >= 1 && i <= locators.len() => break Ok(locators[i - 1].clone()),
            Ok(i) => eprintln!("{} not from 1 to {}", i, locators.len()),
            Err(err) => eprintln!("invalid input: {}", err),
        }
    }
}

fn login(profile: &Profile) -> Result<String> {
    for _ in 0..PASSWORD_ATTEMPTS {
        let password = prompt::read_password(&format!("{}: password", profile.locator))?;
        if profile.password.verify(&password) {
            return Ok(password);
        }
        eprintln!("{}", PrefsError::Authentication);
    }
    Err(PrefsError::Authentication.into())
}

/// Ask for every form field, offering the value in `defaults`.
fn fill_form(defaults: &PreferenceSet, password: String) -> Result<PreferenceSet> {
    let mut candidate = PreferenceSet::new().with(Field::Password, password);

    for field in FORM {
        if field == Field::DomainSid && candidate.get(Field::Samba3) != Some("yes") {
            candidate.set(field, defaults.get_or_empty(field));
            continue;
        }
        let value = prompt::prompt_line(field.label(), defaults.get_or_empty(field))?;
        candidate.set(field, value);
    }

    if let Some(new_password) =
        prompt::prompt_password("New password (empty to keep)", "Reenter new password")?
    {
        candidate.set(Field::NewPassword, new_password.clone());
        candidate.set(Field::ConfirmPassword, new_password);
    }

    Ok(candidate)
}

fn run(store: &FsProfileStore, profile: Option<String>) -> Result<()> {
    let locator = match profile {
        Some(name) => name.parse()?,
        None => choose_profile(store)?,
    };

    let profile = store.load(&locator)?;
    let password = login(&profile)?;

    let mut defaults = PreferenceSet::from_profile(&profile);
    loop {
        let candidate = fill_form(&defaults, password.clone())?;

        let result = {
            let _lock = store.lock(&locator)?;
            // Reload under the lock, the profile may have changed while the form was open.
            let current = store.load(&locator)?;
            apply_preferences(store, &candidate, &current)
        };
        match result {
            Ok(report) => {
                print!("{}", report);
                return Ok(());
            }
            Err(err) if err.is_user_error() && !matches!(err, PrefsError::Authentication) => {
                eprintln!("\x1B[1m{}\x1B[0m", err);
                let again = prompt::prompt_line("Back to preferences? (y/n)", "y")?;
                if again != "y" {
                    return Err(err.into());
                }
                // Offer what was typed, not the stored values.
                defaults = candidate;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn main() {
    let mut parser = ArgParser::new(3)
        .add_opt("d", "profile-dir")
        .add_opt("p", "profile")
        .add_flag(&["v", "verbose"]);
    parser.parse(env::args());

    if let Err(err) = directory_prefs::logging::init(parser.found("verbose")) {
        eprintln!("directory_prefs_tui: {err}");
    }

    let store = FsProfileStore::new(directory_prefs::profile_dir(parser.get_opt("profile-dir")));

    if let Err(err) = run(&store, parser.get_opt("profile")) {
        eprintln!("directory_prefs_tui: {err}");
        let code = match err.downcast_ref::<PrefsError>() {
            Some(PrefsError::Authentication) => 2,
            _ => 1,
        };
        process::exit(code);
    }
}
