extern crate arg_parser;
extern crate directory_prefs;

use std::{env, process};

use anyhow::{bail, Result};
use arg_parser::ArgParser;

use directory_prefs::{
    prompt, save_submission, validate, FsProfileStore, Locator, PreferenceSet, PrefsError,
    Profile, ProfileStore, Session, SubmissionFile,
};

const USAGE: &str = "usage: directory_prefs [-d DIR] [-p PROFILE] (--list | --show | --create | -s FILE [--check])";

fn main() {
    let mut parser = ArgParser::new(4)
        .add_opt("d", "profile-dir")
        .add_opt("p", "profile")
        .add_opt("s", "submission")
        .add_flag(&["l", "list"])
        .add_flag(&["show"])
        .add_flag(&["create"])
        .add_flag(&["check"])
        .add_flag(&["v", "verbose"])
        .add_flag(&["h", "help"]);
    parser.parse(env::args());

    if parser.found("help") {
        println!("{}", USAGE);
        return;
    }

    if let Err(err) = directory_prefs::logging::init(parser.found("verbose")) {
        eprintln!("directory_prefs: {err}");
    }

    let store = FsProfileStore::new(directory_prefs::profile_dir(parser.get_opt("profile-dir")));

    if let Err(err) = run(&mut parser, &store) {
        eprintln!("directory_prefs: {err}");
        let code = match err.downcast_ref::<PrefsError>() {
            Some(PrefsError::Authentication) => 2,
            _ => 1,
        };
        process::exit(code);
    }
}

fn run(parser: &mut ArgParser, store: &FsProfileStore) -> Result<()> {
    let profile = parser.get_opt("profile");

    if parser.found("list") {
        for locator in store.list()? {
            println!("{}", locator);
        }
    } else if parser.found("show") {
        let locator = locator_or_default(profile)?;
        let profile = store.load(&locator)?;
        println!("{}", store.path_for(&locator).display());
        for (field, value) in profile.summary() {
            println!("{}: {}", field.label(), value);
        }
    } else if parser.found("create") {
        let locator = locator_or_default(profile)?;
        if store.path_for(&locator).exists() {
            bail!("profile {} already exists", locator);
        }
        let Some(password) = prompt::prompt_password(
            &format!("{}: enter password", locator),
            &format!("{}: confirm password", locator),
        )?
        else {
            bail!("a profile needs a password");
        };
        let profile = Profile::new(locator.clone(), &password)?;
        let _lock = store.lock(&locator)?;
        // Checked again under the lock, another writer may have created it meanwhile.
        if store.path_for(&locator).exists() {
            bail!("profile {} already exists", locator);
        }
        store.save(&profile)?;
        println!("created profile {}", locator);
    } else if let Some(path) = parser.get_opt("submission") {
        let mut session = SubmissionFile::open(&path)?;
        if let Some(name) = profile {
            session.insert_missing("filename", name);
        }

        if parser.found("check") {
            let name = session.get("filename").ok_or(PrefsError::NoProfile)?;
            let current = store.load(&name.parse()?)?;
            validate(&PreferenceSet::from_session(&session), &current)?;
            println!("submission for profile {} is valid", current.locator);
        } else {
            let report = save_submission(&mut session, store)?;
            print!("{}", report);
        }
    } else {
        bail!("{}", USAGE);
    }

    Ok(())
}

fn locator_or_default(name: Option<String>) -> Result<Locator, PrefsError> {
    match name {
        Some(name) => name.parse(),
        None => Ok(Locator::default()),
    }
}
