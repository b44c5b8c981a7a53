//! Profile command: maintain named inputs in the config file.

use super::{ProfileAction, ProfileSettings};
use crate::config::{DbviewConfig, Profile};
use crate::loader::DetectorCatalog;
use anyhow::{bail, Result};
use std::path::Path;

/// Run the profile command
pub fn run(mut config: DbviewConfig, config_path: &Path, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Add { name, settings } => {
            config.add_profile(&name, to_profile(settings)?)?;
            config.save(config_path)?;
            eprintln!("Profile added: {}", name);
        }
        ProfileAction::Update { name, settings } => {
            config.update_profile(&name, to_profile(settings)?)?;
            config.save(config_path)?;
            eprintln!("Profile updated: {}", name);
        }
        ProfileAction::Remove { name } => {
            config.remove_profile(&name)?;
            config.save(config_path)?;
            eprintln!("Profile removed: {}", name);
        }
        ProfileAction::Show { name } => {
            let Some(profile) = config.profile(&name) else {
                bail!("Unknown profile: {}", name);
            };
            print!("{}", serde_yaml::to_string(profile)?);
        }
        ProfileAction::List => {
            for name in config.profile_names() {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

fn to_profile(settings: ProfileSettings) -> Result<Profile> {
    if let Some(detector) = &settings.soft_fk {
        DetectorCatalog::with_builtins().create(detector)?;
    }
    Ok(Profile {
        input: settings.input,
        database_name: settings.database_name,
        soft_fk_detector: settings.soft_fk,
    })
}
