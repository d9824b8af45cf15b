//! Code related to CLI commands for the program settings file.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::Result;
use clap::Subcommand;

/// Subcommands for settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Show the default settings file, with documentation for each option
    ShowDefault,
    /// Print the path to the settings file
    Path,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::ShowDefault => print!("{}", Settings::default_file_contents()),
            Self::Path => handle_path_command(),
        }

        Ok(())
    }
}

/// Handle the `path` command, noting if the file does not exist yet
fn handle_path_command() {
    let file_path = get_settings_file_path();
    println!("{}", file_path.display());
    if !file_path.is_file() {
        eprintln!("(file not found: default settings are in use)");
    }
}
