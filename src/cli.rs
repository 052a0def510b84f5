//src/cli.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::error::{ProfileError, Result};

/// Input/output paths as given on the command line, before validation.
#[derive(Debug, Clone, Default)]
pub struct ProfilePaths {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl ProfilePaths {
    /// Both paths must be given and the input must exist.
    pub fn validate(self) -> Result<(PathBuf, PathBuf)> {
        let input = self
            .input
            .ok_or_else(|| ProfileError::Configuration("--input must be specified".to_string()))?;
        if !input.exists() {
            return Err(ProfileError::Configuration(format!(
                "The file {} does not exist",
                input.display()
            )));
        }
        let output = self
            .output
            .ok_or_else(|| ProfileError::Configuration("--output must be specified".to_string()))?;
        Ok((input, output))
    }
}

/// Directory holding the lookup tables when `--tables_dir` is not given:
/// the one containing the running executable.
pub fn default_tables_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

pub fn spinner(color: &str, msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = format!("{{spinner:.{color}}} {{msg}}");
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&template)
    {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner
}
