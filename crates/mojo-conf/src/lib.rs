pub mod diagnostics;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

pub use crate::diagnostics::DiagnosticSeverity;
pub use crate::diagnostics::DiagnosticsConfig;

/// Project config files, lowest priority first.
pub const PROJECT_CONFIG_FILES: [&str; 2] = [".mojo.toml", "mojo.toml"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
    #[error("Invalid tags {open:?} {close:?}: delimiters must be non-empty and contain no whitespace")]
    InvalidTags { open: String, close: String },
}

#[must_use]
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com.github", "mojo-templates", "mojo")
}

/// Path of the per-user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_file() -> Option<Utf8PathBuf> {
    let dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().join("mojo.toml")).ok()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    debug: bool,
    tags: (String, String),
    wrap_depth: usize,
    template_extensions: Vec<String>,
    diagnostics: DiagnosticsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            tags: ("{{".to_string(), "}}".to_string()),
            wrap_depth: 3,
            template_extensions: vec!["mustache".to_string(), "html".to_string(), "tpl".to_string()],
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl Settings {
    pub fn new(project_root: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_from_paths(project_root, user_config_file().as_deref())
    }

    fn load_from_paths(
        project_root: &Utf8Path,
        user_config_path: Option<&Utf8Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(
                File::from(path.as_std_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        for name in PROJECT_CONFIG_FILES {
            builder = builder.add_source(
                File::from(project_root.join(name).as_std_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(root = %project_root, ?settings, "loaded settings");
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let (open, close) = &self.tags;
        let valid = |d: &str| !d.is_empty() && !d.contains(char::is_whitespace);
        if valid(open) && valid(close) {
            Ok(())
        } else {
            Err(ConfigError::InvalidTags {
                open: open.clone(),
                close: close.clone(),
            })
        }
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// The `(open, close)` delimiters templates start with.
    #[must_use]
    pub fn tags(&self) -> (&str, &str) {
        (&self.tags.0, &self.tags.1)
    }

    #[must_use]
    pub fn wrap_depth(&self) -> usize {
        self.wrap_depth
    }

    #[must_use]
    pub fn template_extensions(&self) -> &[String] {
        &self.template_extensions
    }

    /// Whether `path` has one of the configured template extensions.
    #[must_use]
    pub fn is_template(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.template_extensions.iter().any(|known| known == ext))
    }

    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticsConfig {
        &self.diagnostics
    }

    /// Replace the diagnostics configuration, e.g. with command-line overrides.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsConfig) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
