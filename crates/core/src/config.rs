//! Editor configuration
//!
//! Settings can be built programmatically, read from `ANNOTATOR_*`
//! environment variables, or loaded from a simple `key = value` file.

use std::fs;
use std::path::Path;

/// Default name of the exported file
pub const DEFAULT_EXPORT_FILE_NAME: &str = "annotated-document.pdf";

/// MIME type of the exported file
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// User-adjustable editor settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Lowest zoom level, in percent
    pub min_zoom_percent: u16,
    /// Highest zoom level, in percent
    pub max_zoom_percent: u16,
    /// Increment applied by zoom in/out, in percent
    pub zoom_step_percent: u16,
    /// Zoom level of a fresh editor, in percent
    pub initial_zoom_percent: u16,
    /// File name handed to the host when downloading an export
    pub export_file_name: String,
    /// Content given to drag-created text fields
    pub text_placeholder: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_zoom_percent: 50,
            max_zoom_percent: 200,
            zoom_step_percent: 10,
            initial_zoom_percent: 100,
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_owned(),
            text_placeholder: crate::annotation::DEFAULT_TEXT_CONTENT.to_owned(),
        }
    }
}

impl EditorConfig {
    pub fn with_zoom_bounds(mut self, min_percent: u16, max_percent: u16) -> Self {
        self.min_zoom_percent = min_percent;
        self.max_zoom_percent = max_percent;
        self
    }

    pub fn with_zoom_step(mut self, step_percent: u16) -> Self {
        self.zoom_step_percent = step_percent;
        self
    }

    pub fn with_initial_zoom(mut self, percent: u16) -> Self {
        self.initial_zoom_percent = percent;
        self
    }

    pub fn with_export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = name.into();
        self
    }

    pub fn with_text_placeholder(mut self, text: impl Into<String>) -> Self {
        self.text_placeholder = text.into();
        self
    }

    /// Check that the zoom settings describe a usable range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom_percent == 0 {
            return Err(ConfigError::InvalidValue("min_zoom_percent".to_owned()));
        }
        if self.max_zoom_percent < self.min_zoom_percent {
            return Err(ConfigError::InvalidValue("max_zoom_percent".to_owned()));
        }
        if self.zoom_step_percent == 0 {
            return Err(ConfigError::InvalidValue("zoom_step_percent".to_owned()));
        }
        if !(self.min_zoom_percent..=self.max_zoom_percent).contains(&self.initial_zoom_percent) {
            return Err(ConfigError::InvalidValue("initial_zoom_percent".to_owned()));
        }
        if self.export_file_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue("export_file_name".to_owned()));
        }
        Ok(())
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ANNOTATOR_MIN_ZOOM`: lowest zoom in percent (default: 50)
    /// - `ANNOTATOR_MAX_ZOOM`: highest zoom in percent (default: 200)
    /// - `ANNOTATOR_ZOOM_STEP`: zoom increment in percent (default: 10)
    /// - `ANNOTATOR_INITIAL_ZOOM`: starting zoom in percent (default: 100)
    /// - `ANNOTATOR_EXPORT_FILE`: export file name (default: annotated-document.pdf)
    /// - `ANNOTATOR_TEXT_PLACEHOLDER`: content of new text fields (default: Enter text)
    ///
    /// # Errors
    /// Returns an error if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (var, key) in [
            ("ANNOTATOR_MIN_ZOOM", "min_zoom_percent"),
            ("ANNOTATOR_MAX_ZOOM", "max_zoom_percent"),
            ("ANNOTATOR_ZOOM_STEP", "zoom_step_percent"),
            ("ANNOTATOR_INITIAL_ZOOM", "initial_zoom_percent"),
            ("ANNOTATOR_EXPORT_FILE", "export_file_name"),
            ("ANNOTATOR_TEXT_PLACEHOLDER", "text_placeholder"),
        ] {
            if let Ok(value) = std::env::var(var) {
                config
                    .apply(key, &value)
                    .map_err(|_| ConfigError::InvalidValue(var.to_owned()))?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file.
    ///
    /// Expected file format:
    /// ```text
    /// min_zoom_percent = 50
    /// max_zoom_percent = 200
    /// zoom_step_percent = 10
    /// initial_zoom_percent = 100
    /// export_file_name = "annotated-document.pdf"
    /// text_placeholder = "Enter text"
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::parse(&contents)
    }

    /// Parses configuration from `key = value` lines. Unknown keys are ignored.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                config.apply(key.trim(), value.trim().trim_matches('"'))?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let percent = |value: &str| {
            value.parse::<u16>().map_err(|_| ConfigError::InvalidValue(key.to_owned()))
        };

        match key {
            "min_zoom_percent" => self.min_zoom_percent = percent(value)?,
            "max_zoom_percent" => self.max_zoom_percent = percent(value)?,
            "zoom_step_percent" => self.zoom_step_percent = percent(value)?,
            "initial_zoom_percent" => self.initial_zoom_percent = percent(value)?,
            "export_file_name" => self.export_file_name = value.to_owned(),
            "text_placeholder" => self.text_placeholder = value.to_owned(),
            other => log::debug!("ignoring unknown config key {other}"),
        }
        Ok(())
    }

    /// Saves configuration to a file in the format read by [`Self::from_file`].
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_config_string())?;
        Ok(())
    }

    fn to_config_string(&self) -> String {
        format!(
            "# Annotator editor configuration\n\
             min_zoom_percent = {}\n\
             max_zoom_percent = {}\n\
             zoom_step_percent = {}\n\
             initial_zoom_percent = {}\n\
             export_file_name = \"{}\"\n\
             text_placeholder = \"{}\"\n",
            self.min_zoom_percent,
            self.max_zoom_percent,
            self.zoom_step_percent,
            self.initial_zoom_percent,
            self.export_file_name,
            self.text_placeholder,
        )
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 6] = [
        "ANNOTATOR_MIN_ZOOM",
        "ANNOTATOR_MAX_ZOOM",
        "ANNOTATOR_ZOOM_STEP",
        "ANNOTATOR_INITIAL_ZOOM",
        "ANNOTATOR_EXPORT_FILE",
        "ANNOTATOR_TEXT_PLACEHOLDER",
    ];

    struct EnvGuard(Vec<(&'static str, Option<String>)>);

    impl EnvGuard {
        fn new(vars: &[&'static str]) -> Self {
            Self(vars.iter().map(|var| (*var, env::var(var).ok())).collect())
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (var, value) in &self.0 {
                match value {
                    Some(value) => env::set_var(var, value),
                    None => env::remove_var(var),
                }
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.min_zoom_percent, 50);
        assert_eq!(config.max_zoom_percent, 200);
        assert_eq!(config.zoom_step_percent, 10);
        assert_eq!(config.initial_zoom_percent, 100);
        assert_eq!(config.export_file_name, "annotated-document.pdf");
        assert_eq!(config.text_placeholder, "Enter text");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = EditorConfig::default()
            .with_zoom_bounds(25, 400)
            .with_zoom_step(25)
            .with_initial_zoom(150)
            .with_export_file_name("signed.pdf")
            .with_text_placeholder("Type here");

        assert_eq!(config.min_zoom_percent, 25);
        assert_eq!(config.max_zoom_percent, 400);
        assert_eq!(config.zoom_step_percent, 25);
        assert_eq!(config.initial_zoom_percent, 150);
        assert_eq!(config.export_file_name, "signed.pdf");
        assert_eq!(config.text_placeholder, "Type here");
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        assert!(EditorConfig::default().with_zoom_bounds(0, 200).validate().is_err());
        assert!(EditorConfig::default().with_zoom_bounds(150, 100).validate().is_err());
        assert!(EditorConfig::default().with_zoom_step(0).validate().is_err());
        assert!(EditorConfig::default().with_initial_zoom(300).validate().is_err());
        assert!(EditorConfig::default().with_export_file_name("  ").validate().is_err());
    }

    #[test]
    fn test_parse_ignores_comments_and_unknown_keys() {
        let config = EditorConfig::parse(
            "# comment\n\nmax_zoom_percent = 300\nexport_file_name = \"out.pdf\"\ncolor = red\n",
        )
        .unwrap();
        assert_eq!(config.max_zoom_percent, 300);
        assert_eq!(config.export_file_name, "out.pdf");
        assert_eq!(config.min_zoom_percent, 50);
    }

    #[test]
    fn test_parse_rejects_non_numeric_zoom() {
        let err = EditorConfig::parse("zoom_step_percent = fast").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "zoom_step_percent"));
    }

    #[test]
    fn test_file_round_trip() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = temp.path().join("annotator.conf");
        let config = EditorConfig::default().with_zoom_step(20).with_export_file_name("x.pdf");

        config.save_to_file(&path).unwrap();
        assert_eq!(EditorConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_from_file_missing() {
        let err = EditorConfig::from_file("/nonexistent/annotator.conf").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _guard = EnvGuard::new(&VARS);
        for var in VARS {
            env::remove_var(var);
        }

        env::set_var("ANNOTATOR_MIN_ZOOM", "40");
        env::set_var("ANNOTATOR_MAX_ZOOM", "300");
        env::set_var("ANNOTATOR_EXPORT_FILE", "contract.pdf");

        let config = EditorConfig::from_env().unwrap();
        assert_eq!(config.min_zoom_percent, 40);
        assert_eq!(config.max_zoom_percent, 300);
        assert_eq!(config.zoom_step_percent, 10);
        assert_eq!(config.export_file_name, "contract.pdf");
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_value() {
        let _guard = EnvGuard::new(&VARS);
        for var in VARS {
            env::remove_var(var);
        }

        env::set_var("ANNOTATOR_ZOOM_STEP", "-5");
        let err = EditorConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var) if var == "ANNOTATOR_ZOOM_STEP"));
    }
}
