//! Model providers
//!
//! A provider reads a model snapshot and hands out one fully materialized
//! iteration of one engineering model. The only implementation reads a
//! snapshot file; the format is picked from the file extension.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BsmiError, Result};
use crate::models::{EngineeringModel, Iteration, ModelInfo, ModelSnapshot};

/// Snapshot file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Json,
}

impl SourceFormat {
    /// Infers the format from the file extension, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SourceFormat::Json,
            Some("yaml") | Some("yml") => SourceFormat::Yaml,
            _ => SourceFormat::Yaml,
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Yaml => write!(f, "YAML"),
            SourceFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Who opens the model
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Source of engineering model iterations
pub trait ModelProvider {
    /// Where the provider reads from
    fn source(&self) -> &Path;

    fn credentials(&self) -> &Credentials;

    /// Reads the complete snapshot
    fn load_snapshot(&self) -> Result<ModelSnapshot>;

    /// Opens iteration `number` of `model` on behalf of `domain`
    ///
    /// When the model lists participants, the user must be one of them and
    /// `domain` must be one of that participant's domains.
    fn get_iteration(&self, model: &str, number: u32, domain: &str) -> Result<Iteration> {
        let snapshot = self.load_snapshot()?;

        let engineering_model = snapshot
            .models
            .into_iter()
            .find(|m| m.short_name == model)
            .ok_or_else(|| BsmiError::ModelNotFound(model.to_string()))?;

        authorize(&engineering_model, &self.credentials().username, domain)?;

        let EngineeringModel {
            short_name,
            name,
            definition,
            iterations,
            ..
        } = engineering_model;

        let mut iteration = iterations
            .into_iter()
            .find(|i| i.number == number)
            .ok_or_else(|| BsmiError::IterationNotFound {
                model: model.to_string(),
                number,
            })?;

        iteration.model = ModelInfo {
            short_name,
            name,
            definition,
        };

        log::info!(
            "opened iteration {} of model {} as {} for domain {}",
            number,
            model,
            self.credentials().username,
            domain
        );
        Ok(iteration)
    }
}

fn authorize(model: &EngineeringModel, username: &str, domain: &str) -> Result<()> {
    if model.participants.is_empty() {
        return Ok(());
    }

    let participant = model
        .participants
        .iter()
        .find(|p| p.username == username)
        .ok_or_else(|| {
            BsmiError::AuthenticationFailed(format!(
                "{} is not a participant of model {}",
                username, model.short_name
            ))
        })?;

    if !participant.domains.iter().any(|d| d == domain) {
        return Err(BsmiError::AuthenticationFailed(format!(
            "{} may not act for domain {} in model {}",
            username, domain, model.short_name
        )));
    }

    Ok(())
}

/// Reads a YAML or JSON snapshot file
pub struct FileModelProvider {
    path: PathBuf,
    format: SourceFormat,
    credentials: Credentials,
}

impl FileModelProvider {
    pub fn new<P: AsRef<Path>>(path: P, credentials: Credentials) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            format: SourceFormat::from_path(&path),
            path,
            credentials,
        }
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }
}

impl ModelProvider for FileModelProvider {
    fn source(&self) -> &Path {
        &self.path
    }

    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn load_snapshot(&self) -> Result<ModelSnapshot> {
        log::debug!("reading {} snapshot {}", self.format, self.path.display());
        let content = fs::read_to_string(&self.path)?;

        let snapshot = match self.format {
            SourceFormat::Yaml => serde_yaml::from_str(&content)?,
            SourceFormat::Json => serde_json::from_str(&content)?,
        };
        Ok(snapshot)
    }
}

/// Turns a `--data-source` value into an existing snapshot path
///
/// Remote sources are not supported. A relative path that does not exist is
/// also looked up next to the executable.
pub fn resolve_data_source(data_source: &str) -> Result<PathBuf> {
    let lower = data_source.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Err(BsmiError::ConnectionFailed(format!(
            "remote data source {} is not supported, use a snapshot file",
            data_source
        )));
    }

    let path = PathBuf::from(data_source);
    if path.is_file() {
        return Ok(path);
    }

    if path.is_relative() {
        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(&path)));
        if let Some(candidate) = beside_exe.filter(|p| p.is_file()) {
            return Ok(candidate);
        }
    }

    Err(BsmiError::ConnectionFailed(format!(
        "data source {} could not be found",
        data_source
    )))
}

/// Resolves `data_source` and opens a provider for it
pub fn open_provider(data_source: &str, credentials: Credentials) -> Result<Box<dyn ModelProvider>> {
    let path = resolve_data_source(data_source)?;
    Ok(Box::new(FileModelProvider::new(path, credentials)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EngineeringModel, Participant};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn snapshot() -> ModelSnapshot {
        let mut iteration = Iteration::new(2);
        iteration.description = "second".to_string();

        ModelSnapshot {
            models: vec![EngineeringModel {
                short_name: "SAT".to_string(),
                name: "Satellite".to_string(),
                definition: "test model".to_string(),
                participants: vec![Participant {
                    username: "admin".to_string(),
                    domains: vec!["SYS".to_string()],
                }],
                iterations: vec![Iteration::new(1), iteration],
            }],
        }
    }

    fn write_snapshot(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn admin() -> Credentials {
        Credentials::new("admin", Some("pass".to_string()))
    }

    #[test]
    fn test_source_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("m.json")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("m.yml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("m.snapshot")), SourceFormat::Yaml);
    }

    #[test]
    fn test_get_iteration_from_yaml() {
        let file = write_snapshot(".yaml", &serde_yaml::to_string(&snapshot()).unwrap());
        let provider = FileModelProvider::new(file.path(), admin());

        let iteration = provider.get_iteration("SAT", 2, "SYS").unwrap();
        assert_eq!(iteration.number, 2);
        assert_eq!(iteration.description, "second");
        assert_eq!(iteration.model.short_name, "SAT");
        assert_eq!(iteration.model.name, "Satellite");
    }

    #[test]
    fn test_get_iteration_from_json() {
        let file = write_snapshot(".json", &serde_json::to_string(&snapshot()).unwrap());
        let provider = FileModelProvider::new(file.path(), admin());
        assert_eq!(provider.format(), SourceFormat::Json);

        let iteration = provider.get_iteration("SAT", 1, "SYS").unwrap();
        assert_eq!(iteration.number, 1);
    }

    #[test]
    fn test_missing_model_and_iteration() {
        let file = write_snapshot(".yaml", &serde_yaml::to_string(&snapshot()).unwrap());
        let provider = FileModelProvider::new(file.path(), admin());

        assert!(matches!(
            provider.get_iteration("NOPE", 1, "SYS"),
            Err(BsmiError::ModelNotFound(m)) if m == "NOPE"
        ));
        assert!(matches!(
            provider.get_iteration("SAT", 7, "SYS"),
            Err(BsmiError::IterationNotFound { number: 7, .. })
        ));
    }

    #[test]
    fn test_participant_and_domain_are_checked() {
        let file = write_snapshot(".yaml", &serde_yaml::to_string(&snapshot()).unwrap());

        let stranger = FileModelProvider::new(file.path(), Credentials::new("guest", None));
        assert!(matches!(
            stranger.get_iteration("SAT", 1, "SYS"),
            Err(BsmiError::AuthenticationFailed(_))
        ));

        let admin = FileModelProvider::new(file.path(), admin());
        assert!(matches!(
            admin.get_iteration("SAT", 1, "PWR"),
            Err(BsmiError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_open_model_has_no_participant_check() {
        let mut open = snapshot();
        open.models[0].participants.clear();
        let file = write_snapshot(".yaml", &serde_yaml::to_string(&open).unwrap());

        let provider = FileModelProvider::new(file.path(), Credentials::new("anyone", None));
        assert!(provider.get_iteration("SAT", 1, "ANY").is_ok());
    }

    #[test]
    fn test_unparsable_snapshot() {
        let file = write_snapshot(".json", "{ not json");
        let provider = FileModelProvider::new(file.path(), admin());
        assert!(matches!(provider.load_snapshot(), Err(BsmiError::Json(_))));
    }

    #[test]
    fn test_resolve_data_source() {
        let file = write_snapshot(".yaml", "models: []\n");
        let source = file.path().to_string_lossy().to_string();

        assert_eq!(resolve_data_source(&source).unwrap(), file.path());
        assert!(matches!(
            resolve_data_source("https://cdp4services.example.com"),
            Err(BsmiError::ConnectionFailed(_))
        ));
        assert!(matches!(
            resolve_data_source("definitely/not/here.yaml"),
            Err(BsmiError::ConnectionFailed(_))
        ));

        let provider = open_provider(&source, admin()).unwrap();
        assert_eq!(provider.source(), file.path());
        assert!(provider.load_snapshot().unwrap().models.is_empty());
    }
}
