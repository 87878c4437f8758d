//! Command catalog: which components are probed and how.

use core::error::Error;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use error_stack::Report;
use error_stack::ResultExt;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

const DEFAULT_CATALOG: &str = include_str!("default-catalog.yaml");

/// Catalog errors
#[derive(Debug, derive_more::Display)]
pub enum CatalogError {
    #[display("Failed to read catalog file: {path}")]
    Read { path: String },
    #[display("Failed to parse catalog")]
    Parse,
    #[display("Failed to render catalog")]
    Render,
    #[display("Catalog does not contain any component")]
    Empty,
    #[display("Catalog entry has an empty component name")]
    EmptyName,
    #[display("Catalog entry {name} has an empty command")]
    EmptyCommand { name: String },
    #[display("Catalog lists component {name} more than once")]
    DuplicateName { name: String },
}

impl Error for CatalogError {}

/// A single component and the shell command that prints its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEntry {
    pub name: String,
    pub command: String,
}

/// Accepts both `name: cmd` and `name: {command: cmd}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandSpec {
    Plain(String),
    Detailed { command: String },
}

impl CommandSpec {
    fn into_command(self) -> String {
        match self {
            CommandSpec::Plain(command) | CommandSpec::Detailed { command } => command,
        }
    }
}

/// Catalog mapping in document order, repeated keys included.
struct RawCatalog(Vec<(String, CommandSpec)>);

impl<'de> Deserialize<'de> for RawCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawCatalogVisitor;

        impl<'de> Visitor<'de> for RawCatalogVisitor {
            type Value = RawCatalog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of component name to command")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(RawCatalog(entries))
            }
        }

        deserializer.deserialize_map(RawCatalogVisitor)
    }
}

#[derive(Serialize)]
struct CommandOut<'a> {
    command: &'a str,
}

/// Immutable, name-ordered set of components to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<ComponentEntry>,
}

impl Catalog {
    /// Build a catalog from `(name, command)` pairs.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Empty`] if no pair is given
    /// - [`CatalogError::EmptyName`] / [`CatalogError::EmptyCommand`] for blank values
    /// - [`CatalogError::DuplicateName`] if two names are equal once trimmed
    pub fn from_entries<I, N, C>(entries: I) -> Result<Self, Report<CatalogError>>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut by_name = BTreeMap::new();
        for (name, command) in entries {
            let name = name.into().trim().to_string();
            let command = command.into().trim().to_string();
            if name.is_empty() {
                return Err(Report::new(CatalogError::EmptyName));
            }
            if command.is_empty() {
                return Err(Report::new(CatalogError::EmptyCommand { name }));
            }
            if by_name.contains_key(&name) {
                return Err(Report::new(CatalogError::DuplicateName { name }));
            }
            by_name.insert(name, command);
        }

        if by_name.is_empty() {
            return Err(Report::new(CatalogError::Empty));
        }

        Ok(Self {
            entries: by_name
                .into_iter()
                .map(|(name, command)| ComponentEntry { name, command })
                .collect(),
        })
    }

    /// Parse a YAML mapping of component name to command.
    pub fn from_yaml(yaml: &str) -> Result<Self, Report<CatalogError>> {
        let RawCatalog(raw) = serde_yaml::from_str(yaml).change_context(CatalogError::Parse)?;
        Self::from_entries(
            raw.into_iter()
                .map(|(name, spec)| (name, spec.into_command())),
        )
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, Report<CatalogError>> {
        Self::from_yaml(DEFAULT_CATALOG).attach_printable("built-in catalog")
    }

    pub fn from_file(path: &Path) -> Result<Self, Report<CatalogError>> {
        let content = std::fs::read_to_string(path).change_context(CatalogError::Read {
            path: path.display().to_string(),
        })?;
        Self::from_yaml(&content).attach_printable_lazy(|| format!("catalog file {}", path.display()))
    }

    /// Load from `path` if given, otherwise fall back to the built-in catalog.
    pub fn load(path: Option<&Path>) -> Result<Self, Report<CatalogError>> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    pub fn entries(&self) -> &[ComponentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the catalog in the detailed file format.
    pub fn to_yaml(&self) -> Result<String, Report<CatalogError>> {
        let out: BTreeMap<&str, CommandOut<'_>> = self
            .entries
            .iter()
            .map(|entry| {
                (
                    entry.name.as_str(),
                    CommandOut {
                        command: &entry.command,
                    },
                )
            })
            .collect();
        serde_yaml::to_string(&out).change_context(CatalogError::Render)
    }
}
