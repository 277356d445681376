pub mod catalog;

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::Path,
};

use ahash::RandomState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{EnvMatchError, Result},
    format::{index::FormatIndex, FormatId, PerScheme, Scheme},
};

/// Dense integer id of an environment, assigned in first-seen order
pub type EnvironmentId = u32;

/// A rendering environment and the format identifiers it can read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
    /// readable identifiers per scheme (resolved to ids at query time)
    pub readable: PerScheme<BTreeSet<String>>,
}

/// Environment with its readable formats resolved against a [`FormatIndex`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEnvironment {
    pub id: EnvironmentId,
    pub name: String,
    pub readable: BTreeSet<FormatId>,
}

/// Environment definition file: a name and the programs installed in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDefinition {
    pub name: String,
    pub programs: Vec<String>,
}

/// Source of the formats a program can read
///
/// The knowledge base behind it (usually a remote query service) is not part
/// of this crate. Implementations return identifiers of the given scheme.
pub trait CapabilityLookup {
    fn readable_formats(&self, program: &str, scheme: Scheme) -> Result<Vec<String>>;
}

/// In-memory [`CapabilityLookup`]; unknown programs read nothing
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities {
    programs: HashMap<String, PerScheme<Vec<String>>, RandomState>,
}

impl StaticCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, S>(&mut self, program: &str, scheme: Scheme, formats: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.programs.entry(program.to_string()).or_default();
        entry[scheme].extend(formats.into_iter().map(Into::into));
    }
}

impl CapabilityLookup for StaticCapabilities {
    fn readable_formats(&self, program: &str, scheme: Scheme) -> Result<Vec<String>> {
        match self.programs.get(program) {
            Some(formats) => Ok(formats[scheme].clone()),
            None => {
                log::debug!("no {} formats known for program `{}`", scheme, program);
                Ok(Vec::new())
            }
        }
    }
}

/// Known environments in id order
///
/// # Serialization
/// Persisted as the list of environments; the id counter is restored to
/// `max(id) + 1` on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RegistryRepr", into = "RegistryRepr")]
pub struct EnvironmentRegistry {
    environments: IndexMap<String, Environment>,
    counter: EnvironmentId,
}

#[derive(Serialize, Deserialize)]
struct RegistryRepr {
    environments: Vec<Environment>,
}

impl From<RegistryRepr> for EnvironmentRegistry {
    fn from(repr: RegistryRepr) -> Self {
        let counter = repr.environments.iter().map(|e| e.id).max().map_or(0, |max| max + 1);
        let mut environments: Vec<Environment> = repr.environments;
        environments.sort_by_key(|e| e.id);
        Self {
            environments: environments.into_iter().map(|e| (e.name.clone(), e)).collect(),
            counter,
        }
    }
}

impl From<EnvironmentRegistry> for RegistryRepr {
    fn from(registry: EnvironmentRegistry) -> Self {
        Self {
            environments: registry.environments.into_values().collect(),
        }
    }
}

impl EnvironmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `name`, registering it with no readable formats if unseen
    pub fn ensure(&mut self, name: &str) -> EnvironmentId {
        if let Some(env) = self.environments.get(name) {
            return env.id;
        }
        let id = self.counter;
        self.counter += 1;
        self.environments.insert(
            name.to_string(),
            Environment { id, name: name.to_string(), readable: PerScheme::default() },
        );
        id
    }

    /// Union `identifiers` into the readable set of `name`
    pub fn add_readable<I, S>(&mut self, name: &str, scheme: Scheme, identifiers: I) -> EnvironmentId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = self.ensure(name);
        if let Some(env) = self.environments.get_mut(name) {
            env.readable[scheme].extend(identifiers.into_iter().map(Into::into));
        }
        id
    }

    /// Replace the readable set of `name` for one scheme
    pub fn set_readable(&mut self, name: &str, scheme: Scheme, identifiers: BTreeSet<String>) -> EnvironmentId {
        let id = self.ensure(name);
        if let Some(env) = self.environments.get_mut(name) {
            env.readable[scheme] = identifiers;
        }
        id
    }

    /// Register an environment from its definition
    ///
    /// The formats of every program are looked up for both schemes and
    /// unioned. An existing environment of the same name keeps its id and
    /// gains the new formats.
    pub fn add_definition(
        &mut self,
        definition: &EnvironmentDefinition,
        lookup: &dyn CapabilityLookup,
    ) -> Result<EnvironmentId> {
        if self.environments.contains_key(&definition.name) {
            log::warn!("environment `{}` already exists, merging its formats", definition.name);
        }
        let mut readable: PerScheme<BTreeSet<String>> = PerScheme::default();
        for program in &definition.programs {
            for scheme in Scheme::ALL {
                let formats = lookup.readable_formats(program, scheme)?;
                if formats.is_empty() {
                    log::info!("program `{}` has no readable {} formats", program, scheme);
                }
                readable[scheme].extend(formats);
            }
        }
        let id = self.ensure(&definition.name);
        for (scheme, formats) in readable.iter() {
            self.add_readable(&definition.name, scheme, formats.iter().cloned());
        }
        Ok(id)
    }

    /// Parse and register one definition file
    pub fn add_definition_file(&mut self, path: impl AsRef<Path>, lookup: &dyn CapabilityLookup) -> Result<EnvironmentId> {
        let bytes = fs::read(path.as_ref())?;
        let definition: EnvironmentDefinition = serde_json::from_str(&String::from_utf8_lossy(&bytes))?;
        self.add_definition(&definition, lookup)
    }

    /// Register every definition file of a directory, in file-name order
    ///
    /// Files that fail to parse are logged and skipped. Returns the number of
    /// definitions added.
    pub fn add_definition_dir(&mut self, dir: impl AsRef<Path>, lookup: &dyn CapabilityLookup) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(EnvMatchError::MissingState(dir.to_path_buf()));
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();
        let mut added = 0;
        for path in paths {
            match self.add_definition_file(&path, lookup) {
                Ok(_) => added += 1,
                Err(e) => log::warn!("skipping environment file {}: {}", path.display(), e),
            }
        }
        Ok(added)
    }

    pub fn remove(&mut self, name: &str) -> Result<Environment> {
        self.environments
            .shift_remove(name)
            .ok_or_else(|| EnvMatchError::UnknownEnvironment(name.to_string()))
    }

    /// Forget every environment; ids keep counting
    pub fn clear(&mut self) {
        self.environments.clear();
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Environment> {
        self.environments.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Environment> {
        self.environments.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.environments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// Readable sets of one scheme as [`FormatId`]s, in id order
    ///
    /// Identifiers the index has not seen yet get fresh ids.
    pub fn resolve(&self, scheme: Scheme, index: &mut FormatIndex) -> Vec<ResolvedEnvironment> {
        self.environments
            .values()
            .map(|env| ResolvedEnvironment {
                id: env.id,
                name: env.name.clone(),
                readable: env.readable[scheme].iter().map(|f| index.ensure(f)).collect(),
            })
            .collect()
    }
}
