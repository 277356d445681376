pub mod index;
pub mod report;

use std::{fmt, ops::{Index, IndexMut}, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EnvMatchError;

/// Dense integer id of a file format, unique within one scheme
pub type FormatId = u32;

/// File-format identifier vocabulary
///
/// The two schemes are disjoint namespaces. They never share ids, matrices or
/// statistics; every per-scheme structure lives in a [`PerScheme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Wikidata QIDs, e.g. `Q26085`
    Wikidata,
    /// PRONOM PUIDs, e.g. `fmt/43`
    Pronom,
}

impl Scheme {
    pub const ALL: [Scheme; 2] = [Scheme::Wikidata, Scheme::Pronom];

    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Wikidata => "wikidata",
            Scheme::Pronom => "pronom",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = EnvMatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wikidata" => Ok(Scheme::Wikidata),
            "pronom" => Ok(Scheme::Pronom),
            other => Err(EnvMatchError::UnknownScheme(other.to_string())),
        }
    }
}

/// One value per identifier scheme
///
/// Indexing by [`Scheme`] selects the instance, so scheme-specific code is
/// written once and instantiated twice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerScheme<T> {
    pub wikidata: T,
    pub pronom: T,
}

impl<T> PerScheme<T> {
    pub fn new(wikidata: T, pronom: T) -> Self {
        Self { wikidata, pronom }
    }

    /// Build both instances from the same constructor
    pub fn from_fn(mut f: impl FnMut(Scheme) -> T) -> Self {
        Self {
            wikidata: f(Scheme::Wikidata),
            pronom: f(Scheme::Pronom),
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Scheme, T) -> U) -> PerScheme<U> {
        PerScheme {
            wikidata: f(Scheme::Wikidata, self.wikidata),
            pronom: f(Scheme::Pronom, self.pronom),
        }
    }

    pub fn as_ref(&self) -> PerScheme<&T> {
        PerScheme {
            wikidata: &self.wikidata,
            pronom: &self.pronom,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Scheme, &T)> {
        [(Scheme::Wikidata, &self.wikidata), (Scheme::Pronom, &self.pronom)].into_iter()
    }
}

impl<T> Index<Scheme> for PerScheme<T> {
    type Output = T;

    #[inline]
    fn index(&self, scheme: Scheme) -> &T {
        match scheme {
            Scheme::Wikidata => &self.wikidata,
            Scheme::Pronom => &self.pronom,
        }
    }
}

impl<T> IndexMut<Scheme> for PerScheme<T> {
    #[inline]
    fn index_mut(&mut self, scheme: Scheme) -> &mut T {
        match scheme {
            Scheme::Wikidata => &mut self.wikidata,
            Scheme::Pronom => &mut self.pronom,
        }
    }
}
