use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Environment of one process, keyed by variable name.
pub type Environment = BTreeMap<String, String>;

/// A per-process field that may not be readable by the caller.
///
/// Serializes as the inner value, or `null` when unavailable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Detail<T> {
    Available(T),
    Unavailable,
}

impl<T> Detail<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable => None,
        }
    }
}

impl<T> From<Option<T>> for Detail<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Available(v),
            None => Self::Unavailable,
        }
    }
}

impl<T> From<io::Result<T>> for Detail<T> {
    fn from(value: io::Result<T>) -> Self {
        value.ok().into()
    }
}

/// One live process as seen at snapshot time.
///
/// Fields are fixed at construction; a new snapshot builds new descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProcessDescriptor {
    id: u32,
    executable_path: Detail<PathBuf>,
    arguments: Detail<Vec<String>>,
    environment_variables: Detail<Environment>,
}

impl ProcessDescriptor {
    pub fn new(
        id: u32,
        executable_path: Detail<PathBuf>,
        arguments: Detail<Vec<String>>,
        environment_variables: Detail<Environment>,
    ) -> Self {
        Self {
            id,
            executable_path,
            arguments,
            environment_variables,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn executable_path(&self) -> Detail<&Path> {
        match &self.executable_path {
            Detail::Available(p) => Detail::Available(p.as_path()),
            Detail::Unavailable => Detail::Unavailable,
        }
    }

    /// Invocation arguments in order, without the program name (argv[0]).
    pub fn arguments(&self) -> &Detail<Vec<String>> {
        &self.arguments
    }

    pub fn environment_variables(&self) -> &Detail<Environment> {
        &self.environment_variables
    }

    /// True when at least one detail field could not be read.
    pub fn is_degraded(&self) -> bool {
        !(self.executable_path.is_available()
            && self.arguments.is_available()
            && self.environment_variables.is_available())
    }
}
