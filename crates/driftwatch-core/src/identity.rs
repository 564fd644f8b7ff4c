//! Backend identity and the session baseline it is compared against.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one running backend process.
///
/// `version` is the release version; `instance_id` is unique per process
/// start, so a restart of the same release still changes the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub version: String,
    pub instance_id: String,
}

impl Identity {
    pub fn new(version: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            instance_id: instance_id.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.version, self.instance_id)
    }
}

/// Reference identity captured for this session.
///
/// Starts `Unset`. Only startup capture and null-baseline adoption move it
/// to `Set`; a detected drift never overwrites it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "identity", rename_all = "lowercase")]
pub enum Baseline {
    #[default]
    Unset,
    Set(Identity),
}

impl Baseline {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Set(identity) => Some(identity),
            Self::Unset => None,
        }
    }
}
