//! Authorization types.

use serde::Deserialize;
use std::fmt;

/// The operation a caller must be allowed to perform.
///
/// Describes "the right to submit token data for this integration" as a
/// verb on a group/version/resource. The namespace is supplied per check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessDescriptor {
    /// API verb, e.g. `create`.
    pub verb: String,
    /// API group of the resource.
    pub group: String,
    /// API version of the resource.
    pub version: String,
    /// Plural resource name.
    pub resource: String,
}

impl Default for AccessDescriptor {
    fn default() -> Self {
        Self {
            verb: "create".to_string(),
            group: "appstudio.redhat.com".to_string(),
            version: "v1beta1".to_string(),
            resource: "spiaccesstokendataupdates".to_string(),
        }
    }
}

impl fmt::Display for AccessDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{}/{}",
            self.verb, self.resource, self.group, self.version
        )
    }
}
