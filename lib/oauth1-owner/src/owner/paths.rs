//! Paths from logical user fields to locations in the provider response.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field of the user unique identifier.
pub const IDENTIFIER: &str = "identifier";
/// Field of the user nickname.
pub const NICKNAME: &str = "nickname";
/// Field of the user real name.
pub const REALNAME: &str = "realname";
/// Field of the user email.
pub const EMAIL: &str = "email";
/// Field of the user profile picture URL.
pub const PROFILE_PICTURE: &str = "profilepicture";

/// Location of a field in the provider response.
///
/// A dotted path walks nested objects (and arrays with numeric segments);
/// a list of paths joins the resolved values with a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldPath {
    /// A dotted path, like `user.screen_name`.
    Single(String),
    /// Paths whose values are joined with a space, like `[first_name, last_name]`.
    Concat(Vec<String>),
}

impl FieldPath {
    /// Resolves the path in a raw response.
    ///
    /// Strings are returned as-is, numbers and booleans are stringified;
    /// anything else is unresolved.
    pub fn resolve(&self, raw: &Map<String, Value>) -> Option<String> {
        match self {
            Self::Single(path) => resolve_single(path, raw),
            Self::Concat(paths) => {
                let values = paths
                    .iter()
                    .filter_map(|path| resolve_single(path, raw))
                    .filter(|value| !value.is_empty())
                    .collect::<Vec<_>>();
                (!values.is_empty()).then(|| values.join(" "))
            }
        }
    }
}

fn resolve_single(path: &str, raw: &Map<String, Value>) -> Option<String> {
    let mut segments = path.split('.');
    let first = raw.get(segments.next()?)?;
    let value = segments.try_fold(first, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    })?;

    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::Single(path.to_string())
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::Single(path)
    }
}

impl<const N: usize> From<[&str; N]> for FieldPath {
    fn from(paths: [&str; N]) -> Self {
        Self::Concat(paths.iter().map(ToString::to_string).collect())
    }
}

/// Mapping from logical field names to [`FieldPath`]s.
///
/// ```rust
/// use oauth1_owner::Paths;
///
/// let mut paths = Paths::new().with("identifier", "id");
/// paths.merge(Paths::new().with("nickname", "screen_name"));
///
/// assert_eq!(paths.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Paths(IndexMap<String, FieldPath>);

impl Paths {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a path.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, path: impl Into<FieldPath>) -> Self {
        self.0.insert(field.into(), path.into());
        self
    }

    /// Merges other paths: new fields are added, existing ones are replaced.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Returns the path of a field.
    pub fn get(&self, field: &str) -> Option<&FieldPath> {
        self.0.get(field)
    }

    /// Resolves a field in a raw response.
    pub fn resolve(&self, field: &str, raw: &Map<String, Value>) -> Option<String> {
        self.get(field)?.resolve(raw)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no field is mapped.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over fields and their paths.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldPath)> {
        self.0.iter().map(|(field, path)| (field.as_str(), path))
    }
}

impl<K, P> FromIterator<(K, P)> for Paths
where
    K: Into<String>,
    P: Into<FieldPath>,
{
    fn from_iter<T: IntoIterator<Item = (K, P)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, path)| (field.into(), path.into()))
                .collect(),
        )
    }
}
