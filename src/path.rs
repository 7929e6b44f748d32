//! Fluent builder for route keys.
//!
//! ```rust
//! use apikit::PathBuilder;
//!
//! let users = PathBuilder::new("users");
//! let profile = users.append(["42", "/profile/"]);
//!
//! assert_eq!(profile.path(), "/users/42/profile");
//! assert_eq!(profile.methods().get, "GET /users/42/profile");
//! assert_eq!(users.path(), "/users");
//! ```

use std::fmt;

/// An immutable, normalized base path.
///
/// Always starts with `/` and never ends with `/` unless it is the root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathBuilder {
    base: String,
}

impl PathBuilder {
    pub fn new(base: &str) -> Self {
        let trimmed = base.trim_end_matches('/');
        let base = if trimmed.starts_with('/') {
            trimmed.to_owned()
        } else {
            format!("/{trimmed}")
        };
        Self { base }
    }

    /// Joins `parts` with `/`, trims slashes off both ends of the joined
    /// fragment, and appends it with a single separator.
    ///
    /// Returns a new builder; `self` is unchanged.
    pub fn append<I, S>(&self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = parts
            .into_iter()
            .map(|p| p.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join("/");
        let fragment = joined.trim_matches('/');

        let base = match (fragment.is_empty(), self.base.as_str()) {
            (true, _) => self.base.clone(),
            (false, "/") => format!("/{fragment}"),
            (false, base) => format!("{base}/{fragment}"),
        };
        Self { base }
    }

    pub fn path(&self) -> &str {
        &self.base
    }

    /// The five dispatch keys for this path.
    pub fn methods(&self) -> HttpMethods {
        let key = |method: &str| format!("{method} {}", self.base);
        HttpMethods {
            get: key("GET"),
            post: key("POST"),
            put: key("PUT"),
            patch: key("PATCH"),
            delete: key("DELETE"),
        }
    }
}

impl fmt::Display for PathBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// `"<METHOD> <path>"` route keys, one per verb.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpMethods {
    pub get: String,
    pub post: String,
    pub put: String,
    pub patch: String,
    pub delete: String,
}

impl HttpMethods {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [&self.get, &self.post, &self.put, &self.patch, &self.delete]
            .into_iter()
            .map(String::as_str)
    }
}
