//! Table identity: namespace sequence plus table name.

use serde::{Deserialize, Serialize};

/// Identifies a table in the catalog.
///
/// Displayed and parsed in dotted form, e.g. `my_database.users`. The last
/// segment is the table name; every preceding segment is a namespace level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdentity {
    pub namespace: Vec<String>,
    pub name: String,
}

impl TableIdentity {
    pub fn new<I, S>(namespace: I, name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into_iter().map(Into::into).collect(),
            name: name.into(),
        }
    }

    /// Path segments, namespace first, table name last.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.namespace
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
    }
}

impl std::fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ns in &self.namespace {
            write!(f, "{ns}.")?;
        }
        f.write_str(&self.name)
    }
}

impl std::str::FromStr for TableIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('.').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(format!(
                "Invalid table identity: '{s}'. Expected 'namespace.table'"
            ));
        }
        let name = parts.pop().unwrap_or_default().to_string();
        Ok(Self::new(parts, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = TableIdentity::new(["my_database"], "users");
        assert_eq!(id.to_string(), "my_database.users");
        assert_eq!("my_database.users".parse::<TableIdentity>().unwrap(), id);

        let nested: TableIdentity = "a.b.c".parse().unwrap();
        assert_eq!(nested.namespace, vec!["a", "b"]);
        assert_eq!(nested.name, "c");
        assert_eq!(nested.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<TableIdentity>().is_err());
        assert!("db..users".parse::<TableIdentity>().is_err());
        assert!("db.".parse::<TableIdentity>().is_err());
    }

    #[test]
    fn test_no_namespace() {
        let id: TableIdentity = "users".parse().unwrap();
        assert!(id.namespace.is_empty());
        assert_eq!(id.to_string(), "users");
    }
}
