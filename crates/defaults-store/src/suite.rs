//! Domain selection and search lists.

/// Persistent domain consulted by every search list after the primary domain and its suites.
pub const GLOBAL_DOMAIN: &str = "GlobalDomain";

/// Volatile domain holding registered defaults. It is consulted last by every search list and
/// is never persisted.
pub const REGISTRATION_DOMAIN: &str = "RegistrationDomain";

/// Selects the domain a [`SettingsStore`](crate::SettingsStore) reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Suite {
    /// The application's own domain, shared by every standard store in the process.
    #[default]
    Standard,
    /// An independently addressable domain identified by name.
    Named(String),
}

impl From<&str> for Suite {
    fn from(name: &str) -> Self {
        Suite::Named(name.to_owned())
    }
}

/// The ordered list of persistent domains a store consults when reading a key.
///
/// The primary domain comes first, followed by added suites in the order they were added and
/// finally [`GLOBAL_DOMAIN`]. Registered defaults are consulted after all of them. Writes
/// always go to the primary domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchList {
    domain: String,
    suites: Vec<String>,
}

impl SearchList {
    /// Create a search list with `domain` as its primary domain and no added suites.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            suites: Vec::new(),
        }
    }

    /// The primary domain, which receives all writes.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Added suites, in lookup order.
    pub fn suites(&self) -> &[String] {
        &self.suites
    }

    /// Append `name` to the suites consulted after the primary domain.
    ///
    /// Returns `false`, leaving the list unchanged, for reserved domain names, the primary
    /// domain itself, and suites that are already present.
    pub fn add_suite(&mut self, name: &str) -> bool {
        if is_reserved(name) || name == self.domain || self.suites.iter().any(|s| s == name) {
            return false;
        }
        self.suites.push(name.to_owned());
        true
    }

    /// Remove a suite added with [`SearchList::add_suite`]. Returns `false` if it was not present.
    pub fn remove_suite(&mut self, name: &str) -> bool {
        let before = self.suites.len();
        self.suites.retain(|s| s != name);
        self.suites.len() != before
    }

    /// Persistent domains in lookup order, ending with [`GLOBAL_DOMAIN`].
    pub fn persistent_domains(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.domain.as_str())
            .chain(self.suites.iter().map(String::as_str))
            .chain(std::iter::once(GLOBAL_DOMAIN))
    }
}

pub(crate) fn is_reserved(name: &str) -> bool {
    name == GLOBAL_DOMAIN || name == REGISTRATION_DOMAIN
}

/// Checks that `name` can be opened as a named suite. Returns the reason when it cannot.
pub(crate) fn validate_suite_name(name: &str, application_domain: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("suite name is empty");
    }
    if is_reserved(name) {
        return Err("suite name is a reserved domain");
    }
    if name == application_domain {
        return Err("suite name is the application domain");
    }
    if name.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
        return Err("suite name contains a path separator or control character");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_order_is_primary_then_suites_then_global() {
        let mut list = SearchList::new("primary");
        assert!(list.add_suite("first"));
        assert!(list.add_suite("second"));

        let order: Vec<_> = list.persistent_domains().collect();

        assert_eq!(order, vec!["primary", "first", "second", GLOBAL_DOMAIN]);
    }

    #[test]
    fn rejected_suites_leave_list_unchanged() {
        let mut list = SearchList::new("primary");
        assert!(list.add_suite("shared"));

        assert!(!list.add_suite("shared"));
        assert!(!list.add_suite("primary"));
        assert!(!list.add_suite(GLOBAL_DOMAIN));
        assert!(!list.add_suite(REGISTRATION_DOMAIN));

        assert_eq!(list.suites(), ["shared".to_owned()]);
    }

    #[test]
    fn remove_suite_reports_presence() {
        let mut list = SearchList::new("primary");
        list.add_suite("shared");

        assert!(list.remove_suite("shared"));
        assert!(!list.remove_suite("shared"));
        assert!(list.suites().is_empty());
    }

    #[test]
    fn validate_suite_name_rules() {
        assert!(validate_suite_name("group.example", "app").is_ok());
        assert!(validate_suite_name("", "app").is_err());
        assert!(validate_suite_name("app", "app").is_err());
        assert!(validate_suite_name(GLOBAL_DOMAIN, "app").is_err());
        assert!(validate_suite_name("a/b", "app").is_err());
        assert!(validate_suite_name("a\0b", "app").is_err());
    }
}
