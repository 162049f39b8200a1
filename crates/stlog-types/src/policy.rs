//! Namespace acceptance policies.

use std::collections::HashSet;

use crate::namespace::Namespace;

/// Which submitter namespaces the log accepts on `add-entry`.
///
/// Membership is exact byte equality on the serialized namespace, the same
/// identity rule used everywhere else.
#[derive(Debug, Clone)]
pub enum AcceptPolicy {
    /// Accept every well-formed namespace.
    Any,
    /// Accept only the listed namespaces.
    Set(HashSet<Vec<u8>>),
}

impl AcceptPolicy {
    /// Build a set policy from namespaces.
    pub fn from_namespaces<'a, I>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = &'a Namespace>,
    {
        AcceptPolicy::Set(namespaces.into_iter().map(Namespace::marshal).collect())
    }

    pub fn accepts(&self, namespace: &Namespace) -> bool {
        match self {
            AcceptPolicy::Any => true,
            AcceptPolicy::Set(set) => set.contains(&namespace.marshal()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_accepts_everything() {
        assert!(AcceptPolicy::Any.accepts(&Namespace::new_ed25519([0u8; 32])));
    }

    #[test]
    fn set_accepts_members_only() {
        let member = Namespace::new_ed25519([1u8; 32]);
        let outsider = Namespace::new_ed25519([2u8; 32]);
        let policy = AcceptPolicy::from_namespaces([&member]);
        assert!(policy.accepts(&member));
        assert!(!policy.accepts(&outsider));
    }
}
