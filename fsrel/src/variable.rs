//! Variable names.
//!
//! A [`Variable`] names one column of a dataset. Two variables are the same
//! variable exactly when their names are equal; there is no other identity.
use std::{borrow::Borrow, fmt, ops::Deref, sync::Arc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of a quantity (column) taking part in relations.
///
/// Backed by an `Arc<str>` so cloning is a reference-count bump. Ordering,
/// equality and hashing are those of the underlying string, which allows maps
/// keyed by `Variable` to be queried with a plain `&str`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Variable(Arc<str>);

impl Variable {
    /// Create a variable from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The variable name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Variable {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Variable {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Variable {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&Variable> for Variable {
    fn from(value: &Variable) -> Self {
        value.clone()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl PartialEq<str> for Variable {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Variable {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn equality_is_by_name() {
        let a = Variable::new("a");
        let b = Variable::from(String::from("a"));
        assert_eq!(a, b);
        assert_eq!(a, "a");
        assert_ne!(a, Variable::new("aa"));
    }

    #[test]
    fn sets_can_be_queried_with_str() {
        let set: BTreeSet<Variable> = ["b", "a", "c"].into_iter().map(Variable::from).collect();
        assert!(set.contains("a"));
        assert!(!set.contains("d"));
        let names: Vec<&str> = set.iter().map(Variable::as_str).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
