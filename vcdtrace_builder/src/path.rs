use std::ops::Index;

use itertools::Itertools;

use super::BuilderError;

/// A dotted registration path, e.g. `root.mod1.submod_a.ke`. Unique per traced value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarPath(Vec<String>);

impl VarPath {
    pub fn new(root: &str) -> Result<Self, BuilderError> {
        validate_segment(root)?;
        Ok(Self(vec![root.to_owned()]))
    }

    /// Extend the path by one segment.
    pub fn append(mut self, name: &str) -> Result<Self, BuilderError> {
        validate_segment(name)?;
        self.0.push(name.to_owned());
        Ok(self)
    }

    pub fn peek(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Split the last element from the path, returning the parent path and the last element.
    pub fn split_last(mut self) -> Option<(Self, String)> {
        self.0.pop().map(|last| (self, last))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// A segment becomes part of a `$scope`/`$var` line, so it cannot contain the separator or
/// whitespace.
fn validate_segment(name: &str) -> Result<(), BuilderError> {
    if name.is_empty() || name.contains('.') || name.contains(char::is_whitespace) {
        Err(BuilderError::InvalidPath(name.to_owned()))
    } else {
        Ok(())
    }
}

impl TryFrom<&str> for VarPath {
    type Error = BuilderError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let inner = value.split('.').map(str::to_owned).collect_vec();
        if inner.iter().any(|segment| validate_segment(segment).is_err()) {
            Err(BuilderError::InvalidPath(value.to_owned()))
        } else {
            Ok(Self(inner))
        }
    }
}

impl std::fmt::Display for VarPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join("."))
    }
}

impl Index<usize> for VarPath {
    type Output = String;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

#[test]
fn test_path() {
    let path = VarPath::try_from("root.mod1.submod_a.ke").unwrap();
    assert_eq!(path.to_string(), "root.mod1.submod_a.ke");
    assert_eq!(path[0], "root");
    assert_eq!(path[2], "submod_a");
    assert_eq!(path.len(), 4);

    let (parent, last) = path.split_last().unwrap();
    assert_eq!(parent.to_string(), "root.mod1.submod_a");
    assert_eq!(last, "ke");

    let path = VarPath::new("root").unwrap().append("mod1").unwrap();
    assert_eq!(path.peek(), Some("mod1"));
    assert_eq!(path.segments().collect::<Vec<_>>(), ["root", "mod1"]);
}

#[test]
fn test_invalid_path() {
    assert!(matches!(
        VarPath::try_from("root..ke"),
        Err(BuilderError::InvalidPath(path)) if path == "root..ke"
    ));
    assert!(VarPath::try_from("").is_err());
    assert!(matches!(
        VarPath::new("root").unwrap().append("has space"),
        Err(BuilderError::InvalidPath(name)) if name == "has space"
    ));
    assert!(VarPath::new("a.b").is_err());
}
