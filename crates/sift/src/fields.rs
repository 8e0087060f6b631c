//! Default field bindings for parsed input.

/// The field or fields that unqualified terms of parsed input search.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSet {
    /// One field.
    Single(String),
    /// Several fields, each with an optional score multiplier.
    Multi(Vec<(String, Option<f32>)>),
}

impl FieldSet {
    /// Binds several fields without boosts.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Multi(names.into_iter().map(|n| (n.into(), None)).collect())
    }

    /// Binds several fields, each with a boost.
    pub fn boosted<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        Self::Multi(
            fields
                .into_iter()
                .map(|(n, boost)| (n.into(), Some(boost)))
                .collect(),
        )
    }
}

impl From<&str> for FieldSet {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for FieldSet {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<&String> for FieldSet {
    fn from(name: &String) -> Self {
        Self::Single(name.clone())
    }
}

impl<const N: usize> From<[&str; N]> for FieldSet {
    fn from(names: [&str; N]) -> Self {
        Self::fields(names)
    }
}

impl From<&[&str]> for FieldSet {
    fn from(names: &[&str]) -> Self {
        Self::fields(names.iter().copied())
    }
}

impl From<Vec<String>> for FieldSet {
    fn from(names: Vec<String>) -> Self {
        Self::fields(names)
    }
}

impl<const N: usize> From<[(&str, f32); N]> for FieldSet {
    fn from(fields: [(&str, f32); N]) -> Self {
        Self::boosted(fields)
    }
}

impl From<Vec<(String, f32)>> for FieldSet {
    fn from(fields: Vec<(String, f32)>) -> Self {
        Self::boosted(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(FieldSet::from("foo"), FieldSet::Single("foo".into()));
        assert_eq!(
            FieldSet::from(["a", "b"]),
            FieldSet::Multi(vec![("a".into(), None), ("b".into(), None)])
        );
        assert_eq!(
            FieldSet::from([("title", 2.0)]),
            FieldSet::Multi(vec![("title".into(), Some(2.0))])
        );
    }
}
