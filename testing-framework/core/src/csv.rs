use std::{convert::Infallible, fmt, ops::Deref, str::FromStr};

/// Ordered list of values carried as a single comma-delimited string.
///
/// Values are split on every comma with no escaping, so a value that itself
/// contains a comma cannot be represented. The empty string decodes to an
/// empty list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Csv(Vec<String>);

impl Csv {
    #[must_use]
    pub const fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    /// Replace the held values with the ones parsed from `raw`.
    pub fn set(&mut self, raw: &str) {
        *self = Self::parse(raw);
    }

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        Self(raw.split(',').map(str::to_owned).collect())
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Csv {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Csv {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Csv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl From<Vec<String>> for Csv {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl<'a> FromIterator<&'a str> for Csv {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_owned).collect())
    }
}
