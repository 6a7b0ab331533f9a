//! HTTP-style name-value header fields
use std::io::Write;

/// Data structure for HTTP-style name-value header fields.
///
/// Insertion order is preserved. Inserting a name that is already present
/// overwrites the previous value in place, keeping the original position.
/// Name lookup is an exact match; no case folding is performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.fields.clear()
    }

    /// Inserts a name-value pair, overwriting the value of an existing name.
    pub fn insert<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        let name = name.into();
        let value = value.into();

        match self.fields.iter_mut().find(|(n, _v)| *n == name) {
            Some(field) => field.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|(n, _v)| n != name);
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _v)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _v)| n == name)
            .map(|(_n, v)| v.as_str())
    }

    /// Gets a value parsed as a `u64` permitting only ASCII digits.
    pub fn get_u64_strict(&self, name: &str) -> Option<Result<u64, std::num::ParseIntError>> {
        self.get(name).map(crate::parse::parse_u64_strict)
    }

    pub fn iter(&self) -> HeaderMapIter<'_> {
        HeaderMapIter::new(&self.fields)
    }

    /// Writes the fields in wire format followed by the empty terminator line.
    pub fn serialize<W: Write>(&self, mut buf: W) -> std::io::Result<()> {
        for (name, value) in self {
            buf.write_all(name.as_bytes())?;
            buf.write_all(b": ")?;
            buf.write_all(value.as_bytes())?;
            buf.write_all(b"\r\n")?;
        }

        buf.write_all(b"\r\n")?;

        Ok(())
    }
}

impl IntoIterator for HeaderMap {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a str, &'a str);
    type IntoIter = HeaderMapIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<N: Into<String>, V: Into<String>> Extend<(N, V)> for HeaderMap {
    fn extend<T: IntoIterator<Item = (N, V)>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

pub struct HeaderMapIter<'a> {
    fields: std::slice::Iter<'a, (String, String)>,
}

impl<'a> HeaderMapIter<'a> {
    fn new(fields: &'a [(String, String)]) -> Self {
        Self {
            fields: fields.iter(),
        }
    }
}

impl<'a> Iterator for HeaderMapIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.fields.next().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
