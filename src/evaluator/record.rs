use serde::ser::{Serialize, SerializeMap, Serializer};
use url::Url;

pub const BASE_URL: &str = "BASE_URL";
pub const FULL_URL: &str = "FULL_URL";

/// Rule name to extracted values, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionRecord {
    entries: Vec<(String, Vec<ExtractionValue>)>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum ExtractionValue {
    Text(String),
    Record(ExtractionRecord),
}

impl ExtractionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&ExtractionRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Text(_) => None,
        }
    }
}

impl ExtractionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `values` under `name`. An existing entry is overwritten in place.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<ExtractionValue>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((name, values)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[ExtractionValue]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Leaf strings stored under `name`; nested records are skipped.
    pub fn texts(&self, name: &str) -> Option<Vec<&str>> {
        self.get(name)
            .map(|values| values.iter().filter_map(ExtractionValue::as_text).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ExtractionValue])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// The record as handed to templating: `BASE_URL` and `FULL_URL` for the page,
    /// followed by the extracted entries.
    pub fn with_page_urls(&self, page_url: &Url) -> Self {
        let mut tokens = Self::new();
        tokens.insert(
            BASE_URL,
            vec![ExtractionValue::Text(page_url.origin().ascii_serialization())],
        );
        tokens.insert(FULL_URL, vec![ExtractionValue::Text(page_url.to_string())]);
        for (name, values) in &self.entries {
            tokens.insert(name.clone(), values.clone());
        }
        tokens
    }
}

impl Serialize for ExtractionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}
