use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// Built-in extraction type names, as spelled in rule documents.
pub const BUILT_IN_TYPES: [&str; 3] = ["article", "feed", "custom"];

/// A validated, normalized rule document. Only obtainable through
/// [`crate::schema::validate`], and immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RuleDocument {
    pub(crate) info: RuleInfo,
    pub(crate) rules: Vec<Rule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) redirect: Option<RedirectSpec>,
}

impl RuleDocument {
    pub fn info(&self) -> &RuleInfo {
        &self.info
    }

    /// User rules followed by any built-in rules they did not shadow.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn redirect(&self) -> Option<&RedirectSpec> {
        self.redirect.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Whether this document handles the given page URL.
    pub fn is_match(&self, url: &str) -> bool {
        self.info.matcher.is_match(url)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInfo {
    pub(crate) name: String,
    pub(crate) extraction_type: ExtractionType,
    pub(crate) domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) path_pattern: Option<String>,
    pub(crate) suggested_pattern: String,
    #[serde(skip)]
    pub(crate) matcher: Regex,
    pub(crate) test_pages: Vec<String>,
    pub(crate) author: Author,
    pub(crate) description: String,
}

impl RuleInfo {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn extraction_type(&self) -> &ExtractionType {
        &self.extraction_type
    }
    pub fn domain(&self) -> &str {
        &self.domain
    }
    pub fn path_pattern(&self) -> Option<&str> {
        self.path_pattern.as_deref()
    }
    /// Declared pattern, or the one derived from `domain` and `path_pattern`.
    pub fn suggested_pattern(&self) -> &str {
        &self.suggested_pattern
    }
    pub fn test_pages(&self) -> &[String] {
        &self.test_pages
    }
    pub fn author(&self) -> &Author {
        &self.author
    }
    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionType {
    Article,
    Feed,
    Custom(String),
}

impl ExtractionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Article => "article",
            Self::Feed => "feed",
            Self::Custom(custom) => custom,
        }
    }
}

impl Serialize for ExtractionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub name: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: UNKNOWN_AUTHOR.to_string(),
            metadata: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub name: String,
    #[serde(flatten)]
    pub source: RuleSource,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_rules: Vec<Rule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<Rewrite>,
}

impl Rule {
    pub fn has_sub_rules(&self) -> bool {
        !self.sub_rules.is_empty()
    }
}

/// Where a rule's values come from. Exactly one per rule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleSource {
    Match(MatchSpec),
    /// Attribute read off the context node itself.
    Attribute(String),
    LiteralValues(Vec<String>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MatchSpec {
    Single(MatchBlock),
    /// Ordered alternation; the first branch with a non-empty result wins.
    Any { or: Vec<MatchBlock> },
}

impl MatchSpec {
    pub fn blocks(&self) -> &[MatchBlock] {
        match self {
            Self::Single(block) => std::slice::from_ref(block),
            Self::Any { or } => or,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchBlock {
    pub include: String,
    pub exclude: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    pub outer_node: bool,
    pub keep_basic_markup: bool,
    pub remove_inside: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_next_until: Option<String>,
}

impl MatchBlock {
    pub fn new(include: impl Into<String>) -> Self {
        Self {
            include: include.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Rewrite {
    #[serde(serialize_with = "serialize_regex")]
    pub find: Regex,
    pub output: String,
}

fn serialize_regex<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(regex.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSpec {
    /// Parameter name and the literal value it must carry, in declared order.
    pub required_query_params: Vec<(String, String)>,
}
