pub mod defaults;
pub mod errors;
pub mod pattern;
pub mod raw;
pub mod rules;
pub mod types;

pub use errors::ValidationError;
pub use types::{
    Author, ExtractionType, MatchBlock, MatchSpec, RedirectSpec, Rewrite, Rule, RuleDocument,
    RuleInfo, RuleSource,
};

use serde_json::Value;
use tracing::{debug, instrument};

use crate::schema::raw::{
    as_object, as_string, is_present, join, lookup, optional_string, require_string, scalar_to_string,
    string_list,
};
use crate::schema::types::BUILT_IN_TYPES;

/// Validates and normalizes a decoded rule document.
///
/// Either the whole document is valid and a [`RuleDocument`] is returned, or the
/// first problem found is reported with the dotted path of the offending field.
/// Built-in rules are appended for any name the document does not define.
#[instrument(skip_all)]
pub fn validate(raw: &Value) -> Result<RuleDocument, ValidationError> {
    if !is_present(raw) {
        return Err(ValidationError::missing("document"));
    }
    let doc = as_object(raw, "document")?;

    let info = match lookup(doc, &["info"]) {
        Some((key, value)) => validate_info(value, key)?,
        None => return Err(ValidationError::missing("info")),
    };

    let mut rules = match lookup(doc, &["rules"]) {
        Some((key, value)) => rules::validate_rules(value, key)?,
        None => return Err(ValidationError::missing("rules")),
    };
    defaults::append_defaults(&mut rules);

    let redirect = lookup(doc, &["redirect"])
        .map(|(key, value)| validate_redirect(value, key))
        .transpose()?;

    debug!(
        parser = %info.name,
        rules = rules.len(),
        pattern = %info.suggested_pattern,
        "validated rule document"
    );

    Ok(RuleDocument {
        info,
        rules,
        redirect,
    })
}

fn validate_info(raw: &Value, path: &str) -> Result<RuleInfo, ValidationError> {
    let obj = as_object(raw, path)?;

    let name = require_string(obj, path, &["name"])?;
    let extraction_type = validate_type(obj, path)?;
    let domain = require_string(obj, path, &["domain"])?;

    let path_pattern = keyed_string(obj, path, &["path", "pathPattern"])?;
    let declared = keyed_string(obj, path, &["suggestedRegex", "suggestedPattern"])?;

    if let Some((key, path_pattern)) = &path_pattern {
        pattern::compile(path_pattern, &join(path, key))?;
    }
    let (pattern_key, suggested_pattern) = match (declared, &path_pattern) {
        (Some(declared), _) => declared,
        (None, Some((_, path_pattern))) => (
            "suggestedRegex",
            pattern::suggest_pattern(&domain, path_pattern),
        ),
        (None, None) => return Err(ValidationError::missing(join(path, "path"))),
    };
    let matcher = pattern::compile(&suggested_pattern, &join(path, pattern_key))?;

    let test_pages = string_list(
        lookup(obj, &["testPages"]).map(|(_, v)| v),
        &join(path, "testPages"),
    )?;
    pattern::check_test_pages(&name, &matcher, &test_pages)?;

    let author = validate_author(obj.get("author"), &join(path, "author"))?;
    let description = optional_string(obj, path, &["description"])?.unwrap_or_default();

    Ok(RuleInfo {
        name,
        extraction_type,
        domain,
        path_pattern: path_pattern.map(|(_, value)| value),
        suggested_pattern,
        matcher,
        test_pages,
        author,
        description,
    })
}

/// Like `optional_string`, also returning which of `keys` was present.
fn keyed_string(
    obj: &raw::Object,
    path: &str,
    keys: &[&'static str],
) -> Result<Option<(&'static str, String)>, ValidationError> {
    lookup(obj, keys)
        .map(|(key, value)| as_string(value, &join(path, key)).map(|value| (key, value)))
        .transpose()
}

fn validate_type(obj: &raw::Object, path: &str) -> Result<ExtractionType, ValidationError> {
    let kind = require_string(obj, path, &["type", "extractionType"])?;
    let field = join(path, "type");

    match kind.as_str() {
        "article" => Ok(ExtractionType::Article),
        "feed" => Ok(ExtractionType::Feed),
        "custom" => {
            let custom = require_string(obj, path, &["customType"])?;
            if BUILT_IN_TYPES.contains(&custom.as_str()) {
                return Err(ValidationError::InvalidType {
                    field: join(path, "customType"),
                    reason: format!(
                        "must NOT be one of these: {}",
                        BUILT_IN_TYPES.join(", ")
                    ),
                });
            }
            Ok(ExtractionType::Custom(custom))
        }
        other => Err(ValidationError::InvalidType {
            field,
            reason: format!(
                "'{other}' is not one of these: {}",
                BUILT_IN_TYPES.join(", ")
            ),
        }),
    }
}

fn validate_author(raw: Option<&Value>, field: &str) -> Result<Author, ValidationError> {
    match raw {
        None | Some(Value::Null) => Ok(Author::default()),
        Some(Value::String(name)) => Ok(Author {
            name: name.clone(),
            ..Author::default()
        }),
        Some(Value::Object(obj)) => {
            let name = require_string(obj, field, &["name"])?;
            let metadata = obj
                .iter()
                .filter(|(key, _)| key.as_str() != "name")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Ok(Author { name, metadata })
        }
        Some(_) => Err(ValidationError::invalid(
            field,
            "must be a string or an object",
        )),
    }
}

fn validate_redirect(raw: &Value, path: &str) -> Result<RedirectSpec, ValidationError> {
    let obj = as_object(raw, path)?;

    let (params, params_path) = match lookup(obj, &["requiredQueryParams"]) {
        Some((key, value)) => (value, join(path, key)),
        None => {
            let query_path = join(path, "query");
            let query = match lookup(obj, &["query"]) {
                Some((_, value)) => as_object(value, &query_path)?,
                None => return Err(ValidationError::missing(query_path)),
            };
            match lookup(query, &["setParams"]) {
                Some((key, value)) => (value, join(&query_path, key)),
                None => return Err(ValidationError::missing(join(&query_path, "setParams"))),
            }
        }
    };

    let required_query_params = as_object(params, &params_path)?
        .iter()
        .map(|(name, value)| {
            scalar_to_string(value, &join(&params_path, name)).map(|value| (name.clone(), value))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RedirectSpec {
        required_query_params,
    })
}
