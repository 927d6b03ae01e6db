use tracing::debug;
use url::Url;

use crate::schema::{RedirectSpec, RuleDocument};

/// Returns `url` with every required query parameter forced to its value, or
/// `None` when all of them already carry it.
///
/// Forcing a parameter replaces its first occurrence and drops any later
/// duplicates; a missing parameter is appended. The whole query is then
/// re-serialized as `application/x-www-form-urlencoded`, so other parameters
/// keep their order and values but may change encoding (`%20` becomes `+`).
/// Path and fragment are kept.
pub fn resolve_redirect(url: &Url, spec: &RedirectSpec) -> Option<Url> {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let mut changed = false;

    for (name, required) in &spec.required_query_params {
        match pairs.iter().position(|(key, _)| key == name) {
            Some(first) if pairs[first].1 == *required => continue,
            Some(first) => {
                pairs[first].1 = required.clone();
                let mut index = 0;
                pairs.retain(|(key, _)| {
                    index += 1;
                    index - 1 == first || key != name
                });
            }
            None => pairs.push((name.clone(), required.clone())),
        }
        changed = true;
    }

    if !changed {
        return None;
    }

    let mut target = url.clone();
    target.query_pairs_mut().clear().extend_pairs(&pairs);
    debug!(from = %url, to = %target, "query parameters need forcing");
    Some(target)
}

impl RuleDocument {
    /// Redirect target for `url`, if this document declares required query
    /// parameters that the URL does not carry.
    pub fn redirect_url(&self, url: &str) -> Result<Option<Url>, url::ParseError> {
        let Some(spec) = self.redirect() else {
            return Ok(None);
        };
        let url = Url::parse(url)?;
        Ok(resolve_redirect(&url, spec))
    }
}
