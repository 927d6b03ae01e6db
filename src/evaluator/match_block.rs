use tracing::trace;

use crate::dom::SelectorAdapter;
use crate::evaluator::errors::ExtractionError;
use crate::schema::MatchBlock;

/// Attributes stripped from kept markup, on the node and all its descendants.
pub const STYLING_ATTRIBUTES: [&str; 9] = [
    "align", "bgcolor", "border", "class", "color", "dir", "height", "style", "width",
];

/// Presentational and structural tags kept in extracted markup. Any other
/// descendant element is replaced by its children.
pub const BASIC_TAGS: [&str; 58] = [
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "blockquote", "br", "i", "em", "b", "strong", "ul",
    "ol", "li", "dl", "dt", "dd", "hr", "code", "del", "pre", "s", "u", "small", "sub", "sup",
    "img", "audio", "video", "source", "a", "table", "th", "tr", "td", "thead", "tbody", "tfoot",
    "div", "span", "iframe", "article", "details", "figcaption", "figure", "footer", "header",
    "main", "mark", "section", "summary", "time", "wbr", "font", "center", "cite",
];

/// Result of one match block: the matched nodes when the rule has sub-rules,
/// leaf values otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutput<N> {
    Nodes(Vec<N>),
    Values(Vec<String>),
}

impl<N> MatchOutput<N> {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Nodes(nodes) => nodes.is_empty(),
            Self::Values(values) => values.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Nodes(nodes) => nodes.len(),
            Self::Values(values) => values.len(),
        }
    }
}

pub fn evaluate_match_block<A: SelectorAdapter>(
    adapter: &A,
    context: &A::Node,
    block: &MatchBlock,
    has_sub_rules: bool,
) -> Result<MatchOutput<A::Node>, ExtractionError> {
    // 1. Matching descendants
    let mut nodes = adapter.select(context, &block.include)?;

    // 2. Exclusions
    if !block.exclude.is_empty() {
        let mut kept = Vec::with_capacity(nodes.len());
        for node in nodes {
            if !adapter.matches(&node, &block.exclude)? {
                kept.push(node);
            }
        }
        nodes = kept;
    }

    // Nodes below this point may be mutated only once they are private copies.
    let mut private = false;

    // 3. Group each match with its following siblings
    if let Some(stop) = &block.add_next_until {
        let mut groups = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let mut group = vec![node.clone()];
            group.extend(adapter.siblings_until(node, stop)?);
            groups.push(adapter.wrap_copies(&group));
        }
        nodes = groups;
        private = true;
    }

    // 4. Strip unwanted descendants
    if !block.remove_inside.is_empty() {
        if !private {
            nodes = nodes.iter().map(|node| adapter.detached_copy(node)).collect();
            private = true;
        }
        for node in &nodes {
            for selector in &block.remove_inside {
                adapter.remove_matching(node, selector)?;
            }
        }
    }

    // 5. Sub-rules work on the nodes themselves
    if has_sub_rules {
        trace!(include = %block.include, matched = nodes.len(), "matched context nodes");
        return Ok(MatchOutput::Nodes(nodes));
    }

    // 6-7. Leaf values
    let values = nodes
        .iter()
        .filter_map(|node| extract_value(adapter, node, block, private))
        .collect::<Vec<_>>();
    trace!(include = %block.include, matched = values.len(), "extracted values");

    Ok(MatchOutput::Values(values))
}

fn extract_value<A: SelectorAdapter>(
    adapter: &A,
    node: &A::Node,
    block: &MatchBlock,
    private: bool,
) -> Option<String> {
    if let Some(attribute) = &block.attribute {
        return adapter.attribute(node, attribute);
    }

    let copy;
    let node = if private {
        node
    } else {
        copy = adapter.detached_copy(node);
        &copy
    };
    adapter.unwrap_descendants_except(node, &BASIC_TAGS);

    if block.keep_basic_markup {
        adapter.remove_attributes(node, &STYLING_ATTRIBUTES);
        if block.outer_node {
            Some(adapter.outer_markup(node))
        } else {
            Some(adapter.inner_markup(node))
        }
    } else {
        Some(adapter.text_content(node))
    }
}
