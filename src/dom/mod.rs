pub mod html;

pub use html::{HtmlAdapter, parse_document};

use crate::evaluator::errors::ExtractionError;

/// Capabilities the evaluators need from a document tree and its selector engine.
///
/// Read operations never modify the tree. The mutating operations
/// (`remove_matching`, `unwrap_descendants_except`, `remove_attributes`) are only
/// ever applied to nodes obtained from `detached_copy` or `wrap_copies`.
#[cfg_attr(test, mockall::automock(type Node = u32;))]
pub trait SelectorAdapter {
    type Node: Clone;

    /// Descendants of `context` matching `selector`, in document order.
    fn select(&self, context: &Self::Node, selector: &str)
    -> Result<Vec<Self::Node>, ExtractionError>;

    fn matches(&self, node: &Self::Node, selector: &str) -> Result<bool, ExtractionError>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn inner_markup(&self, node: &Self::Node) -> String;

    fn outer_markup(&self, node: &Self::Node) -> String;

    fn text_content(&self, node: &Self::Node) -> String;

    /// Following element siblings of `node`, stopping before the first one that
    /// matches `stop`.
    fn siblings_until(&self, node: &Self::Node, stop: &str)
    -> Result<Vec<Self::Node>, ExtractionError>;

    /// Deep copy of `node` that shares nothing with the source tree.
    fn detached_copy(&self, node: &Self::Node) -> Self::Node;

    /// Synthetic container holding deep copies of `nodes`, in order.
    fn wrap_copies(&self, nodes: &[Self::Node]) -> Self::Node;

    /// Removes every descendant of `node` matching `selector`.
    fn remove_matching(&self, node: &Self::Node, selector: &str) -> Result<(), ExtractionError>;

    /// Replaces every descendant element whose tag is not in `allowed` with its
    /// own children.
    fn unwrap_descendants_except(&self, node: &Self::Node, allowed: &[&'static str]);

    /// Removes the named attributes from `node` and all its descendants.
    fn remove_attributes(&self, node: &Self::Node, names: &[&'static str]);

    /// Plain text of a markup fragment.
    fn markup_to_text(&self, markup: &str) -> String;
}
