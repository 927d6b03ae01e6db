use std::cell::RefCell;

use kuchikiki::traits::*;
use kuchikiki::{Attribute, ElementData, ExpandedName, NodeData, NodeRef, Selectors};

use crate::dom::SelectorAdapter;
use crate::evaluator::errors::ExtractionError;

pub fn parse_document(html: &str) -> NodeRef {
    kuchikiki::parse_html().one(html)
}

/// Selector adapter over an html5ever tree with CSS selector matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlAdapter;

fn compile(selector: &str) -> Result<Selectors, ExtractionError> {
    Selectors::compile(selector).map_err(|()| ExtractionError::InvalidSelector {
        selector: selector.to_string(),
    })
}

/// Template contents live outside the child list and are copied separately.
fn deep_copy(node: &NodeRef) -> NodeRef {
    let data = match node.data() {
        NodeData::Element(element) => NodeData::Element(ElementData {
            name: element.name.clone(),
            attributes: RefCell::new(element.attributes.borrow().clone()),
            template_contents: element.template_contents.as_ref().map(deep_copy),
        }),
        other => other.clone(),
    };
    let copy = NodeRef::new(data);
    for child in node.children() {
        copy.append(deep_copy(&child));
    }
    copy
}

/// A `div` in the namespace of `template`, or a bare fragment without one.
fn synthetic_container(template: Option<&ElementData>) -> NodeRef {
    match template {
        Some(element) => {
            let mut name = element.name.clone();
            name.prefix = None;
            name.local = "div".into();
            NodeRef::new_element(name, std::iter::empty::<(ExpandedName, Attribute)>())
        }
        None => NodeRef::new(NodeData::DocumentFragment),
    }
}

impl SelectorAdapter for HtmlAdapter {
    type Node = NodeRef;

    fn select(&self, context: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, ExtractionError> {
        let selectors = compile(selector)?;
        Ok(context
            .descendants()
            .elements()
            .filter(|element| selectors.matches(element))
            .map(|element| element.as_node().clone())
            .collect())
    }

    fn matches(&self, node: &NodeRef, selector: &str) -> Result<bool, ExtractionError> {
        let selectors = compile(selector)?;
        Ok(node
            .clone()
            .into_element_ref()
            .is_some_and(|element| selectors.matches(&element)))
    }

    fn attribute(&self, node: &NodeRef, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        node.as_element().and_then(|element| {
            element
                .attributes
                .borrow()
                .get(name.as_str())
                .map(str::to_string)
        })
    }

    fn inner_markup(&self, node: &NodeRef) -> String {
        node.children().map(|child| child.to_string()).collect()
    }

    fn outer_markup(&self, node: &NodeRef) -> String {
        match node.data() {
            NodeData::Document(_) | NodeData::DocumentFragment => self.inner_markup(node),
            _ => node.to_string(),
        }
    }

    fn text_content(&self, node: &NodeRef) -> String {
        node.text_contents()
    }

    fn siblings_until(&self, node: &NodeRef, stop: &str) -> Result<Vec<NodeRef>, ExtractionError> {
        let stop = compile(stop)?;
        Ok(node
            .following_siblings()
            .elements()
            .take_while(|element| !stop.matches(element))
            .map(|element| element.as_node().clone())
            .collect())
    }

    fn detached_copy(&self, node: &NodeRef) -> NodeRef {
        deep_copy(node)
    }

    fn wrap_copies(&self, nodes: &[NodeRef]) -> NodeRef {
        let container = synthetic_container(nodes.iter().find_map(|node| node.as_element()));
        for node in nodes {
            container.append(deep_copy(node));
        }
        container
    }

    fn remove_matching(&self, node: &NodeRef, selector: &str) -> Result<(), ExtractionError> {
        for found in self.select(node, selector)? {
            found.detach();
        }
        Ok(())
    }

    fn unwrap_descendants_except(&self, node: &NodeRef, allowed: &[&'static str]) {
        // Hoisted template contents may hold further disallowed elements.
        loop {
            let disallowed: Vec<NodeRef> = node
                .descendants()
                .filter(|descendant| {
                    descendant.as_element().is_some_and(|element| {
                        !allowed.iter().any(|tag| *tag == &*element.name.local)
                    })
                })
                .collect();
            if disallowed.is_empty() {
                break;
            }

            for element in disallowed {
                let mut children: Vec<NodeRef> = element
                    .as_element()
                    .and_then(|data| data.template_contents.as_ref())
                    .map(|contents| contents.children().collect())
                    .unwrap_or_default();
                children.extend(element.children());
                for child in children {
                    element.insert_before(child);
                }
                element.detach();
            }
        }
    }

    fn remove_attributes(&self, node: &NodeRef, names: &[&'static str]) {
        for element in node.inclusive_descendants().elements() {
            element
                .attributes
                .borrow_mut()
                .map
                .retain(|name, _| !names.iter().any(|removed| *removed == &*name.local));
        }
    }

    fn markup_to_text(&self, markup: &str) -> String {
        // Parsing inside <body> keeps leading whitespace and body-only elements.
        kuchikiki::parse_html()
            .one(format!("<body>{markup}"))
            .text_contents()
    }
}
