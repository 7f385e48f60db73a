//! Filter condition injection.

use horizon_gridview_core::logging::targets;

use crate::xml::{XmlDocument, XmlElement, XmlNode, parse_xml};

/// Appends the condition of each fragment to the entity's `and` filter.
///
/// The target is the entity's first direct `<filter type="and">`. When none
/// exists one is created and placed before the entity's first `filter`
/// child, or at the end when there is none. Each fragment contributes its
/// first `condition` element, in input order; fragments that do not parse
/// or hold no condition are skipped. Duplicates are kept.
///
/// An empty `fragments` slice returns the document unchanged, as does a
/// document without an `entity` element.
///
/// ```
/// use horizon_gridview::{filter::inject_conditions, xml::parse_xml};
///
/// let doc = parse_xml(r#"<fetch><entity name="account"/></fetch>"#)?;
/// let out = inject_conditions(
///     &doc,
///     &[r#"<condition attribute="statecode" operator="eq" value="0"/>"#.to_string()],
/// );
/// assert_eq!(
///     out.to_xml_string(),
///     r#"<fetch><entity name="account"><filter type="and"><condition attribute="statecode" operator="eq" value="0"/></filter></entity></fetch>"#
/// );
/// # Ok::<(), horizon_gridview::xml::XmlError>(())
/// ```
pub fn inject_conditions(document: &XmlDocument, fragments: &[String]) -> XmlDocument {
    let mut output = document.clone();
    if fragments.is_empty() {
        return output;
    }

    let conditions: Vec<XmlElement> = fragments.iter().filter_map(|f| condition_of(f)).collect();

    let Some(entity) = output.root_mut().child_mut("entity") else {
        tracing::debug!(target: targets::FETCH, "no entity element, filter conditions not injected");
        return output;
    };

    let Some(filter) = and_filter(entity) else {
        return output;
    };
    let injected = conditions.len();
    for condition in conditions {
        filter.add_child(condition);
    }

    tracing::debug!(target: targets::FETCH, injected, "injected filter conditions");
    output
}

fn condition_of(fragment: &str) -> Option<XmlElement> {
    match parse_xml(fragment) {
        Ok(parsed) => {
            let condition = parsed.root().find("condition").cloned();
            if condition.is_none() {
                tracing::debug!(target: targets::FETCH, fragment, "fragment has no condition, skipped");
            }
            condition
        }
        Err(err) => {
            tracing::debug!(target: targets::FETCH, fragment, error = %err, "malformed filter fragment skipped");
            None
        }
    }
}

fn is_and_filter(node: &XmlNode) -> bool {
    node.as_element()
        .is_some_and(|el| el.name() == "filter" && el.attribute("type") == Some("and"))
}

fn is_filter(node: &XmlNode) -> bool {
    node.as_element().is_some_and(|el| el.name() == "filter")
}

/// The entity's `and` filter, created if missing.
fn and_filter(entity: &mut XmlElement) -> Option<&mut XmlElement> {
    let children = entity.children_mut();
    let index = match children.iter().position(is_and_filter) {
        Some(index) => index,
        None => {
            let at = children.iter().position(is_filter).unwrap_or(children.len());
            children.insert(at, XmlElement::new("filter").with_attribute("type", "and").into());
            at
        }
    };

    children.get_mut(index).and_then(XmlNode::as_element_mut)
}
