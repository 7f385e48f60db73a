//! Query document model.
//!
//! [`QueryDocument`] is the immutable view of a FetchXML query the column
//! builder works from: the root entity, its attributes in document order,
//! the joined entities and the sort order.

use horizon_gridview_core::logging::targets;

use crate::error::{GridError, Result};
use crate::xml::{XmlDocument, XmlElement, parse_xml};

/// An attribute selected by the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRef {
    /// Logical name of the attribute on its own entity.
    pub name: String,
    /// Alias of the link the attribute belongs to, `None` for root attributes.
    pub link_alias: Option<String>,
}

impl AttributeRef {
    /// A root-entity attribute.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link_alias: None,
        }
    }

    /// An attribute of the link aliased `alias`.
    pub fn linked(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link_alias: Some(alias.into()),
        }
    }

    /// Whether the attribute comes from a joined entity.
    pub fn is_linked(&self) -> bool {
        self.link_alias.is_some()
    }

    /// The qualified key: `alias.name` for linked attributes, else `name`.
    pub fn field_key(&self) -> String {
        match &self.link_alias {
            Some(alias) => format!("{alias}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A joined entity (`link-entity`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    /// The alias linked attributes are qualified with.
    pub alias: Option<String>,
    /// Logical name of the joined entity.
    pub target_entity_name: String,
    /// Join field on the joined entity.
    pub from_field: String,
    /// Join field on the root entity.
    pub to_field: String,
    /// Attribute names selected from the joined entity.
    pub attribute_names: Vec<String>,
}

/// Sort order of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    /// Attribute the rows are ordered by.
    pub attribute_name: String,
    /// Whether the order is descending.
    pub descending: bool,
}

/// A parsed query document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDocument {
    /// Logical name of the root entity. Never empty.
    pub entity_name: String,
    /// Selected attributes in document order, linked ones included.
    pub attributes: Vec<AttributeRef>,
    /// Joined entities in document order.
    pub links: Vec<LinkRef>,
    /// The first `order` of the root entity.
    pub sort: Option<SortOrder>,
}

impl QueryDocument {
    /// Parses query document text.
    ///
    /// ```
    /// use horizon_gridview::QueryDocument;
    ///
    /// let doc = QueryDocument::parse(
    ///     r#"<fetch><entity name="account">
    ///          <attribute name="name"/>
    ///          <link-entity name="contact" alias="pc" from="contactid" to="primarycontactid">
    ///            <attribute name="fullname"/>
    ///          </link-entity>
    ///        </entity></fetch>"#,
    /// )?;
    /// let keys: Vec<String> = doc.attributes.iter().map(|a| a.field_key()).collect();
    /// assert_eq!(keys, ["name", "pc.fullname"]);
    /// # Ok::<(), horizon_gridview::GridError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let xml = parse_xml(text)?;
        Self::from_xml(&xml)
    }

    /// Builds the model from an already parsed tree.
    pub fn from_xml(xml: &XmlDocument) -> Result<Self> {
        let entity = entity_element(xml)?;
        let entity_name = entity
            .attribute("name")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| GridError::malformed_document("entity has no name"))?
            .to_string();

        let mut attributes = Vec::new();
        let mut links = Vec::new();
        let mut sort = None;

        for child in entity.child_elements() {
            match child.name() {
                "attribute" => {
                    if let Some(name) = child.attribute("name").filter(|n| !n.is_empty()) {
                        attributes.push(AttributeRef::root(name));
                    }
                }
                "link-entity" => {
                    let Some(link) = link_from(child) else {
                        tracing::debug!(target: targets::FETCH, "skipping link-entity without a name");
                        continue;
                    };
                    if let Some(alias) = &link.alias {
                        attributes.extend(
                            link.attribute_names
                                .iter()
                                .map(|name| AttributeRef::linked(alias.clone(), name.clone())),
                        );
                    }
                    links.push(link);
                }
                "order" if sort.is_none() => {
                    if let Some(attribute_name) = child.attribute("attribute") {
                        sort = Some(SortOrder {
                            attribute_name: attribute_name.to_string(),
                            descending: child.attribute("descending") == Some("true"),
                        });
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(
            target: targets::FETCH,
            entity = %entity_name,
            attributes = attributes.len(),
            links = links.len(),
            "parsed query document"
        );

        Ok(Self {
            entity_name,
            attributes,
            links,
            sort,
        })
    }

    /// Distinct entity names: the root first, then joined entities in order.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names = vec![self.entity_name.clone()];
        for link in &self.links {
            if !names.contains(&link.target_entity_name) {
                names.push(link.target_entity_name.clone());
            }
        }
        names
    }

    /// Distinct short attribute names plus each link's `to` field.
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let link_fields = self.links.iter().map(|link| &link.to_field).filter(|f| !f.is_empty());
        for name in self.attributes.iter().map(|a| &a.name).chain(link_fields) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// The link aliased `alias`.
    pub fn link(&self, alias: &str) -> Option<&LinkRef> {
        self.links.iter().find(|link| link.alias.as_deref() == Some(alias))
    }

    /// A copy with the attributes replaced.
    pub fn with_attributes(&self, attributes: Vec<AttributeRef>) -> Self {
        Self {
            attributes,
            ..self.clone()
        }
    }
}

/// The root's `entity` child.
pub(crate) fn entity_element(xml: &XmlDocument) -> Result<&XmlElement> {
    xml.root()
        .child("entity")
        .ok_or_else(|| GridError::malformed_document("document has no entity element"))
}

fn link_from(element: &XmlElement) -> Option<LinkRef> {
    let target_entity_name = element.attribute("name").filter(|n| !n.is_empty())?;
    Some(LinkRef {
        alias: element
            .attribute("alias")
            .filter(|a| !a.is_empty())
            .map(str::to_string),
        target_entity_name: target_entity_name.to_string(),
        from_field: element.attribute("from").unwrap_or_default().to_string(),
        to_field: element.attribute("to").unwrap_or_default().to_string(),
        attribute_names: element
            .children_named("attribute")
            .filter_map(|attr| attr.attribute("name"))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
