//! Tag helper metadata consulted by the full parser.
//!
//! Descriptors come from an external resolver. The grammar only needs to
//! know which tag names are claimed by a tag helper: an element with such a
//! name becomes a `TagHelper` block instead of plain markup.

use serde::{Deserialize, Serialize};

/// Tag name that matches every element.
pub const CATCH_ALL_TAG: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHelperDescriptor {
    /// Element name the helper targets, or `*` for every element.
    pub tag_name: String,
    /// Fully qualified type implementing the helper.
    pub type_name: String,
    #[serde(default)]
    pub assembly_name: String,
    #[serde(default)]
    pub attributes: Vec<TagHelperAttributeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHelperAttributeDescriptor {
    /// HTML attribute name.
    pub name: String,
    /// Property the attribute binds to.
    pub property_name: String,
    /// Type of the bound property, e.g. `System.String`.
    pub type_name: String,
}

impl TagHelperDescriptor {
    pub fn new(tag_name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            type_name: type_name.into(),
            assembly_name: String::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_assembly(mut self, assembly_name: impl Into<String>) -> Self {
        self.assembly_name = assembly_name.into();
        self
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        property_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.attributes.push(TagHelperAttributeDescriptor {
            name: name.into(),
            property_name: property_name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// HTML tag names are matched case-insensitively.
    pub fn matches_tag(&self, tag_name: &str) -> bool {
        self.tag_name == CATCH_ALL_TAG || self.tag_name.eq_ignore_ascii_case(tag_name)
    }
}

/// Whether any descriptor claims `tag_name`.
pub fn is_tag_helper(descriptors: &[TagHelperDescriptor], tag_name: &str) -> bool {
    !tag_name.is_empty() && descriptors.iter().any(|d| d.matches_tag(tag_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ignores_ascii_case() {
        let descriptor = TagHelperDescriptor::new("PTagHelper", "PTagHelper");
        assert!(descriptor.matches_tag("ptaghelper"));
        assert!(!descriptor.matches_tag("div"));
    }

    #[test]
    fn catch_all_matches_everything() {
        let descriptors = [TagHelperDescriptor::new(CATCH_ALL_TAG, "Everything")];
        assert!(is_tag_helper(&descriptors, "p"));
        assert!(is_tag_helper(&descriptors, "my-element"));
        assert!(!is_tag_helper(&descriptors, ""));
    }

    #[test]
    fn builder_collects_attributes() {
        let descriptor = TagHelperDescriptor::new("p", "PTagHelper")
            .with_assembly("TestAssembly")
            .with_attribute("obj-attr", "ObjectAttribute", "System.Object")
            .with_attribute("str-attr", "StringAttribute", "System.String");
        assert_eq!(descriptor.assembly_name, "TestAssembly");
        assert_eq!(descriptor.attributes.len(), 2);
        assert_eq!(descriptor.attributes[1].property_name, "StringAttribute");
    }
}
