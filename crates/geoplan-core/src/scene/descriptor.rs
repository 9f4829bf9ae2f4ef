//! Plain data form of a node subtree, exchanged with persistence.

use serde::{Deserialize, Serialize};

/// One `name="value"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub value: String,
}

/// Serializable node subtree: `{tagName, attributes, children, textContent}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub tag_name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDescriptor>,
    #[serde(default)]
    pub children: Vec<NodeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
}

impl NodeDescriptor {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text_content: None,
        }
    }

    /// Builder-style attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(AttributeDescriptor {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn child(mut self, child: NodeDescriptor) -> Self {
        self.children.push(child);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_field_names() {
        let descriptor = NodeDescriptor::new("text").attr("id", "7").text("hello");
        let json = descriptor.to_json().unwrap();
        assert!(json.contains("\"tagName\":\"text\""));
        assert!(json.contains("\"textContent\":\"hello\""));
        assert_eq!(NodeDescriptor::from_json(&json).unwrap(), descriptor);
    }

    #[test]
    fn test_missing_lists_default() {
        let descriptor = NodeDescriptor::from_json(r#"{"tagName":"g"}"#).unwrap();
        assert!(descriptor.attributes.is_empty());
        assert!(descriptor.children.is_empty());
        assert_eq!(descriptor.text_content, None);
    }
}
