//! Element trees: authored input and compiled output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::css::DeclarationMap;

/// The kind of a UI element.
///
/// A closed set of tagged variants for the target platforms, with
/// [`ElementKind::Custom`] as the statically-checked extension point for
/// user-defined element types. Configuration scopes match against
/// [`ElementKind::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    Page,
    Container,
    Section,
    Heading,
    Paragraph,
    Text,
    Button,
    Link,
    Image,
    List,
    Item,
    /// A user-defined element type, matched by its name.
    Custom(String),
}

impl ElementKind {
    /// The scope key this kind matches in hierarchy and styling config.
    pub fn key(&self) -> &str {
        match self {
            ElementKind::Page => "page",
            ElementKind::Container => "container",
            ElementKind::Section => "section",
            ElementKind::Heading => "heading",
            ElementKind::Paragraph => "paragraph",
            ElementKind::Text => "text",
            ElementKind::Button => "button",
            ElementKind::Link => "link",
            ElementKind::Image => "image",
            ElementKind::List => "list",
            ElementKind::Item => "item",
            ElementKind::Custom(name) => name,
        }
    }
}

impl From<String> for ElementKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "page" => ElementKind::Page,
            "container" => ElementKind::Container,
            "section" => ElementKind::Section,
            "heading" => ElementKind::Heading,
            "paragraph" => ElementKind::Paragraph,
            "text" => ElementKind::Text,
            "button" => ElementKind::Button,
            "link" => ElementKind::Link,
            "image" => ElementKind::Image,
            "list" => ElementKind::List,
            "item" => ElementKind::Item,
            _ => ElementKind::Custom(name),
        }
    }
}

impl From<&str> for ElementKind {
    fn from(name: &str) -> Self {
        ElementKind::from(name.to_string())
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        kind.key().to_string()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An element as authored: kind, explicit properties, children.
///
/// # Example
///
/// ```rust
/// use attire::{Element, ElementKind};
///
/// let tree = Element::new(ElementKind::Section)
///     .prop("background", "$colors.surface")
///     .child(
///         Element::new(ElementKind::Button)
///             .prop("variant", "primary")
///             .prop("class", "cta"),
///     );
/// assert_eq!(tree.children.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    /// Creates an element with no properties or children.
    pub fn new(kind: impl Into<ElementKind>) -> Self {
        Self {
            kind: kind.into(),
            props: Map::new(),
            children: Vec::new(),
        }
    }

    /// Sets an explicit property, returning the element for chaining.
    pub fn prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    /// Appends a child, returning the element for chaining.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

/// Position of an element in the tree.
///
/// The root is its kind key; each descendant appends `kind[index]`. The
/// display form joins segments with `/`, e.g. `page/section[0]/button[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct ElementPath {
    segments: Vec<String>,
}

impl ElementPath {
    /// Path of a tree root.
    pub fn root(kind: &ElementKind) -> Self {
        Self {
            segments: vec![kind.key().to_string()],
        }
    }

    /// Path of the `index`-th child of this path.
    pub fn child(&self, kind: &ElementKind, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(format!("{}[{}]", kind.key(), index));
        Self { segments }
    }

    /// Number of segments from the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl From<ElementPath> for String {
    fn from(path: ElementPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// A compiled element: resolved properties plus the computed attribute set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledElement {
    pub kind: ElementKind,
    pub path: ElementPath,
    /// Properties after hierarchy merge and token resolution.
    pub resolved: Map<String, Value>,
    /// Space-joined class attribute, absent when nothing applies.
    pub class: Option<String>,
    /// Serialized style attribute, absent when the merged map is empty.
    pub style: Option<String>,
    /// The merged style declarations backing [`CompiledElement::style`].
    pub declarations: DeclarationMap,
    pub children: Vec<CompiledElement>,
}
