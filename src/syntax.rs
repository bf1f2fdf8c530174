//! Syntax tree consumed from the host parser
//!
//! The host exports one [`SyntaxBundle`] per analyzed file: the file's
//! name-resolution context plus the declared classes with their attributes,
//! methods and call expressions. Nodes are immutable once loaded; rules
//! receive borrowed [`SyntaxNode`] views during a single traversal.

use crate::names::NameContext;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error loading a syntax bundle
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid syntax bundle {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Node kind tag used for rule routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    ClassDeclaration,
    MethodDeclaration,
    MethodCall,
    AttributeUse,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::ClassDeclaration => write!(f, "class"),
            NodeKind::MethodDeclaration => write!(f, "method"),
            NodeKind::MethodCall => write!(f, "call"),
            NodeKind::AttributeUse => write!(f, "attribute"),
        }
    }
}

/// Literal or expression value of an argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    /// `'text'`
    String(String),
    /// `Foo::class`, name as written
    ClassReference(String),
    Bool(bool),
    Int(i64),
    /// `[key => value, ...]`
    Array(Vec<ArrayItem>),
    /// `$name` (without the sigil)
    Variable(String),
    /// Anything the host could not express statically
    Other,
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ArrayItem]> {
        match self {
            ArgValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is the `$this` variable
    pub fn is_this(&self) -> bool {
        matches!(self, ArgValue::Variable(name) if name == "this")
    }
}

/// One entry of an array literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayItem {
    #[serde(default)]
    pub key: Option<ArgValue>,
    pub value: ArgValue,
}

impl ArrayItem {
    /// Item with a string-literal key equal to `key`
    pub fn has_string_key(&self, key: &str) -> bool {
        self.key.as_ref().and_then(ArgValue::as_str) == Some(key)
    }
}

/// Find an item of an array literal by string key
pub fn find_by_key<'a>(items: &'a [ArrayItem], key: &str) -> Option<&'a ArrayItem> {
    items.iter().find(|item| item.has_string_key(key))
}

/// A call or attribute argument, positional or named
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(default)]
    pub name: Option<String>,
    pub value: ArgValue,
}

impl Argument {
    pub fn positional(value: ArgValue) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: &str, value: ArgValue) -> Self {
        Self {
            name: Some(name.to_string()),
            value,
        }
    }
}

/// An attribute attached to a class or method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeUsage {
    /// Name as written (possibly unqualified or aliased)
    pub name: String,

    /// Arguments in source order
    #[serde(default)]
    pub args: Vec<Argument>,

    #[serde(default)]
    pub line: usize,
}

impl AttributeUsage {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            args: Vec::new(),
            line,
        }
    }

    pub fn with_arg(mut self, arg: Argument) -> Self {
        self.args.push(arg);
        self
    }

    /// First argument without a name
    pub fn first_positional(&self) -> Option<&ArgValue> {
        self.args
            .iter()
            .find(|arg| arg.name.is_none())
            .map(|arg| &arg.value)
    }

    /// Whether a named argument is present (in any position)
    pub fn has_named(&self, name: &str) -> bool {
        self.args.iter().any(|arg| arg.name.as_deref() == Some(name))
    }
}

/// `receiver->method(args)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub receiver: ArgValue,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Argument>,
    #[serde(default)]
    pub line: usize,
}

/// A method declared in a class body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    pub name: String,

    #[serde(default)]
    pub line: usize,

    #[serde(default)]
    pub attributes: Vec<AttributeUsage>,

    /// Declared return type token, as written
    #[serde(default)]
    pub return_type: Option<String>,

    #[serde(default)]
    pub is_abstract: bool,

    /// Call expressions in the body, in source order
    #[serde(default)]
    pub calls: Vec<MethodCall>,
}

impl MethodDeclaration {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            line,
            attributes: Vec::new(),
            return_type: None,
            is_abstract: false,
            calls: Vec::new(),
        }
    }
}

/// A class declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    /// Short name; `None` for anonymous classes
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub line: usize,

    #[serde(default)]
    pub is_abstract: bool,

    /// Parent class token, as written
    #[serde(default)]
    pub extends: Option<String>,

    #[serde(default)]
    pub attributes: Vec<AttributeUsage>,

    /// Raw structured comment (`/** ... */`) attached to the class
    #[serde(default)]
    pub doc_comment: Option<String>,

    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
}

impl ClassDeclaration {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: Some(name.to_string()),
            line,
            is_abstract: false,
            extends: None,
            attributes: Vec::new(),
            doc_comment: None,
            methods: Vec::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodDeclaration> {
        self.methods.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

/// Borrowed view of one node during traversal
#[derive(Debug, Clone, Copy)]
pub enum SyntaxNode<'a> {
    Class(&'a ClassDeclaration),
    Method(&'a MethodDeclaration),
    Call(&'a MethodCall),
    Attribute(&'a AttributeUsage),
}

impl<'a> SyntaxNode<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            SyntaxNode::Class(_) => NodeKind::ClassDeclaration,
            SyntaxNode::Method(_) => NodeKind::MethodDeclaration,
            SyntaxNode::Call(_) => NodeKind::MethodCall,
            SyntaxNode::Attribute(_) => NodeKind::AttributeUse,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            SyntaxNode::Class(c) => c.line,
            SyntaxNode::Method(m) => m.line,
            SyntaxNode::Call(c) => c.line,
            SyntaxNode::Attribute(a) => a.line,
        }
    }

    pub fn as_class(&self) -> Option<&'a ClassDeclaration> {
        match self {
            SyntaxNode::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&'a MethodDeclaration> {
        match self {
            SyntaxNode::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&'a MethodCall> {
        match self {
            SyntaxNode::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&'a AttributeUsage> {
        match self {
            SyntaxNode::Attribute(a) => Some(a),
            _ => None,
        }
    }
}

/// Read-only parent linkage of a node
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeContext<'a> {
    /// Enclosing class (the class itself for class nodes)
    pub class: Option<&'a ClassDeclaration>,
    /// Enclosing method (the method itself for method nodes)
    pub method: Option<&'a MethodDeclaration>,
}

/// One file's exported syntax
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyntaxBundle {
    /// Path of the analyzed source file
    #[serde(default)]
    pub file: PathBuf,

    #[serde(flatten)]
    pub names: NameContext,

    #[serde(default)]
    pub classes: Vec<ClassDeclaration>,
}

impl SyntaxBundle {
    pub fn new(file: impl Into<PathBuf>, names: NameContext) -> Self {
        Self {
            file: file.into(),
            names,
            classes: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: ClassDeclaration) -> Self {
        self.classes.push(class);
        self
    }

    /// Load a bundle exported as JSON
    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let content = std::fs::read_to_string(path)?;
        let mut bundle: Self =
            serde_json::from_str(&content).map_err(|source| BundleError::Json {
                file: path.display().to_string(),
                source,
            })?;

        if bundle.file.as_os_str().is_empty() {
            bundle.file = path.to_path_buf();
        }
        Ok(bundle)
    }

    /// All nodes in visitation order with their parent linkage.
    ///
    /// Order: class, its attributes, then per method: the method, its
    /// attributes, its calls.
    pub fn nodes(&self) -> Vec<(SyntaxNode<'_>, NodeContext<'_>)> {
        let mut nodes = Vec::new();

        for class in &self.classes {
            let class_ctx = NodeContext {
                class: Some(class),
                method: None,
            };
            nodes.push((SyntaxNode::Class(class), class_ctx));
            for attribute in &class.attributes {
                nodes.push((SyntaxNode::Attribute(attribute), class_ctx));
            }

            for method in &class.methods {
                let method_ctx = NodeContext {
                    class: Some(class),
                    method: Some(method),
                };
                nodes.push((SyntaxNode::Method(method), method_ctx));
                for attribute in &method.attributes {
                    nodes.push((SyntaxNode::Attribute(attribute), method_ctx));
                }
                for call in &method.calls {
                    nodes.push((SyntaxNode::Call(call), method_ctx));
                }
            }
        }

        nodes
    }
}
