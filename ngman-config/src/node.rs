//! Directive tree nodes
//!
//! A [`DirectiveNode`] is a name, an ordered argument list and an optional
//! block of children. "No block" (`foo bar;`) and "empty block"
//! (`foo bar {}`) are different states: `children` is `None` for the first
//! and `Some(vec![])` for the second.

use crate::context::Context;
use ngman_syntax::COMMENT_DIRECTIVE;
use serde::{Deserialize, Serialize};

/// A single directive and everything nested under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveNode {
    name: String,

    #[serde(default)]
    args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<DirectiveNode>>,

    /// Context the directive was found in; only set for registered kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<Context>,
}

impl DirectiveNode {
    /// A directive with no arguments and no block
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            children: None,
            context: None,
        }
    }

    /// Assemble a node from parsed parts
    pub fn from_parts(
        name: impl Into<String>,
        args: Vec<String>,
        children: Option<Vec<DirectiveNode>>,
    ) -> Self {
        Self {
            name: name.into(),
            args,
            children,
            context: None,
        }
    }

    /// A `#` comment line; the text excludes the leading `#`
    pub fn comment(text: impl Into<String>) -> Self {
        Self::new(COMMENT_DIRECTIVE).with_args([text.into()])
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_block(mut self, children: Vec<DirectiveNode>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn args_mut(&mut self) -> &mut Vec<String> {
        &mut self.args
    }

    pub fn set_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
    }

    pub fn context(&self) -> Option<Context> {
        self.context
    }

    pub fn set_context(&mut self, context: Option<Context>) {
        self.context = context;
    }

    pub fn is_comment(&self) -> bool {
        self.name == COMMENT_DIRECTIVE && self.children.is_none()
    }

    /// Comment text, for comment nodes
    pub fn comment_text(&self) -> Option<&str> {
        self.is_comment().then(|| self.arg(0).unwrap_or_default())
    }

    // ========================================
    // Block
    // ========================================

    /// Whether the directive has a `{ }` block, empty or not
    pub fn has_block(&self) -> bool {
        self.children.is_some()
    }

    /// Children, or `None` when there is no block at all
    pub fn children(&self) -> Option<&[DirectiveNode]> {
        self.children.as_deref()
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<DirectiveNode>> {
        self.children.as_mut()
    }

    /// Replace the block. An empty vector keeps the braces.
    pub fn set_block(&mut self, children: Vec<DirectiveNode>) {
        self.children = Some(children);
    }

    /// Drop the block entirely so the directive ends with `;`
    pub fn clear_block(&mut self) -> Option<Vec<DirectiveNode>> {
        self.children.take()
    }

    /// Children, opening an empty block first if there is none
    pub fn block_mut(&mut self) -> &mut Vec<DirectiveNode> {
        self.children.get_or_insert_with(Vec::new)
    }

    /// Append a child, opening a block if needed
    pub fn push_child(&mut self, child: DirectiveNode) {
        self.block_mut().push(child);
    }

    /// First child with the given name
    pub fn find(&self, name: &str) -> Option<&DirectiveNode> {
        self.children().and_then(|c| c.iter().find(|n| n.name == name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut DirectiveNode> {
        self.children
            .as_mut()
            .and_then(|c| c.iter_mut().find(|n| n.name == name))
    }

    /// Every child with the given name, in order
    pub fn find_all<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a DirectiveNode> + use<'a, 'n> {
        self.children()
            .unwrap_or_default()
            .iter()
            .filter(move |n| n.name == name)
    }

    /// Remove every child with the given name. The block itself stays,
    /// even if it ends up empty.
    pub fn remove_children(&mut self, name: &str) -> usize {
        let Some(children) = self.children.as_mut() else {
            return 0;
        };
        let before = children.len();
        children.retain(|n| n.name != name);
        before - children.len()
    }
}
