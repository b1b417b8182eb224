use crate::interpreter::Interpreter;
use anyhow::{Result, bail};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared handle to a node in the command tree.
pub type NodeRef = Rc<RefCell<CommandNode>>;

/// Handler invoked with the tokens left over after resolution.
///
/// Handlers receive the interpreter itself so they can print through its
/// console, mutate the tree (alias redefinition), or re-enter dispatch
/// (alias replay).
pub type Handler = Rc<dyn Fn(&mut Interpreter, &[String]) -> Result<()>>;

/// Wrap a plain function as a [`Handler`].
pub(crate) fn handler(f: fn(&mut Interpreter, &[String]) -> Result<()>) -> Handler {
    Rc::new(f)
}

/// One addressable point in the command namespace.
///
/// A node with a handler is invokable; a node without one is a pure
/// namespace grouping its children. Children are owned by the parent's
/// list in declaration order; the parent link is weak and only used to
/// compute fully-qualified display names.
pub struct CommandNode {
    name: String,
    arg_desc: Option<String>,
    help: Option<String>,
    handler: Option<Handler>,
    children: Vec<NodeRef>,
    parent: Weak<RefCell<CommandNode>>,
}

impl std::fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("arg_desc", &self.arg_desc)
            .field("help", &self.help)
            .field("has_handler", &self.handler.is_some())
            .field("children", &self.children)
            .finish()
    }
}

impl CommandNode {
    /// Create the root of a command tree. The root has an empty name and
    /// is never invoked itself.
    pub fn root() -> NodeRef {
        Rc::new(RefCell::new(CommandNode {
            name: String::new(),
            arg_desc: None,
            help: None,
            handler: None,
            children: Vec::new(),
            parent: Weak::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clone the handler out of the node, so the tree borrow can end
    /// before the handler runs.
    pub fn handler(&self) -> Option<Handler> {
        self.handler.clone()
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<NodeRef> {
        self.children
            .iter()
            .find(|c| c.borrow().name == name)
            .cloned()
    }
}

/// Register a new command under `parent`.
///
/// A duplicate name under one parent is a configuration error: it can
/// only come from a broken registration table, so startup must not
/// proceed past it.
pub fn add_command(
    parent: &NodeRef,
    name: &str,
    arg_desc: Option<&str>,
    help: Option<&str>,
    handler: Option<Handler>,
) -> Result<NodeRef> {
    if parent.borrow().child(name).is_some() {
        let path = full_name(parent);
        if path.is_empty() {
            bail!("command \"{name}\" registered twice at the root");
        }
        bail!("command \"{name}\" registered twice under \"{path}\"");
    }
    let node = Rc::new(RefCell::new(CommandNode {
        name: name.to_string(),
        arg_desc: arg_desc.map(str::to_string),
        help: help.map(str::to_string),
        handler,
        children: Vec::new(),
        parent: Rc::downgrade(parent),
    }));
    parent.borrow_mut().children.push(node.clone());
    Ok(node)
}

/// Detach the named child from `parent`, if present.
///
/// Returns whether anything was removed. Used to support alias
/// redefinition, which replaces the node wholesale.
pub fn remove_command(parent: &NodeRef, name: &str) -> bool {
    let mut parent = parent.borrow_mut();
    let before = parent.children.len();
    parent.children.retain(|c| c.borrow().name != name);
    parent.children.len() != before
}

/// Greedy-prefix resolution: descend while the next token names a child.
///
/// Returns the deepest matching node and the number of tokens consumed.
/// The remaining tokens, starting with the first non-matching one, are
/// the node's arguments. Pure: the tree is not modified.
pub fn resolve(node: &NodeRef, tokens: &[String]) -> (NodeRef, usize) {
    let mut current = node.clone();
    let mut consumed = 0;
    while let Some(token) = tokens.get(consumed) {
        let next = current.borrow().child(token);
        match next {
            Some(child) => {
                current = child;
                consumed += 1;
            }
            None => break,
        }
    }
    (current, consumed)
}

/// Follow `path` exactly, one child per segment.
///
/// Unlike [`resolve`] this does not stop early: `None` on the first
/// segment without a matching child.
pub fn walk(node: &NodeRef, path: &[String]) -> Option<NodeRef> {
    let mut current = node.clone();
    for segment in path {
        let next = current.borrow().child(segment)?;
        current = next;
    }
    Some(current)
}

/// Fully-qualified display name, e.g. `"extract maps"`.
///
/// Walks the weak parent chain; the root contributes nothing.
pub fn full_name(node: &NodeRef) -> String {
    let mut parts = Vec::new();
    let mut current = Some(node.clone());
    while let Some(n) = current {
        let n = n.borrow();
        if !n.name.is_empty() {
            parts.push(n.name.clone());
        }
        current = n.parent.upgrade();
    }
    parts.reverse();
    parts.join(" ")
}

/// Render `node` and all descendants in declaration order into `out`.
///
/// Invokable nodes show their optional argument description in
/// parentheses and help text after a dash; namespace nodes show only
/// their name. Indentation grows by one level per depth. The root's
/// empty name produces no line of its own.
pub fn render(node: &NodeRef, depth: usize, out: &mut String) {
    let node = node.borrow();
    let child_depth = if node.name.is_empty() {
        depth
    } else {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&node.name);
        if node.handler.is_some() {
            if let Some(args) = &node.arg_desc {
                out.push_str(&format!(" ({args})"));
            }
            if let Some(help) = &node.help {
                out.push_str(&format!(" - {help}"));
            }
        }
        out.push('\n');
        depth + 1
    };
    for child in &node.children {
        render(child, child_depth, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Rc::new(|_, _| Ok(()))
    }

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn resolve_descends_greedily() {
        let root = CommandNode::root();
        let foo = add_command(&root, "foo", None, None, None).unwrap();
        add_command(&foo, "bar", None, None, Some(noop())).unwrap();

        let (node, consumed) = resolve(&root, &tokens(&["foo", "bar", "baz"]));
        assert_eq!(node.borrow().name(), "bar");
        assert_eq!(consumed, 2);
    }

    #[test]
    fn resolve_stops_at_first_unmatched_token() {
        let root = CommandNode::root();
        let foo = add_command(&root, "foo", None, None, None).unwrap();
        add_command(&foo, "bar", None, None, Some(noop())).unwrap();

        let (node, consumed) = resolve(&root, &tokens(&["foo", "qux"]));
        assert_eq!(node.borrow().name(), "foo");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn resolve_of_nothing_is_the_node_itself() {
        let root = CommandNode::root();
        let (node, consumed) = resolve(&root, &[]);
        assert!(Rc::ptr_eq(&node, &root));
        assert_eq!(consumed, 0);
    }

    #[test]
    fn duplicate_name_under_one_parent_is_rejected() {
        let root = CommandNode::root();
        add_command(&root, "x", None, None, None).unwrap();
        let err = add_command(&root, "x", None, None, None).unwrap_err();
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn same_name_under_different_parents_is_fine() {
        let root = CommandNode::root();
        let a = add_command(&root, "a", None, None, None).unwrap();
        let b = add_command(&root, "b", None, None, None).unwrap();
        add_command(&a, "x", None, None, None).unwrap();
        add_command(&b, "x", None, None, None).unwrap();
    }

    #[test]
    fn remove_detaches_the_child() {
        let root = CommandNode::root();
        add_command(&root, "x", None, None, None).unwrap();
        assert!(remove_command(&root, "x"));
        assert!(!remove_command(&root, "x"));
        // The name is free again.
        add_command(&root, "x", None, None, None).unwrap();
    }

    #[test]
    fn full_name_walks_to_the_root() {
        let root = CommandNode::root();
        let extract = add_command(&root, "extract", None, None, None).unwrap();
        let maps = add_command(&extract, "maps", None, None, Some(noop())).unwrap();
        assert_eq!(full_name(&maps), "extract maps");
        assert_eq!(full_name(&root), "");
    }

    #[test]
    fn walk_requires_an_exact_path() {
        let root = CommandNode::root();
        let foo = add_command(&root, "foo", None, None, None).unwrap();
        add_command(&foo, "bar", None, None, Some(noop())).unwrap();

        assert!(walk(&root, &tokens(&["foo", "bar"])).is_some());
        assert!(walk(&root, &tokens(&["foo", "qux"])).is_none());
        assert!(walk(&root, &[]).is_some());
    }

    #[test]
    fn render_lists_declaration_order_with_indentation() {
        let root = CommandNode::root();
        add_command(&root, "print", Some("words"), Some("echo"), Some(noop())).unwrap();
        let grp = add_command(&root, "grp", None, None, None).unwrap();
        add_command(&grp, "leaf", None, Some("does it"), Some(noop())).unwrap();

        let mut out = String::new();
        render(&root, 0, &mut out);
        assert_eq!(out, "print (words) - echo\ngrp\n  leaf - does it\n");
    }

    #[test]
    fn render_hides_metadata_of_namespace_nodes() {
        let root = CommandNode::root();
        add_command(&root, "grp", Some("ignored"), Some("ignored"), None).unwrap();
        let mut out = String::new();
        render(&root, 0, &mut out);
        assert_eq!(out, "grp\n");
    }
}
