//! Context validation
//!
//! Parsing never rejects a directive for being in the wrong place. This
//! walk is the explicit check: it reports registered directives sitting in
//! a context their kind does not allow.

use crate::context::Context;
use crate::node::DirectiveNode;
use crate::registry::DirectiveRegistry;
use crate::root::RootDirectives;
use std::fmt;

/// A registered directive found outside its allowed contexts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextViolation {
    /// Slash separated path to the directive, e.g. `http/server[1]/worker_connections`
    pub path: String,
    pub directive: String,
    pub found: Context,
    pub allowed: Vec<Context>,
}

impl fmt::Display for ContextViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let allowed: Vec<&str> = self.allowed.iter().map(Context::as_str).collect();
        write!(
            f,
            "\"{}\" is not allowed in {} (at {}; allowed in: {})",
            self.directive,
            self.found,
            self.path,
            allowed.join(", ")
        )
    }
}

/// Check every registered directive against the context it sits in
pub fn validate_contexts(roots: &RootDirectives, registry: &DirectiveRegistry) -> Vec<ContextViolation> {
    let mut violations = Vec::new();
    walk(roots.as_slice(), Context::Main, "", registry, &mut violations);
    violations
}

fn walk(
    nodes: &[DirectiveNode],
    context: Context,
    prefix: &str,
    registry: &DirectiveRegistry,
    violations: &mut Vec<ContextViolation>,
) {
    for (i, node) in nodes.iter().enumerate() {
        if node.is_comment() {
            continue;
        }

        // Position among same-named siblings, matching `RootDirectives::select`
        let index = nodes[..i].iter().filter(|n| n.name() == node.name()).count();
        let segment = if index == 0 {
            node.name().to_string()
        } else {
            format!("{}[{}]", node.name(), index)
        };
        let path = if prefix.is_empty() {
            segment
        } else {
            format!("{}/{}", prefix, segment)
        };

        let kind = registry.lookup(node.name());
        if let Some(kind) = kind.filter(|k| !k.allows(context)) {
            violations.push(ContextViolation {
                path: path.clone(),
                directive: node.name().to_string(),
                found: context,
                allowed: kind.allowed.to_vec(),
            });
        }

        if let Some(children) = node.children() {
            let inner = kind.and_then(|k| k.opens).unwrap_or(context);
            walk(children, inner, &path, registry, violations);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> DirectiveNode {
        DirectiveNode::new(name)
    }

    #[test]
    fn test_valid_tree_has_no_violations() {
        let roots = RootDirectives::from(vec![
            node("worker_processes").with_args(["auto"]),
            node("events").with_block(vec![node("worker_connections").with_args(["1024"])]),
            node("http").with_block(vec![node("server").with_block(vec![
                node("listen").with_args(["80"]),
                node("location").with_args(["/"]).with_block(vec![node("root").with_args(["/srv"])]),
            ])]),
        ]);
        assert!(validate_contexts(&roots, DirectiveRegistry::builtin()).is_empty());
    }

    #[test]
    fn test_misplaced_directives_are_reported() {
        let roots = RootDirectives::from(vec![
            node("listen").with_args(["80"]),
            node("http").with_block(vec![
                node("server").with_block(vec![]),
                node("server").with_block(vec![node("worker_connections").with_args(["1"])]),
            ]),
        ]);

        let violations = validate_contexts(&roots, DirectiveRegistry::builtin());
        assert_eq!(violations.len(), 2);

        assert_eq!(violations[0].path, "listen");
        assert_eq!(violations[0].found, Context::Main);
        assert_eq!(violations[0].allowed, vec![Context::Server]);

        assert_eq!(violations[1].path, "http/server[1]/worker_connections");
        assert_eq!(violations[1].found, Context::Server);
        assert!(violations[1].to_string().contains("allowed in: events"));
    }

    #[test]
    fn test_unregistered_directives_are_ignored() {
        let roots = RootDirectives::from(vec![node("brotli").with_block(vec![node("listen")])]);
        let violations = validate_contexts(&roots, DirectiveRegistry::builtin());

        // `brotli` is unknown; its block inherits the main context
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "brotli/listen");
        assert_eq!(violations[0].found, Context::Main);
    }

    #[test]
    fn test_comments_are_skipped() {
        let roots = RootDirectives::from(vec![DirectiveNode::comment(" listen 80;")]);
        assert!(validate_contexts(&roots, DirectiveRegistry::builtin()).is_empty());
    }
}
