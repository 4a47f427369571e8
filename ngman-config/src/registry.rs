//! Directive registry
//!
//! Maps directive names to a [`DirectiveKind`]: the contexts the directive
//! may appear in, the context its block opens, and how to construct it.
//! Directives missing from the registry are still parsed and saved; they
//! just become generic nodes without a context.

use crate::context::Context;
use crate::node::DirectiveNode;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Builds a node of a given kind from its arguments and optional block
pub type Constructor = fn(Vec<String>, Option<Vec<DirectiveNode>>) -> DirectiveNode;

/// Descriptor for a known directive
#[derive(Debug, Clone, Copy)]
pub struct DirectiveKind {
    pub name: &'static str,

    /// Contexts the directive is legal in
    pub allowed: &'static [Context],

    /// Context its block opens, for block directives
    pub opens: Option<Context>,

    pub construct: Constructor,
}

impl DirectiveKind {
    pub fn allows(&self, context: Context) -> bool {
        self.allowed.contains(&context)
    }

    pub fn build(&self, args: Vec<String>, children: Option<Vec<DirectiveNode>>) -> DirectiveNode {
        (self.construct)(args, children)
    }
}

macro_rules! kinds {
    (@opens) => { None };
    (@opens $ctx:ident) => { Some(Context::$ctx) };
    ($($name:literal => [$($allowed:ident),+] $(opens $opens:ident)?;)*) => {
        &[$(
            DirectiveKind {
                name: $name,
                allowed: &[$(Context::$allowed),+],
                opens: kinds!(@opens $($opens)?),
                construct: |args, children| DirectiveNode::from_parts($name, args, children),
            },
        )*]
    };
}

/// Directives known out of the box
static BUILTIN_KINDS: &[DirectiveKind] = kinds! {
    // Blocks
    "events" => [Main] opens Events;
    "http" => [Main] opens Http;
    "server" => [Http, Upstream] opens Server;
    "upstream" => [Http] opens Upstream;
    "location" => [Server, Location] opens Location;

    // Main
    "user" => [Main];
    "worker_processes" => [Main];
    "worker_rlimit_nofile" => [Main];
    "pid" => [Main];
    "daemon" => [Main];
    "load_module" => [Main];
    "error_log" => [Main, Http, Server, Location];
    "include" => [Main, Events, Http, Server, Location, Upstream];

    // Events
    "worker_connections" => [Events];
    "multi_accept" => [Events];
    "use" => [Events];

    // Http and below
    "default_type" => [Http, Server, Location];
    "log_format" => [Http];
    "access_log" => [Http, Server, Location];
    "sendfile" => [Http, Server, Location];
    "tcp_nopush" => [Http, Server, Location];
    "keepalive_timeout" => [Http, Server, Location];
    "gzip" => [Http, Server, Location];
    "client_max_body_size" => [Http, Server, Location];
    "root" => [Http, Server, Location];
    "index" => [Http, Server, Location];
    "error_page" => [Http, Server, Location];
    "proxy_set_header" => [Http, Server, Location];
    "ssl_certificate" => [Http, Server];
    "ssl_certificate_key" => [Http, Server];

    // Server
    "listen" => [Server];
    "server_name" => [Server];
    "return" => [Server, Location];
    "rewrite" => [Server, Location];
    "try_files" => [Server, Location];

    // Location
    "proxy_pass" => [Location];
    "alias" => [Location];

    // Upstream
    "keepalive" => [Upstream];
    "least_conn" => [Upstream];
    "ip_hash" => [Upstream];
};

/// Directive registry
#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry {
    kinds: HashMap<String, DirectiveKind>,
}

impl DirectiveRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in directive kind
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for kind in BUILTIN_KINDS {
            registry.register(kind.name, *kind);
        }
        tracing::debug!("Registered {} built-in directive kinds", registry.len());
        registry
    }

    /// Process-wide registry of built-in kinds, populated on first use
    pub fn builtin() -> &'static DirectiveRegistry {
        static BUILTIN: OnceLock<DirectiveRegistry> = OnceLock::new();
        BUILTIN.get_or_init(Self::with_builtins)
    }

    /// Register a directive kind, replacing any previous entry
    pub fn register(&mut self, name: impl Into<String>, kind: DirectiveKind) {
        self.kinds.insert(name.into(), kind);
    }

    /// Look up a directive kind; `None` is an expected outcome
    pub fn lookup(&self, name: &str) -> Option<&DirectiveKind> {
        self.kinds.get(name)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = DirectiveRegistry::builtin();

        let http = registry.lookup("http").unwrap();
        assert!(http.allows(Context::Main));
        assert!(!http.allows(Context::Server));
        assert_eq!(http.opens, Some(Context::Http));

        let listen = registry.lookup("listen").unwrap();
        assert_eq!(listen.opens, None);
        assert!(listen.allows(Context::Server));
    }

    #[test]
    fn test_lookup_miss_is_not_an_error() {
        assert!(DirectiveRegistry::builtin().lookup("brotli_static").is_none());
        assert!(DirectiveRegistry::new().lookup("http").is_none());
    }

    #[test]
    fn test_constructor_keeps_name_args_and_block() {
        let kind = DirectiveRegistry::builtin().lookup("location").unwrap();
        let node = kind.build(vec!["/".to_string()], Some(Vec::new()));
        assert_eq!(node.name(), "location");
        assert_eq!(node.args(), &["/".to_string()]);
        assert!(node.has_block());
        assert_eq!(node.context(), None);
    }

    #[test]
    fn test_register_custom_kind() {
        let mut registry = DirectiveRegistry::with_builtins();
        let before = registry.len();
        registry.register(
            "brotli",
            DirectiveKind {
                name: "brotli",
                allowed: &[Context::Http, Context::Server],
                opens: None,
                construct: |args, children| DirectiveNode::from_parts("brotli", args, children),
            },
        );

        assert_eq!(registry.len(), before + 1);
        assert!(registry.lookup("brotli").unwrap().allows(Context::Server));
        assert!(registry.names().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let mut names: Vec<_> = BUILTIN_KINDS.iter().map(|k| k.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN_KINDS.len());
        assert_eq!(DirectiveRegistry::builtin().len(), BUILTIN_KINDS.len());
    }
}
