//! ngman Directive Tree
//!
//! This crate turns a parsed nginx configuration into a tree of typed
//! directive nodes, lets callers edit it, and writes it back.
//!
//! # Example
//!
//! ```rust,ignore
//! use ngman_config::{ConfigManager, DirectiveNode};
//! use ngman_core::Settings;
//!
//! let mut manager = ConfigManager::open(Settings::for_root("/etc/nginx"))?;
//! manager
//!     .directives_mut()?
//!     .select_mut("events")
//!     .map(|events| events.push_child(DirectiveNode::new("multi_accept").with_args(["on"])));
//! manager.save()?;
//! ```

pub mod context;
pub mod manager;
pub mod node;
pub mod registry;
pub mod root;
pub mod shared;
pub mod tree;
pub mod validate;

pub use context::Context;
pub use manager::{ConfigListing, ConfigManager, ManagerState};
pub use node::DirectiveNode;
pub use registry::{Constructor, DirectiveKind, DirectiveRegistry};
pub use root::RootDirectives;
pub use shared::SharedConfig;
pub use tree::{build_block, flatten_block, root_from_payload};
pub use validate::{validate_contexts, ContextViolation};
