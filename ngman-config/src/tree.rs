//! Conversion between payload directives and directive nodes
//!
//! [`build_block`] turns the parser's payload into [`DirectiveNode`]s,
//! dispatching on the registry; [`flatten_block`] is its inverse and feeds
//! the builder. Both preserve order and the no-block / empty-block
//! distinction.

use crate::context::Context;
use crate::node::DirectiveNode;
use crate::registry::DirectiveRegistry;
use crate::root::RootDirectives;
use ngman_core::{Error, Result, Warning};
use ngman_syntax::{Payload, PayloadDirective};

/// Build nodes for a top-level directive list
pub fn build_block(
    directives: &[PayloadDirective],
    registry: &DirectiveRegistry,
    warnings: &mut Vec<Warning>,
) -> Vec<DirectiveNode> {
    build_in(directives, Context::Main, registry, warnings)
}

fn build_in(
    directives: &[PayloadDirective],
    context: Context,
    registry: &DirectiveRegistry,
    warnings: &mut Vec<Warning>,
) -> Vec<DirectiveNode> {
    let mut nodes = Vec::with_capacity(directives.len());

    for directive in directives {
        if let Some(text) = directive.comment.as_deref().filter(|_| directive.is_comment()) {
            nodes.push(DirectiveNode::comment(text));
            continue;
        }

        let kind = registry.lookup(&directive.directive);
        let inner = kind.and_then(|k| k.opens).unwrap_or(context);
        let children = directive
            .block
            .as_deref()
            .map(|block| build_in(block, inner, registry, warnings));

        let node = match kind {
            Some(kind) => kind
                .build(directive.args.clone(), children)
                .with_context(context),
            None => {
                tracing::debug!(
                    "Unregistered directive \"{}\" kept as a generic node",
                    directive.directive
                );
                warnings.push(Warning::UnregisteredDirective {
                    name: directive.directive.clone(),
                    line: directive.line,
                });
                DirectiveNode::from_parts(directive.directive.clone(), directive.args.clone(), children)
            }
        };
        nodes.push(node);
    }

    nodes
}

/// Flatten nodes back into payload directives.
///
/// `block` is left out for nodes without a block and kept, possibly empty,
/// for nodes with one.
pub fn flatten_block(nodes: &[DirectiveNode]) -> Vec<PayloadDirective> {
    nodes
        .iter()
        .map(|node| {
            if let Some(text) = node.comment_text() {
                return PayloadDirective::comment(text);
            }
            PayloadDirective {
                block: node.children().map(flatten_block),
                ..PayloadDirective::new(node.name()).with_args(node.args().to_vec())
            }
        })
        .collect()
}

/// Build the root collection for `file` out of a parsed payload.
///
/// The payload must hold an entry for `file`, and that entry must carry
/// parsed content; anything else means the parser output cannot be trusted.
pub fn root_from_payload(
    payload: &Payload,
    file: &str,
    registry: &DirectiveRegistry,
    warnings: &mut Vec<Warning>,
) -> Result<RootDirectives> {
    let entry = payload
        .file(file)
        .ok_or_else(|| Error::Structural(format!("no entry for {} in parser output", file)))?;

    if let Some(error) = entry.errors.first() {
        return Err(Error::Structural(format!(
            "{} was reported with errors instead of content: {}",
            file, error.error
        )));
    }

    let parsed = entry
        .parsed
        .as_deref()
        .ok_or_else(|| Error::Structural(format!("entry for {} has no parsed content", file)))?;

    Ok(build_block(parsed, registry, warnings).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngman_syntax::{parse_str, ConfigFile, ParseOptions};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Vec<PayloadDirective> {
        parse_str(source, &ParseOptions::default()).unwrap()
    }

    fn build(source: &str) -> (Vec<DirectiveNode>, Vec<Warning>) {
        let mut warnings = Vec::new();
        let nodes = build_block(&parse(source), DirectiveRegistry::builtin(), &mut warnings);
        (nodes, warnings)
    }

    #[test]
    fn test_scenario_tree() {
        let (nodes, warnings) =
            build("worker_processes auto;\nevents {\n  worker_connections 1024;\n}\n");

        assert!(warnings.is_empty());
        assert_eq!(
            nodes,
            vec![
                DirectiveNode::new("worker_processes")
                    .with_args(["auto"])
                    .with_context(Context::Main),
                DirectiveNode::new("events")
                    .with_block(vec![DirectiveNode::new("worker_connections")
                        .with_args(["1024"])
                        .with_context(Context::Events)])
                    .with_context(Context::Main),
            ]
        );
    }

    #[test]
    fn test_no_block_and_empty_block_stay_distinct() {
        let (nodes, _) = build("foo bar;\nfoo bar {}\n");
        assert!(!nodes[0].has_block());
        assert!(nodes[1].has_block());

        let flat = flatten_block(&nodes);
        assert_eq!(flat[0].block, None);
        assert_eq!(flat[1].block, Some(Vec::new()));
    }

    #[test]
    fn test_unregistered_directive_is_kept() {
        let (nodes, warnings) = build("http {\n  brotli on;\n  brotli_types text/css;\n}\n");

        let http = &nodes[0];
        let brotli = http.find("brotli").unwrap();
        assert_eq!(brotli.args(), &["on".to_string()]);
        assert_eq!(brotli.context(), None);
        assert_eq!(http.children().unwrap().len(), 2);
        assert_eq!(
            warnings[0],
            Warning::UnregisteredDirective {
                name: "brotli".to_string(),
                line: Some(2),
            }
        );
    }

    #[test]
    fn test_contexts_follow_nesting() {
        let (nodes, _) = build(
            "http { server { listen 80; location / { location /a { proxy_pass http://b; } } } }",
        );
        let server = nodes[0].find("server").unwrap();
        assert_eq!(server.context(), Some(Context::Http));
        assert_eq!(server.find("listen").unwrap().context(), Some(Context::Server));

        let inner = server.find("location").unwrap().find("location").unwrap();
        assert_eq!(inner.context(), Some(Context::Location));
        assert_eq!(inner.find("proxy_pass").unwrap().context(), Some(Context::Location));
    }

    #[test]
    fn test_unregistered_block_keeps_enclosing_context() {
        let (nodes, _) = build("http { server { if ($bad) { return 403; } } }");
        let ret = nodes[0]
            .find("server")
            .and_then(|s| s.find("if"))
            .and_then(|i| i.find("return"))
            .unwrap();
        assert_eq!(ret.context(), Some(Context::Server));
    }

    #[test]
    fn test_flatten_is_inverse_of_build() {
        let source = "user nginx;\nhttp {\n  server {\n    listen 80;\n    location / {}\n  }\n  map $a $b {\n    default 0;\n  }\n}\n";
        let strip = |ds: Vec<PayloadDirective>| -> Vec<PayloadDirective> {
            fn go(ds: Vec<PayloadDirective>) -> Vec<PayloadDirective> {
                ds.into_iter()
                    .map(|d| PayloadDirective {
                        line: None,
                        block: d.block.map(go),
                        ..d
                    })
                    .collect()
            }
            go(ds)
        };

        let (nodes, _) = build(source);
        assert_eq!(flatten_block(&nodes), strip(parse(source)));
    }

    #[test]
    fn test_comments_round_trip() {
        let options = ParseOptions {
            comments: true,
            ..ParseOptions::default()
        };
        let parsed = parse_str("# head\nevents {\n  # inner\n}\n", &options).unwrap();
        let mut warnings = Vec::new();
        let nodes = build_block(&parsed, DirectiveRegistry::builtin(), &mut warnings);

        assert!(nodes[0].is_comment());
        assert!(nodes[1].children().unwrap()[0].is_comment());

        let flat = flatten_block(&nodes);
        assert_eq!(flat[0].comment.as_deref(), Some(" head"));
        assert_eq!(flat[1].block.as_ref().unwrap()[0].comment.as_deref(), Some(" inner"));
    }

    #[test]
    fn test_root_from_payload_requires_entry() {
        let payload = Payload::default();
        let err = root_from_payload(&payload, "nginx.conf", DirectiveRegistry::builtin(), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[test]
    fn test_root_from_payload_requires_parsed_content() {
        let payload = Payload {
            config: vec![ConfigFile::new("nginx.conf")],
            ..Payload::default()
        };
        let err = root_from_payload(&payload, "nginx.conf", DirectiveRegistry::builtin(), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::Structural(ref m) if m.contains("no parsed content")));

        let mut failed = payload.clone();
        failed.config[0].parsed = Some(Vec::new());
        failed.record_error(0, Some(1), "unexpected \"}\"");
        let err = root_from_payload(&failed, "nginx.conf", DirectiveRegistry::builtin(), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::Structural(ref m) if m.contains("unexpected")));
    }

    #[test]
    fn test_root_from_payload_keeps_duplicates() {
        let payload = Payload {
            config: vec![ConfigFile::new("nginx.conf").with_parsed(parse(
                "server { listen 80; }\nserver { listen 81; }\n",
            ))],
            ..Payload::default()
        };
        let roots =
            root_from_payload(&payload, "nginx.conf", DirectiveRegistry::builtin(), &mut Vec::new())
                .unwrap();
        assert_eq!(roots.get_all("server").count(), 2);
    }
}
