use ngman_syntax::{build, parse, parse_str, BuildOptions, ParseOptions, PayloadDirective};
use pretty_assertions::assert_eq;

const NGINX_CONF: &str = r#"
# Main context
user  nginx;
worker_processes  auto;

events {
    worker_connections  1024;
    multi_accept on;
}

http {
    include       mime.types;
    default_type  application/octet-stream;
    log_format  main  '$remote_addr - $remote_user [$time_local] "$request" '
                      '$status $body_bytes_sent';

    map $http_upgrade $connection_upgrade {
        default upgrade;
        ''      close;
    }

    server {
        listen       80;
        server_name  localhost;
        location / {
            root   /usr/share/nginx/html;
            index  index.html index.htm;
        }
        location = /50x.html {}
        error_page   500 502 503 504  /50x.html;
        set $target ${scheme}://upstream;
    }
}
"#;

/// Structure without line numbers
fn shape(directives: &[PayloadDirective]) -> Vec<PayloadDirective> {
    directives
        .iter()
        .map(|d| PayloadDirective {
            line: None,
            block: d.block.as_deref().map(shape),
            ..d.clone()
        })
        .collect()
}

#[test]
fn rebuilt_text_is_semantically_identical() {
    let options = ParseOptions {
        comments: true,
        ..ParseOptions::default()
    };
    let parsed = parse_str(NGINX_CONF, &options).unwrap();
    let rebuilt = build(&parsed, &BuildOptions::default());
    let reparsed = parse_str(&rebuilt, &options).unwrap();

    assert_eq!(shape(&parsed), shape(&reparsed));
}

#[test]
fn rebuilding_is_stable() {
    let options = ParseOptions::default();
    let once = build(&parse_str(NGINX_CONF, &options).unwrap(), &BuildOptions::default());
    let twice = build(&parse_str(&once, &options).unwrap(), &BuildOptions::default());
    assert_eq!(once, twice);
}

#[test]
fn empty_quoted_argument_survives() {
    let parsed = parse_str(NGINX_CONF, &ParseOptions::default()).unwrap();
    let http = parsed[3].block.as_ref().unwrap();
    let map = &http[3];
    assert_eq!(map.directive, "map");
    assert_eq!(map.block.as_ref().unwrap()[1].args, vec!["", "close"]);

    let rebuilt = build(&parsed, &BuildOptions::default());
    assert!(rebuilt.contains("\"\" close;"));
}

#[test]
fn parse_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nginx.conf");
    std::fs::write(&path, NGINX_CONF).unwrap();

    let payload = parse(&path, &ParseOptions::default()).unwrap();
    let parsed = payload.config[0].parsed.as_ref().unwrap();
    assert_eq!(parsed.len(), 4);
    assert_eq!(parsed[2].directive, "events");
    assert_eq!(parsed[2].line, Some(6));
}

#[test]
fn awkward_quoted_arguments_survive_rebuild() {
    let source = r#"
        add_header X-A "a${";
        root "C:\\www\\";
        rewrite ^/a\.b$ "/x y" last;
        return 200 'it\'s "fine"';
    "#;
    let options = ParseOptions::default();
    let parsed = parse_str(source, &options).unwrap();
    assert_eq!(parsed[0].args, vec!["X-A", "a${"]);
    assert_eq!(parsed[1].args, vec!["C:\\www\\"]);
    assert_eq!(parsed[3].args, vec!["200", "it's \"fine\""]);

    let rebuilt = build(&parsed, &BuildOptions::default());
    assert!(rebuilt.contains("add_header X-A \"a${\";"));
    let reparsed = parse_str(&rebuilt, &options).unwrap();
    assert_eq!(shape(&parsed), shape(&reparsed));
}
