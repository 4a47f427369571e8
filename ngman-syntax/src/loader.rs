//! File loading and `include` resolution

use crate::parser::{parse_str, ParseOptions};
use crate::payload::{ConfigFile, Payload, PayloadDirective};
use crate::SyntaxError;
use std::path::{Path, PathBuf};

/// A problem found while resolving `include` directives
struct IncludeProblem {
    line: Option<usize>,
    message: String,
}

/// Parse a configuration file into a payload.
///
/// The primary file is always `config[0]`. Unless `single_file` is set,
/// `include` targets are resolved relative to the primary file's directory
/// and each included file is parsed once, in discovery order.
pub fn parse(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Payload, SyntaxError> {
    let path = path.as_ref();
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut queue = vec![path.to_path_buf()];
    let mut payload = Payload::default();
    let mut index = 0;

    while index < queue.len() {
        let current = queue[index].clone();
        let file = current.display().to_string();
        tracing::debug!("Parsing {}", file);
        payload.config.push(ConfigFile::new(file.clone()));

        let source = match std::fs::read_to_string(&current) {
            Ok(source) => source,
            Err(source) if index > 0 && options.catch_errors => {
                payload.record_error(index, None, source.to_string());
                index += 1;
                continue;
            }
            Err(source) => return Err(SyntaxError::Io { path: file, source }),
        };

        match parse_str(&source, options) {
            Ok(mut parsed) => {
                if !options.single_file {
                    let mut problems = Vec::new();
                    resolve_includes(&mut parsed, &base, &mut queue, &mut problems);
                    if let Some(problem) = problems.first().filter(|_| !options.catch_errors) {
                        return Err(SyntaxError::Include {
                            file,
                            line: problem.line.unwrap_or_default(),
                            message: problem.message.clone(),
                        });
                    }
                    for problem in problems {
                        payload.record_error(index, problem.line, problem.message);
                    }
                }
                payload.config[index].parsed = Some(parsed);
            }
            Err(source) if options.catch_errors => {
                tracing::warn!("{}: {}", file, source);
                payload.record_error(index, Some(source.line()), source.to_string());
            }
            Err(source) => return Err(SyntaxError::Parse { file, source }),
        }

        index += 1;
    }

    Ok(payload)
}

fn resolve_includes(
    directives: &mut [PayloadDirective],
    base: &Path,
    queue: &mut Vec<PathBuf>,
    problems: &mut Vec<IncludeProblem>,
) {
    for directive in directives.iter_mut() {
        if let Some(block) = directive.block.as_mut() {
            resolve_includes(block, base, queue, problems);
        }

        if directive.directive != "include" || directive.args.len() != 1 {
            continue;
        }

        let target = base.join(&directive.args[0]);
        let paths = match expand(&target) {
            Ok(paths) => paths,
            Err(message) => {
                problems.push(IncludeProblem {
                    line: directive.line,
                    message,
                });
                continue;
            }
        };

        let indices = paths
            .into_iter()
            .map(|path| match queue.iter().position(|queued| *queued == path) {
                Some(position) => position,
                None => {
                    queue.push(path);
                    queue.len() - 1
                }
            })
            .collect();
        directive.includes = Some(indices);
    }
}

/// Expand an include target into the files it names
fn expand(target: &Path) -> Result<Vec<PathBuf>, String> {
    let pattern = target.display().to_string();

    if !pattern.contains(['*', '?', '[']) {
        if target.is_file() {
            return Ok(vec![target.to_path_buf()]);
        }
        return Err(format!("open() \"{}\" failed (No such file or directory)", pattern));
    }

    let entries = glob::glob(&pattern).map_err(|e| format!("invalid include pattern \"{}\": {}", pattern, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
    Ok(paths)
}
