//! Executor: finalizes and runs an invocation tree depth-first.

use argtree_core::{CliError, CommandInvocation, ParsedValues};
use serde::Serialize;
use tracing::debug;

use crate::finalize::finalize;

/// A command that was finalized (and run) successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizedCommand {
    pub command_path: Vec<String>,
    pub values: ParsedValues,
}

/// Finalizes every command of the tree in command-line order, running each
/// one's callback before moving on to its subcommands.
///
/// Stops at the first command that fails to finalize or whose callback
/// returns an error; commands finalized before that have already run.
pub fn finalize_and_run(root: &CommandInvocation<'_>) -> Result<Vec<FinalizedCommand>, CliError> {
    let mut finished = Vec::new();
    let mut pending = vec![root];

    while let Some(invocation) = pending.pop() {
        let values = finalize(invocation)?;
        let command_path = invocation.command_path().to_vec();

        if let Some(run) = &invocation.command.run {
            debug!(command = %command_path.join(" "), "running command");
            run.call(&values).map_err(|message| CliError::Run {
                command_path: command_path.clone(),
                message,
            })?;
        }

        finished.push(FinalizedCommand {
            command_path,
            values,
        });
        pending.extend(invocation.children.iter().rev());
    }

    Ok(finished)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::parse_argv;
    use argtree_core::{CommandDecl, ContextSettings, OptionDecl, UsageError};

    #[test]
    fn test_runs_parent_before_children_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let record = |name: &'static str| {
            let log = Arc::clone(&log);
            move |_: &ParsedValues| {
                log.lock().unwrap().push(name);
                Ok::<(), String>(())
            }
        };
        let root = CommandDecl::new("tool")
            .allow_multiple_subcommands()
            .on_run(record("tool"))
            .with_subcommand(CommandDecl::new("a").on_run(record("a")))
            .with_subcommand(CommandDecl::new("b").on_run(record("b")));

        let parsed = parse_argv(&root, &["b", "a"], &ContextSettings::default());
        let finished = finalize_and_run(&parsed.invocation).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["tool", "b", "a"]);
        let paths: Vec<Vec<String>> = finished.into_iter().map(|f| f.command_path).collect();
        assert_eq!(
            paths,
            vec![
                vec!["tool".to_string()],
                vec!["tool".to_string(), "b".to_string()],
                vec!["tool".to_string(), "a".to_string()],
            ]
        );
    }

    #[test]
    fn test_parent_runs_before_child_errors_surface() {
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        let root = CommandDecl::new("tool")
            .on_run(move |_| {
                *flag.lock().unwrap() = true;
                Ok(())
            })
            .with_subcommand(
                CommandDecl::new("sub").with_option(OptionDecl::single(&["--x"]).required()),
            );

        let parsed = parse_argv(&root, &["sub"], &ContextSettings::default());
        let err = finalize_and_run(&parsed.invocation).unwrap_err();

        assert!(*ran.lock().unwrap());
        match err {
            CliError::Usage(errors) => {
                let error = errors.single().expect("one error");
                assert_eq!(error.command_path, vec!["tool", "sub"]);
                assert_eq!(error.error, UsageError::MissingOption { name: "--x".into() });
            }
            other => panic!("expected usage error, got {other:?}"),
        }
    }

    #[test]
    fn test_run_error_stops_execution() {
        let root = CommandDecl::new("tool")
            .on_run(|_| Err("disk full".to_string()))
            .with_subcommand(CommandDecl::new("sub"));
        let parsed = parse_argv(&root, &["sub"], &ContextSettings::default());
        let err = finalize_and_run(&parsed.invocation).unwrap_err();
        match err {
            CliError::Run {
                command_path,
                message,
            } => {
                assert_eq!(command_path, vec!["tool"]);
                assert_eq!(message, "disk full");
            }
            other => panic!("expected run error, got {other:?}"),
        }
    }

    #[test]
    fn test_finalized_command_serializes() {
        let root = CommandDecl::new("tool")
            .with_option(OptionDecl::counted(&["-v"]))
            .with_option(OptionDecl::single(&["--name"]));
        let settings = ContextSettings::default().with_env_map(Default::default());
        let parsed = parse_argv(&root, &["-vv"], &settings);
        let finished = finalize_and_run(&parsed.invocation).unwrap();

        let json = serde_json::to_value(&finished[0]).unwrap();
        assert_eq!(json["command_path"], serde_json::json!(["tool"]));
        assert_eq!(json["values"]["options"]["v"]["value"], 2);
        assert_eq!(json["values"]["options"]["v"]["origin"], "command_line");
        assert!(json["values"]["options"]["name"]["value"].is_null());
        assert!(json["values"]["options"]["name"]["origin"].is_null());
    }
}
