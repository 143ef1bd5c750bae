use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use argtree_core::{
    CliError, CommandDecl, Context, ContextSettings, HaltReason, Registry, validate_command,
};
use argtree_parser::{CommandLineParser, FinalizedCommand, lex_argument_file};
use argtree_sources::{ChainedSource, ConfigFileSource, ConfigFormat};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

/// CLI output format with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argtree", version)]
#[command(about = "Parse argv against declared command trees")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse arguments against a command tree and print the finalized values.
    Parse(ParseArgs),
    /// Validate one or more command tree files.
    Validate(ValidateArgs),
    /// Split an argument file into tokens the way `@file` expansion does.
    Lex(LexArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Command tree declaration (JSON or YAML).
    #[arg(long)]
    spec: PathBuf,
    /// Config files consulted for missing options, highest priority first.
    #[arg(long = "config")]
    configs: Vec<PathBuf>,
    /// Prefix for inferred environment variable names.
    #[arg(long)]
    envvar_prefix: Option<String>,
    /// Consult config files before environment variables.
    #[arg(long)]
    config_first: bool,
    /// Report only the first usage error.
    #[arg(long)]
    first_error: bool,
    /// Disable `@file` expansion.
    #[arg(long)]
    no_argument_files: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Arguments to parse (pass them after `--`).
    #[arg(last = true)]
    argv: Vec<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Command tree files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct LexArgs {
    /// Argument file to split.
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Validate(args) => run_validate(args),
        Command::Lex(args) => run_lex(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let root = load_tree(&args.spec)?;
    let settings = build_settings(&args)?;
    debug!(spec = %args.spec.display(), tokens = args.argv.len(), "parsing argv");

    match CommandLineParser::run(&root, &args.argv, &settings) {
        Ok(finished) => {
            println!("{}", format_output(&finished, args.format)?);
            Ok(())
        }
        Err(CliError::Halt(halt)) => {
            let text = match &halt.reason {
                HaltReason::Help => render_help(&root, &halt.command_path, &settings),
                HaltReason::Message(text) => text.clone(),
            };
            if halt.error {
                Err(text)
            } else {
                println!("{text}");
                Ok(())
            }
        }
        Err(CliError::Usage(errors)) => {
            let lines: Vec<String> = errors
                .errors()
                .iter()
                .map(|e| format!("{} (usage: {})", e.error, e.command_path.join(" ")))
                .collect();
            Err(lines.join("\nerror: "))
        }
        Err(err) => Err(err.to_string()),
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut failures = Vec::new();
    for path in &args.inputs {
        let root = load_tree(path)?;
        failures.extend(
            validate_command(&root)
                .into_iter()
                .map(|err| format!("{}: {err}", path.display())),
        );
    }
    if !failures.is_empty() {
        return Err(failures.join("\nerror: "));
    }
    println!("Validated {} command tree file(s).", args.inputs.len());
    Ok(())
}

fn run_lex(args: LexArgs) -> Result<(), String> {
    let text = fs::read_to_string(&args.input)
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;
    let tokens = lex_argument_file(&args.input.display().to_string(), &text)
        .map_err(|err| err.to_string())?;
    let raw = serde_json::to_string_pretty(&tokens)
        .map_err(|err| format!("Failed to serialize tokens: {err}"))?;
    println!("{raw}");
    Ok(())
}

fn load_tree(path: &Path) -> Result<CommandDecl, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let format = ConfigFormat::from_path(path).map_err(|err| err.to_string())?;
    let parsed = match format {
        ConfigFormat::Json => serde_json::from_str(&raw).map_err(|err| err.to_string()),
        ConfigFormat::Yaml => serde_yaml::from_str(&raw).map_err(|err| err.to_string()),
    };
    parsed.map_err(|err| format!("Invalid command tree '{}': {err}", path.display()))
}

fn build_settings(args: &ParseArgs) -> Result<ContextSettings, String> {
    let mut settings =
        ContextSettings::default().with_argument_files(!args.no_argument_files);
    if let Some(prefix) = &args.envvar_prefix {
        settings = settings.with_auto_envvar_prefix(prefix);
    }
    if args.config_first {
        settings = settings.with_value_source_first();
    }
    if args.first_error {
        settings = settings.with_first_error_only();
    }
    if !args.configs.is_empty() {
        let mut chain = ChainedSource::new();
        for path in &args.configs {
            let source = ConfigFileSource::from_file(path)
                .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;
            chain = chain.with_source(source);
        }
        settings = settings.with_value_source(Arc::new(chain));
    }
    Ok(settings)
}

fn format_output(finished: &[FinalizedCommand], format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(finished)
            .map_err(|err| format!("Failed to serialize result: {err}")),
        CliOutputFormat::Yaml => serde_yaml::to_string(finished)
            .map(|raw| raw.trim_end().to_string())
            .map_err(|err| format!("Failed to serialize result: {err}")),
    }
}

/// Plain usage text for the command at `path`.
fn render_help(root: &CommandDecl, path: &[String], settings: &ContextSettings) -> String {
    let mut command = root;
    let mut context = Context::root(root, settings);
    for name in path.iter().skip(1) {
        let Some(sub) = command.find_subcommand(name) else {
            break;
        };
        context = context.child(sub);
        command = sub;
    }

    let registry = Registry::new(command, &context);
    let mut usage = format!("Usage: {}", context.command_path().join(" "));
    if registry.options().next().is_some() {
        usage.push_str(" [OPTIONS]");
    }
    for argument in registry.arguments() {
        let name = argument.name.to_uppercase();
        match (argument.required, argument.nvalues.fixed()) {
            (true, Some(_)) => usage.push_str(&format!(" {name}")),
            (true, None) => usage.push_str(&format!(" {name}...")),
            (false, Some(_)) => usage.push_str(&format!(" [{name}]")),
            (false, None) => usage.push_str(&format!(" [{name}]...")),
        }
    }
    if !command.subcommands.is_empty() {
        usage.push_str(" COMMAND [ARGS]...");
    }

    let mut out = vec![usage];
    if let Some(help) = &command.help {
        out.push(String::new());
        out.push(format!("  {help}"));
    }

    let options: Vec<(String, String)> = registry
        .options()
        .filter(|o| !o.hidden)
        .map(|o| {
            let names = o.all_names().collect::<Vec<_>>().join(", ");
            (names, o.help.clone().unwrap_or_default())
        })
        .collect();
    push_section(&mut out, "Options:", &options);

    let commands: Vec<(String, String)> = command
        .subcommands
        .iter()
        .map(|sub| (sub.name.clone(), sub.help.clone().unwrap_or_default()))
        .collect();
    push_section(&mut out, "Commands:", &commands);

    out.join("\n")
}

fn push_section(out: &mut Vec<String>, title: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    out.push(String::new());
    out.push(title.to_string());
    for (left, right) in rows {
        let line = format!("  {left:<width$}  {right}");
        out.push(line.trim_end().to_string());
    }
}
