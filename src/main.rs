use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tulip_ltl::guide;
use tulip_ltl::spec::{
    KnownVariables, Tree, infer_constants, parse, parse_spec_file, spec_to_gr1c,
};

#[derive(Parser, Debug)]
#[command(name = "tulip-ltl")]
#[command(about = "Parse, check and export TuLiP LTL specifications", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a formula and print it fully parenthesized
    Parse {
        formula: String,
        #[arg(long, help = "Print the syntax tree as JSON")]
        json: bool,
    },
    /// Render the syntax tree of a formula as Graphviz dot
    Tree {
        formula: String,
        #[arg(long)]
        detailed: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check every formula of a specification file against its domains
    Check {
        #[arg(long)]
        spec: PathBuf,
    },
    /// Quote the names in a formula that are not variables
    Infer {
        formula: String,
        #[arg(long, help = "Take variables and domains from a specification file")]
        spec: Option<PathBuf>,
        #[arg(long = "var", help = "Variable name (repeatable), used without --spec")]
        vars: Vec<String>,
    },
    /// Translate a specification file to gr1c input
    Gr1c {
        #[arg(long)]
        spec: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the user-guide index page
    Guide {
        #[arg(long, help = "Directory whose .rst pages must cover every section")]
        check: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn write_or_print(out: Option<&PathBuf>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Parse { formula, json } => {
            let node = parse(&formula)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&node)?);
            } else {
                println!("formula={node}");
                let vars: Vec<String> = node.variables().into_iter().collect();
                println!("variables={}", vars.join(","));
                println!("temporal={}", node.is_temporal());
            }
        }
        Command::Tree {
            formula,
            detailed,
            out,
        } => {
            let tree = Tree::from_ast(&parse(&formula)?);
            write_or_print(out.as_ref(), &tree.to_dot(detailed))?;
        }
        Command::Check { spec } => {
            let cfg = parse_spec_file(&spec)?;
            cfg.check()?;
            println!("spec={}", spec.display());
            println!("env_vars={}", cfg.env_vars.len());
            println!("sys_vars={}", cfg.sys_vars.len());
            for (section, formulas) in cfg.formula_sections() {
                println!("{}={}", section.to_lowercase(), formulas.len());
            }
            println!("ok=true");
        }
        Command::Infer {
            formula,
            spec,
            vars,
        } => {
            let out = match spec {
                Some(path) => {
                    let domains = parse_spec_file(&path)?.domains();
                    infer_constants(&formula, KnownVariables::Domains(&domains))?
                }
                None => {
                    let names: BTreeSet<String> = vars.into_iter().collect();
                    infer_constants(&formula, KnownVariables::Names(&names))?
                }
            };
            println!("{out}");
        }
        Command::Gr1c { spec, out } => {
            let cfg = parse_spec_file(&spec)?;
            let text = spec_to_gr1c(&cfg)?;
            write_or_print(out.as_ref(), &text)?;
        }
        Command::Guide { check } => match check {
            Some(dir) => {
                let missing = guide::missing_sections(&dir);
                if !missing.is_empty() {
                    bail!(
                        "guide index references missing pages in {}: {}",
                        dir.display(),
                        missing.join(", ")
                    );
                }
                println!("sections={}", guide::SECTIONS.len());
                println!("ok=true");
            }
            None => print!("{}", guide::render_index()),
        },
    }

    Ok(())
}
