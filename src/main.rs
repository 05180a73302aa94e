//! The `solbuild` command line interface.

use std::{path::PathBuf, process::exit};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use yansi::Paint;

use solbuild::{config::ProjectPathsConfig, Project};

#[derive(Debug, Parser)]
#[command(name = "solbuild", version, about = "Compiles a directory of solidity contracts, one solc invocation per file")]
struct Args {
    /// Directory containing the contract sources
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Directory the artifacts are written to, must exist
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Compile only the named contract, `Token` for `Token.sol`
    #[arg(short = 'n', long)]
    contract_name: Option<String>,

    /// Render the dependency graph to <output>/DependencyGraph.png
    #[arg(short, long)]
    graph: bool,

    /// Compile only files no other file imports
    #[arg(long)]
    leaves: bool,

    /// Additionally write flattened <name>_packed.sol sources
    #[arg(long)]
    pack: bool,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !args.input_dir.is_dir() {
        tracing::error!("{} is not an input dir", args.input_dir.display());
        exit(2);
    }
    if !args.output_dir.is_dir() {
        tracing::error!("{} is not an output dir", args.output_dir.display());
        exit(2);
    }
    if let Some(name) = &args.contract_name {
        if !args.input_dir.join(format!("{name}.sol")).exists() {
            tracing::error!("contract {} does not exist", name);
            exit(2);
        }
    }

    if let Err(err) = run(args) {
        tracing::error!("{err}");
        exit(1);
    }
}

fn run(args: Args) -> solbuild::error::Result<()> {
    let paths = ProjectPathsConfig::new(&args.input_dir, &args.output_dir)?;
    let project = Project::new(paths);

    if args.graph {
        let image = project.write_dependency_graph()?;
        println!("{} {}", Paint::green("Dependency graph rendered to"), image.display());
    }

    if let Some(name) = &args.contract_name {
        project.compile_contract(name)?;
    } else if args.leaves {
        project.compile_leaves()?;
    } else {
        project.compile_all()?;
    }

    if args.pack {
        project.pack_all()?;
    }

    println!("{}", Paint::green("Done."));
    Ok(())
}
