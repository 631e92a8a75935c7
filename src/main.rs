//! Command-line entry point.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rampart::check;
use rampart::node::Origin;
use rampart::render;
use rampart::template::Template;
use rampart::upgrade;

#[derive(Parser)]
#[command(
    name = "rampart",
    version,
    about = "Check a CloudFormation upgrade plan for transient security exposure."
)]
struct Cli {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Compare an initial and a target template and report unsafe rollout
    /// states.
    Check {
        /// Template describing the currently deployed state.
        #[arg(short, long)]
        initial: PathBuf,
        /// Template describing the state being rolled out.
        #[arg(short, long)]
        target: PathBuf,
        /// Exit with a failure status when findings are reported.
        #[arg(long)]
        fail_on_findings: bool,
    },
    /// Print a dataflow graph in Graphviz DOT form.
    Graph {
        /// Template to graph.
        #[arg(short, long)]
        initial: PathBuf,
        /// Optional target template; when given, the transient upgrade
        /// graph is rendered instead.
        #[arg(short, long)]
        target: Option<PathBuf>,
    },
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let code = match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        };
        let _ = err.print();
        std::process::exit(code);
    });

    match cli.action {
        Action::Check {
            initial,
            target,
            fail_on_findings,
        } => {
            let initial = Template::from_path(&initial, Origin::Initial)?;
            let target = Template::from_path(&target, Origin::Target)?;
            let findings = check::analyze(&initial, &target)?;
            if findings.is_empty() {
                println!("No issues were found!");
            } else {
                println!("{} issues were found:", findings.len());
                for finding in &findings {
                    println!("{finding}");
                }
                if fail_on_findings {
                    std::process::exit(1);
                }
            }
        }
        Action::Graph { initial, target } => {
            let initial = Template::from_path(&initial, Origin::Initial)?;
            let mut graph = match target {
                Some(target) => {
                    let target = Template::from_path(&target, Origin::Target)?;
                    upgrade::transient_graph(&initial, &target)?
                }
                None => initial.graph()?,
            };
            graph.propagate_security();
            print!("{}", render::to_dot(&graph));
        }
    }
    Ok(())
}
