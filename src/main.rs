use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use shade_graph_compiler::{CompileOptions, compile_with_options, dsl, validate_wgsl};

#[derive(Debug, Default, Clone)]
struct Cli {
    graph: Option<PathBuf>,
    out: Option<PathBuf>,
    validate: bool,
    strict: bool,
}

const USAGE: &str = "usage: shade-graph-compile --graph <graph.json> [--out <shader.wgsl>] [--validate] [--strict]";

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--graph" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --graph"));
                };
                cli.graph = Some(PathBuf::from(v));
                i += 2;
            }
            "--out" | "-o" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --out"));
                };
                cli.out = Some(PathBuf::from(v));
                i += 2;
            }
            "--validate" => {
                cli.validate = true;
                i += 1;
            }
            "--strict" => {
                cli.strict = true;
                i += 1;
            }
            other => {
                return Err(anyhow!("unknown argument: {other}\n{USAGE}"));
            }
        }
    }
    Ok(cli)
}

fn run(cli: &Cli) -> Result<()> {
    let graph_path = cli
        .graph
        .as_deref()
        .ok_or_else(|| anyhow!("missing --graph\n{USAGE}"))?;

    let graph = dsl::load_graph_from_path(graph_path)?;
    log::info!(
        "loaded {} nodes from {}",
        graph.nodes.len(),
        graph_path.display()
    );

    let options = if cli.strict {
        CompileOptions::strict()
    } else {
        CompileOptions::default()
    };
    let wgsl = compile_with_options(&graph, &options)
        .with_context(|| format!("failed to compile {}", graph_path.display()))?;

    if cli.validate {
        validate_wgsl(&wgsl)
            .with_context(|| format!("{} generated invalid WGSL", graph_path.display()))?;
        log::info!("generated WGSL validated");
    }

    match cli.out.as_deref() {
        Some(out) => {
            std::fs::write(out, &wgsl)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("[shade-graph] wrote: {}", out.display());
        }
        None => print!("{wgsl}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;
    run(&cli)
}
