use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use x86_features::core::report::Report;

#[derive(Parser, Debug)]
#[command(author, version, about = "Report the x86 SIMD capabilities of this machine", long_about = None)]
struct Args {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the JSON report to a file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let report = Report::new(*x86_features::init());

    if let Some(path) = &args.output {
        report.save(path)?;
        eprintln!("Wrote report to {:?}", path);
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("=== x86 Capabilities ({}) ===", report.arch);
    for (name, present) in report.features.iter() {
        println!("  {:<12} {}", name, if present { "yes" } else { "no" });
    }
    println!("Best tier: {:?}", report.best_tier);
    if let x86_features::core::diagnostics::HealthStatus::Inconsistent(msg) = &report.health {
        println!("Warning: {}", msg);
    }
    Ok(())
}
