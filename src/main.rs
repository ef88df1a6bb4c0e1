//! Command-line interface for xsd-editor

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use xsdedit::serializer::{BackupPolicy, MultiFileSerializer, SaveOptions};
#[cfg(feature = "cli")]
use xsdedit::{NodeFactory, SchemaSet, SchemaStatistics};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsd-editor")]
#[command(author, version, about = "Inspect and re-save multi-file XSD schemas", long_about = None)]
struct Cli {
    /// Skip xs:import resolution
    #[arg(long, global = true)]
    no_imports: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a schema and print its statistics and load diagnostics
    Inspect {
        /// Path to the main XSD file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Load a schema and write all of its files again
    Resave {
        /// Path to the main XSD file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Output directory (defaults to overwriting the originals)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Keep a `.bak` copy of every overwritten file
        #[arg(short, long)]
        backup: bool,
    },

    /// List references that do not resolve to any definition
    Refs {
        /// Path to the main XSD file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let factory = NodeFactory::with_options(xsdedit::FactoryOptions::new().with_load_imports(!cli.no_imports));

    let result = match cli.command {
        Commands::Inspect { schema, json } => cmd_inspect(&factory, schema, json),
        Commands::Resave { schema, out, backup } => cmd_resave(&factory, schema, out, backup),
        Commands::Refs { schema } => cmd_refs(&factory, schema),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
type CliResult = Result<bool, Box<dyn std::error::Error>>;

#[cfg(feature = "cli")]
fn cmd_inspect(factory: &NodeFactory, schema_path: PathBuf, json_output: bool) -> CliResult {
    let set = factory.load(&schema_path)?;
    let stats = SchemaStatistics::of_set(&set);

    if json_output {
        let output = serde_json::json!({
            "statistics": stats,
            "imports": set.imports().keys().collect::<Vec<_>>(),
            "diagnostics": set.diagnostics(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(true);
    }

    print_summary(&set, &stats);
    if !set.diagnostics().is_empty() {
        println!("\n=== Diagnostics ===");
        for diagnostic in set.diagnostics() {
            println!("  {}", diagnostic);
        }
    }
    Ok(true)
}

#[cfg(feature = "cli")]
fn print_summary(set: &SchemaSet, stats: &SchemaStatistics) {
    println!("xsd-editor v{}", xsdedit::VERSION);
    println!();
    println!("Schema Information:");
    match &stats.target_namespace {
        Some(ns) => println!("  Target Namespace: {}", ns),
        None => println!("  Target Namespace: (none)"),
    }
    println!("  Files: {}", stats.files);
    for file in set.included_files() {
        println!(
            "    {} (via {})",
            file.path.display(),
            file.declared_location.as_deref().unwrap_or("?")
        );
    }
    for namespace in set.imports().keys() {
        println!("  Import: {}", namespace);
    }
    println!();
    println!("Statistics:");
    println!("  Elements: {} ({} global)", stats.elements, stats.global_elements);
    println!("  Element References: {}", stats.element_references);
    println!("  Attributes: {}", stats.attributes);
    println!("  Complex Types: {}", stats.complex_types);
    println!("  Simple Types: {}", stats.simple_types);
    println!("  Model Groups: {}", stats.groups);
    println!("  Attribute Groups: {}", stats.attribute_groups);
    println!("  Facets: {}", stats.facets);
    println!("  Documented: {:.1}%", stats.documentation_coverage);
    println!(
        "  Particles: {} required, {} optional, {} unbounded",
        stats.cardinality.required, stats.cardinality.optional, stats.cardinality.unbounded
    );
}

#[cfg(feature = "cli")]
fn cmd_resave(factory: &NodeFactory, schema_path: PathBuf, out: Option<PathBuf>, backup: bool) -> CliResult {
    let set = factory.load(&schema_path)?;
    let mut options = SaveOptions {
        output_dir: out,
        ..Default::default()
    };
    if backup {
        options = options.with_backup(BackupPolicy::bak());
    }

    let report = MultiFileSerializer::new().save(set.tree(), &options)?;
    for (original, result) in &report.files {
        match result {
            Ok(written) => println!("✓ {} -> {}", original.display(), written.display()),
            Err(e) => println!("✗ {}: {}", original.display(), e),
        }
    }
    Ok(report.is_success())
}

#[cfg(feature = "cli")]
fn cmd_refs(factory: &NodeFactory, schema_path: PathBuf) -> CliResult {
    let set = factory.load(&schema_path)?;
    let unresolved = set.unresolved_references();
    let naming = set.validate_names();

    for reference in &unresolved {
        println!("  - {}", reference);
    }
    for diagnostic in &naming {
        println!("  - {}", diagnostic);
    }
    if unresolved.is_empty() && naming.is_empty() {
        println!("✓ All references resolve");
        return Ok(true);
    }
    println!("\n{} unresolved reference(s), {} naming problem(s)", unresolved.len(), naming.len());
    Ok(false)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
