use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use arinc665_core::decode::read_media_set;
use arinc665_core::encode::write_media_set;
use arinc665_core::media::{Directory, File};
use arinc665_core::set::MediaSet;
use arinc665_core::validate::{validate, Validation};
use arinc665_core::xml;

#[derive(Parser)]
#[command(name = "arinc665", version, about = "ARINC 665 media set tools")]
struct Cli {
    /// Verbose logging (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Validate media set directories
    Check {
        /// Emit a JSON report per medium instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
        #[arg(required = true)]
        medium_dirs: Vec<PathBuf>,
    },
    /// Print a media set summary
    Print { medium_dir: PathBuf },
    /// Export media set directories to an interchange XML document
    Export {
        #[arg(long, short = 'o')]
        output_file: PathBuf,
        #[arg(required = true)]
        medium_dirs: Vec<PathBuf>,
    },
    /// Build an on-disk media set from interchange XML and payload files
    Compile {
        /// Interchange document describing the set
        #[arg(long)]
        xml: PathBuf,
        /// Directory of payload files to carry into the set
        #[arg(long)]
        files: Option<PathBuf>,
        #[arg(long, short = 'o')]
        output: PathBuf,
        #[arg(long)]
        include: Vec<String>,
        #[arg(long)]
        exclude: Vec<String>,
    },
    /// Print a summary of an interchange XML document
    PrintXml { xml_file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Cmd::Check { json, medium_dirs } => check(&medium_dirs, json),
        Cmd::Print { medium_dir } => print_medium(&medium_dir),
        Cmd::Export { output_file, medium_dirs } => export(&medium_dirs, &output_file),
        Cmd::Compile { xml, files, output, include, exclude } => {
            compile(&xml, files.as_deref(), &output, &include, &exclude)
        }
        Cmd::PrintXml { xml_file } => print_xml(&xml_file),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(serde::Serialize)]
struct CheckReport<'a> {
    generated_utc: String,
    medium: String,
    passed: bool,
    errors: &'a [String],
    warnings: &'a [String],
}

fn check(medium_dirs: &[PathBuf], json: bool) -> Result<()> {
    let mut all_ok = true;
    for (i, dir) in medium_dirs.iter().enumerate() {
        let set = read_media_set(dir).with_context(|| format!("load medium {}", dir.display()))?;
        let report = validate(&set);
        if json {
            print_json_report(dir, &report)?;
        } else {
            print_text_report(i + 1, dir, &report);
        }
        all_ok &= report.passed();
    }
    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

fn print_json_report(dir: &Path, report: &Validation) -> Result<()> {
    let (errors, warnings) = report.results();
    let out = CheckReport {
        generated_utc: chrono::Utc::now().to_rfc3339(),
        medium: dir.display().to_string(),
        passed: report.passed(),
        errors,
        warnings,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_text_report(index: usize, dir: &Path, report: &Validation) {
    println!("Validating medium {}: {}", index, dir.display());
    let (errors, warnings) = report.results();
    for error in errors {
        println!("  ERROR: {error}");
    }
    for warning in warnings {
        println!("  WARNING: {warning}");
    }
    if errors.is_empty() && warnings.is_empty() {
        println!("  No issues found.");
    }
    if report.passed() {
        println!("Medium {index} validation PASSED");
    } else {
        println!("Medium {index} validation FAILED");
    }
}

fn print_medium(medium_dir: &Path) -> Result<()> {
    let set = read_media_set(medium_dir)
        .with_context(|| format!("load medium {}", medium_dir.display()))?;
    print_summary(&set);
    Ok(())
}

fn print_xml(xml_file: &Path) -> Result<()> {
    let set = xml::import_xml_file(xml_file)?;
    print_summary(&set);
    Ok(())
}

fn print_summary(set: &MediaSet) {
    println!("ARINC 665 Media Set");
    println!("{}", "=".repeat(40));
    println!("Version: ARINC 665-{}", set.version);
    println!("Directories: {}", set.directories.len());
    println!("Loads: {}", set.loads.len());
    println!("Batches: {}", set.batches.len());

    if !set.loads.is_empty() {
        println!();
        println!("Loads:");
        for (i, load) in set.loads.iter().enumerate() {
            println!("  {}. {}", i + 1, load.part_number);
            println!("     Type: {}", load.load_type.as_str());
            if let Some(description) = &load.description {
                println!("     Description: {description}");
            }
            if !load.target_hardware_ids.is_empty() {
                println!("     Target HW: {}", load.target_hardware_ids.join(", "));
            }
            println!("     Files: {}", load.files.len());
            println!("     Size: {} bytes", load.total_size());
        }
    }

    if !set.batches.is_empty() {
        println!();
        println!("Batches:");
        for (i, batch) in set.batches.iter().enumerate() {
            println!("  {}. {}", i + 1, batch.name);
            if let Some(description) = &batch.description {
                println!("     Description: {description}");
            }
            println!("     Loads: {}", batch.loads.len());
            if !batch.execution_order.is_empty() {
                println!("     Execution order: {}", batch.execution_order.join(" -> "));
            }
        }
    }

    if !set.directories.is_empty() {
        println!();
        println!("Directories:");
        for dir in &set.directories {
            print_directory(dir, 2);
        }
    }
}

fn print_directory(dir: &Directory, indent: usize) {
    println!("{:indent$}{}/", "", dir.name, indent = indent);
    for file in dir.files() {
        println!("{:indent$}{} ({} bytes)", "", file.name, file.size, indent = indent + 2);
    }
    for sub in dir.subdirectories() {
        print_directory(sub, indent + 2);
    }
}

fn export(medium_dirs: &[PathBuf], output_file: &Path) -> Result<()> {
    let mut combined = MediaSet::default();
    for (i, dir) in medium_dirs.iter().enumerate() {
        let set = read_media_set(dir).with_context(|| format!("load medium {}", dir.display()))?;
        tracing::info!(
            medium = %dir.display(),
            loads = set.loads.len(),
            batches = set.batches.len(),
            "loaded medium"
        );
        if i == 0 {
            combined.version = set.version;
        }
        combined.directories.extend(set.directories);
        combined.loads.extend(set.loads);
        combined.batches.extend(set.batches);
    }
    xml::export_xml_file(&combined, output_file)?;
    eprintln!("Wrote {}", output_file.display());
    Ok(())
}

fn compile(
    xml_file: &Path,
    files_dir: Option<&Path>,
    output: &Path,
    include: &[String],
    exclude: &[String],
) -> Result<()> {
    let mut set = xml::import_xml_file(xml_file)?;
    if let Some(src) = files_dir {
        let (inc, exc) = build_globset(include, exclude)?;
        let name = output.file_name().and_then(|s| s.to_str()).unwrap_or("media");
        let mut root = Directory::new(name);
        let mut attached = 0usize;
        for entry in WalkDir::new(src).sort_by_file_name().min_depth(1).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(src)?.to_path_buf();
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if !inc.is_match(&rel_str) || exc.is_match(&rel_str) {
                continue;
            }
            let payload = std::fs::read(entry.path())
                .with_context(|| format!("read {}", entry.path().display()))?;
            insert_payload_file(&mut root, &rel_str, payload)?;
            attached += 1;
        }
        set.add_directory(root);
        eprintln!("Attached {attached} payload file(s) from {}", src.display());
    }
    write_media_set(&set, output)?;
    eprintln!("Wrote media set under {}", output.display());
    Ok(())
}

fn build_globset(includes: &[String], excludes: &[String]) -> Result<(GlobSet, GlobSet)> {
    let mut incb = GlobSetBuilder::new();
    let mut excb = GlobSetBuilder::new();
    if includes.is_empty() {
        incb.add(Glob::new("**/*")?);
    }
    for g in includes {
        incb.add(Glob::new(g)?);
    }
    for g in excludes {
        excb.add(Glob::new(g)?);
    }
    Ok((incb.build()?, excb.build()?))
}

fn insert_payload_file(dir: &mut Directory, rel: &str, payload: Vec<u8>) -> Result<()> {
    match rel.split_once('/') {
        None => dir.add_file(File::from_payload(rel, payload)),
        Some((head, rest)) => insert_payload_file(dir.ensure_subdirectory(head), rest, payload),
    }
}
