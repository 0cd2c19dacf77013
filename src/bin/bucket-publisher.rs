//! Bucket Publisher CLI
//!
//! Publishes versioned package archives to an object-storage bucket and
//! lists previously published versions.

use anyhow::Result;
use bucket_publisher::{
    PackageManifest, PublishOptions, PublishOrchestrator, PublishedVersion, PublisherConfig,
    S3ObjectStore, VersionLister,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

/// Registry-free package publishing over object storage
#[derive(Parser)]
#[command(name = "bucket-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Publish versioned package archives to an object-storage bucket", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the package archive and upload it
    Publish {
        /// Target bucket (defaults to bucket.name in package.json)
        #[arg(value_name = "BUCKET")]
        bucket: Option<String>,

        /// Overwrite an already-published artifact
        #[arg(short, long)]
        force: bool,

        /// Project path (defaults to current directory)
        #[arg(long, value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List published versions of the package
    List {
        /// Target bucket (defaults to bucket.name in package.json)
        #[arg(value_name = "BUCKET")]
        bucket: Option<String>,

        /// Package name to list (defaults to the manifest name)
        #[arg(short, long)]
        package: Option<String>,

        /// Project path (defaults to current directory)
        #[arg(long, value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish {
            bucket,
            force,
            project_path,
            timeout,
        } => {
            let root = project_path.unwrap_or_else(|| PathBuf::from("."));
            publish_command(root, bucket, force, timeout).await
        }
        Commands::List {
            bucket,
            package,
            project_path,
            timeout,
        } => {
            let root = project_path.unwrap_or_else(|| PathBuf::from("."));
            list_command(root, bucket, package, timeout).await
        }
    }
}

async fn load_config(root: &PathBuf, timeout: Option<u64>) -> Result<PublisherConfig> {
    let mut config = PublisherConfig::load(root).await?;
    if let Some(secs) = timeout {
        config.timeout_secs = secs;
    }
    Ok(config)
}

async fn resolve_bucket(root: &PathBuf, cli_bucket: Option<String>) -> Result<String> {
    if let Some(bucket) = cli_bucket {
        return Ok(bucket);
    }

    let manifest = PackageManifest::load(root).await?;
    match manifest.default_bucket() {
        Some(bucket) => Ok(bucket.to_string()),
        None => anyhow::bail!(
            "no bucket specified: pass one on the command line or set bucket.name in package.json"
        ),
    }
}

async fn publish_command(
    root: PathBuf,
    bucket: Option<String>,
    force: bool,
    timeout: Option<u64>,
) -> Result<i32> {
    println!("\n📦 bucket-publisher\n");

    let config = load_config(&root, timeout).await?;
    let bucket = resolve_bucket(&root, bucket).await?;
    let store = S3ObjectStore::new(&config)?;

    let orchestrator = PublishOrchestrator::new(&root, config, &store);

    match orchestrator
        .publish(&bucket, &PublishOptions { force })
        .await
    {
        Ok(report) => {
            for warning in &report.warnings {
                println!("⚠️  {}", warning);
            }
            println!("\n✅ Publishing completed in {} ms", report.duration_ms);
            Ok(0)
        }
        Err(e) => {
            eprintln!("\n❌ {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("   {}", hint);
            }
            Ok(1)
        }
    }
}

async fn list_command(
    root: PathBuf,
    bucket: Option<String>,
    package: Option<String>,
    timeout: Option<u64>,
) -> Result<i32> {
    let config = load_config(&root, timeout).await?;
    let bucket = resolve_bucket(&root, bucket).await?;

    let package_name = match package {
        Some(name) => name,
        None => PackageManifest::load(&root).await?.identity()?.name,
    };

    let store = S3ObjectStore::new(&config)?;
    let lister = VersionLister::new(&store, &bucket);

    let listing = match lister.list(&package_name).await {
        Ok(listing) => listing,
        Err(e) => {
            eprintln!("\n❌ {}", e);
            return Ok(1);
        }
    };

    if listing.versions.is_empty() {
        println!("No published versions of {} in {}", package_name, bucket);
    } else {
        println!("Published versions of {} in {}:", package_name, bucket);
        for version in sorted_for_display(&listing.versions) {
            println!(
                "  {:<12}  {}  ({})",
                version.version,
                version.key,
                version.last_modified.format("%Y-%m-%d %H:%M UTC")
            );
        }
    }

    for key in &listing.malformed {
        eprintln!("⚠️  skipping key that does not follow the naming convention: {}", key);
    }

    Ok(0)
}

/// Core listing order is backend order; sort only for display, semver
/// first, lexicographic fallback for versions that do not parse
fn sorted_for_display(versions: &[PublishedVersion]) -> Vec<PublishedVersion> {
    let mut sorted = versions.to_vec();
    sorted.sort_by(|a, b| {
        match (
            semver::Version::parse(&a.version),
            semver::Version::parse(&b.version),
        ) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => a.version.cmp(&b.version),
        }
    });
    sorted
}
