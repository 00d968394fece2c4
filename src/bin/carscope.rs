use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "carscope", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the catalog header.
    Info(InfoArgs),
    /// List rendition keys without decoding payloads.
    List(ListArgs),
    /// Decode every rendition and write it under a directory.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input `.car` file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Input `.car` file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print keys as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input `.car` file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Bound exported images to a square preview of this many pixels.
    #[arg(long)]
    preview: Option<u32>,

    /// Decode renditions in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Entries per parallel batch.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::List(args) => cmd_list(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn open(path: &std::path::Path) -> anyhow::Result<carscope::Container> {
    carscope::Container::open(path).with_context(|| format!("open catalog '{}'", path.display()))
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let container = open(&args.in_path)?;
    let h = container.header();
    println!("version:          {}", h.main_version_string);
    println!("version string:   {}", h.version_string);
    println!("coreui version:   {}", h.coreui_version);
    println!("storage version:  {}", h.storage_version);
    println!("timestamp:        {}", h.storage_timestamp);
    println!("renditions:       {}", h.rendition_count);
    println!("uuid:             {}", h.uuid_string());
    println!("checksum:         {:#010x}", h.associated_checksum);
    println!("schema version:   {}", h.schema_version);
    println!("color space id:   {}", h.color_space_id);
    println!("key semantics:    {}", h.key_semantics);
    let attrs: Vec<String> = container
        .key_format()
        .attributes
        .iter()
        .map(|a| format!("{a:?}"))
        .collect();
    println!("key format:       {}", attrs.join(", "));
    Ok(())
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let container = open(&args.in_path)?;
    let keys = container.keys()?;
    if args.json {
        let out = serde_json::to_string_pretty(&keys).context("serialize keys")?;
        println!("{out}");
        return Ok(());
    }
    for key in &keys {
        println!("{}\t{}\t{}", key.rendition_name, key.name, key.summary());
    }
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let container = open(&args.in_path)?;
    let opts = carscope::EnumerateOpts {
        output_hint: None,
        parallel: args.parallel,
        chunk_size: args.chunk_size,
        threads: args.threads,
        preview: args.preview.map(carscope::PreviewOpts::square),
    };
    let mut sink = carscope::DirectorySink::new(&args.out);
    let summary = carscope::enumerate_to_sink(&container, &opts, &mut sink)
        .with_context(|| format!("export to '{}'", args.out.display()))?;
    println!("{summary}");
    eprintln!("wrote {} files to {}", sink.written().len(), args.out.display());
    Ok(())
}
