use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use schemashift_core::{
    convert, ConvertOptions, JsonSchemaVersion, SchemaFormat, UnionMode,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "schemashift")]
#[command(about = "Convert schema definitions between JSON Schema, Avro Schema, and XSD")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a schema file into one or more target formats
    Convert {
        /// Input schema file
        input: PathBuf,

        /// Source schema format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Jsonschema)]
        from: FormatArg,

        /// Target formats (repeatable)
        #[arg(short, long = "to", value_enum, default_values_t = vec![FormatArg::Avro, FormatArg::Xsd])]
        to: Vec<FormatArg>,

        /// Output directory; without it every result prints to stdout
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Root element/record name (defaults to RootElement / RootRecord)
        #[arg(long)]
        root_name: Option<String>,

        /// Target namespace (Avro default: com.example)
        #[arg(long)]
        namespace: Option<String>,

        /// Optional-field encoding for Avro output
        #[arg(long, value_enum, default_value_t = UnionModeArg::Nullable)]
        union_mode: UnionModeArg,

        /// Route date/time/uuid formats and decimals through Avro logical types
        #[arg(long)]
        logical_types: bool,

        /// Round-trip XSD attributes
        #[arg(long)]
        include_attributes: bool,

        /// Draft identifier stamped into emitted JSON Schema
        #[arg(long, value_enum, default_value_t = DraftArg::V2020_12)]
        json_schema_version: DraftArg,

        /// Recursion ceiling for deeply nested schemas
        #[arg(long, default_value_t = 50)]
        max_depth: usize,

        /// Print conversion statistics to stderr
        #[arg(long)]
        stats: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum FormatArg {
    Jsonschema,
    Avro,
    Xsd,
}

impl From<FormatArg> for SchemaFormat {
    fn from(val: FormatArg) -> Self {
        match val {
            FormatArg::Jsonschema => SchemaFormat::Jsonschema,
            FormatArg::Avro => SchemaFormat::Avro,
            FormatArg::Xsd => SchemaFormat::Xsd,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum UnionModeArg {
    Nullable,
    Strict,
    Permissive,
}

impl From<UnionModeArg> for UnionMode {
    fn from(val: UnionModeArg) -> Self {
        match val {
            UnionModeArg::Nullable => UnionMode::Nullable,
            UnionModeArg::Strict => UnionMode::Strict,
            UnionModeArg::Permissive => UnionMode::Permissive,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum DraftArg {
    #[value(name = "draft-04")]
    V04,
    #[value(name = "draft-07")]
    V07,
    #[value(name = "2019-09")]
    V2019_09,
    #[value(name = "2020-12")]
    V2020_12,
}

impl From<DraftArg> for JsonSchemaVersion {
    fn from(val: DraftArg) -> Self {
        match val {
            DraftArg::V04 => JsonSchemaVersion::Draft04,
            DraftArg::V07 => JsonSchemaVersion::Draft07,
            DraftArg::V2019_09 => JsonSchemaVersion::Draft201909,
            DraftArg::V2020_12 => JsonSchemaVersion::Draft202012,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for schema output
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            from,
            to,
            out_dir,
            root_name,
            namespace,
            union_mode,
            logical_types,
            include_attributes,
            json_schema_version,
            max_depth,
            stats,
        } => {
            let source_text = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read input file: {}", input.display()))?;

            let targets: Vec<SchemaFormat> = to.into_iter().map(SchemaFormat::from).collect();
            let options = ConvertOptions {
                source: from.into(),
                targets: targets.clone(),
                root_name,
                namespace,
                union_mode: union_mode.into(),
                logical_types,
                include_attributes,
                json_schema_version: json_schema_version.into(),
                max_depth,
            };

            let outcome = convert(&source_text, &options);

            for warning in &outcome.stats.warnings {
                eprintln!("Warning: {warning}");
            }
            if stats {
                eprintln!(
                    "Stats: {}",
                    serde_json::to_string_pretty(&outcome.stats)
                        .context("Failed to serialize stats")?
                );
            }
            if outcome.error {
                bail!("{}: {}", outcome.error_code, outcome.error_message);
            }

            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("schema");
            for target in &targets {
                let (text, extension) = match target {
                    SchemaFormat::Jsonschema => (&outcome.json_schema, "schema.json"),
                    SchemaFormat::Avro => (&outcome.avro_schema, "avsc"),
                    SchemaFormat::Xsd => (&outcome.xsd, "xsd"),
                };
                write_output(text, out_dir.as_deref(), stem, extension)?;
            }
        }
    }

    Ok(())
}

fn write_output(text: &str, out_dir: Option<&Path>, stem: &str, extension: &str) -> Result<()> {
    match out_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            let path = dir.join(format!("{stem}.{extension}"));
            fs::write(&path, text)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
