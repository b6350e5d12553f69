//! Build automation tasks for the ADPC GEM publisher
//!
//! - Generating the CLI reference from the clap definitions

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for adpc-gem", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<gem_publisher::Cli>();

    let content = format!(
        r#"# adpc-gem CLI Reference

Generated from the CLI source code on {}.

`adpc-gem` publishes one HDX dataset per country (Cambodia, Laos, Myanmar,
Thailand, Vietnam) from the ADPC Gender Equality Monitor files.

## Quick Start

```bash
# See which country files are present
adpc-gem countries --data-dir data

# Inspect the payloads without contacting HDX
adpc-gem preview --countries KHM

# Publish to the demo site
HDX_KEY=... USER_AGENT=... adpc-gem publish --hdx-site demo
```

## Data Layout

```text
data/
  khm/
    khm-gem-gii-national.csv
    ...
    khm-gem-province-boundaries.geojson
```

## Environment Variables

- `HDX_KEY` - HDX API key
- `HDX_SITE` - `prod`, `feature`, `demo`, `stage` or a base URL (default: `demo`)
- `USER_AGENT` - user agent sent to HDX
- `EXTRA_PARAMS` - `key=value` overrides, e.g. `countries=KHM,THA`
- `GEM_DATA_DIR` - data directory (default: `data`)
- `HDX_TIMEOUT_SECS` - per-country timeout (default: `300`)
- `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR`, `TEMP_DIR`, `LOG_FILE_ONLY` - logging

## Commands

{}

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
