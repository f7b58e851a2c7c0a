use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use wdi_rs::{Catalog, Client, Config, PanelRequest, SearchField, SearchResults};
use wdi_rs::{build_catalog, search, storage};

#[derive(Parser, Debug)]
#[command(
    name = "wdi",
    version,
    about = "Fetch World Bank indicators into a country-year panel & search the catalog"
)]
struct Cli {
    /// Response language (en, es, fr, ar, zh).
    #[arg(long, global = true)]
    language: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a panel (and optionally save it).
    Get(GetArgs),
    /// Download the series and country catalog to a JSON file.
    Catalog(CatalogArgs),
    /// Search the series catalog.
    Search(SearchArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FieldArg {
    Indicator,
    Name,
    Description,
    SourceDatabase,
    SourceOrganization,
}

impl From<FieldArg> for SearchField {
    fn from(f: FieldArg) -> Self {
        match f {
            FieldArg::Indicator => SearchField::Indicator,
            FieldArg::Name => SearchField::Name,
            FieldArg::Description => SearchField::Description,
            FieldArg::SourceDatabase => SearchField::SourceDatabase,
            FieldArg::SourceOrganization => SearchField::SourceOrganization,
        }
    }
}

#[derive(Args, Debug)]
struct GetArgs {
    /// Country codes separated by comma or semicolon (e.g., US,CA,MX) or "all"
    #[arg(short, long, default_value = "all")]
    countries: String,
    /// Indicator codes separated by comma or semicolon; `label=CODE` renames the column
    #[arg(short, long)]
    indicators: String,
    /// First year (inclusive)
    #[arg(long, default_value_t = 1960)]
    start: i32,
    /// Last year (inclusive); defaults to the current year
    #[arg(long)]
    end: Option<i32>,
    /// Attach country metadata (region, income level, …)
    #[arg(long, default_value_t = false)]
    extra: bool,
    /// Catalog JSON written by `wdi catalog` (used with --extra)
    #[arg(long)]
    cache: Option<PathBuf>,
    /// Maximum concurrent requests
    #[arg(long)]
    concurrency: Option<usize>,
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

#[derive(Args, Debug)]
struct CatalogArgs {
    /// Where to write the catalog JSON
    #[arg(long, default_value = "wdi_catalog.json")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Case-insensitive substring; empty matches everything
    #[arg(default_value = "")]
    query: String,
    #[arg(long, value_enum, default_value = "name")]
    field: FieldArg,
    /// Print only indicator code and name
    #[arg(long, default_value_t = false)]
    short: bool,
    /// Catalog JSON written by `wdi catalog`; the embedded catalog is used otherwise
    #[arg(long)]
    cache: Option<PathBuf>,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Format up to 4 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn fmt_text(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| "NA".to_string())
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn load_cache(path: Option<&PathBuf>) -> Result<Option<Catalog>> {
    path.map(|p| {
        storage::load_catalog(p).with_context(|| format!("read catalog {}", p.display()))
    })
    .transpose()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(lang) = &cli.language {
        config = config.with_language(lang);
    }
    if let Some(t) = cli.timeout {
        config.timeout_secs = t;
    }

    match cli.cmd {
        Command::Get(args) => cmd_get(config, args),
        Command::Catalog(args) => cmd_catalog(config, args),
        Command::Search(args) => cmd_search(args),
    }
}

fn cmd_get(mut config: Config, args: GetArgs) -> Result<()> {
    if let Some(n) = args.concurrency {
        config.concurrency = n;
    }
    let client = Client::new(config)?;
    let cache = load_cache(args.cache.as_ref())?;
    let request = PanelRequest {
        countries: parse_list(&args.countries),
        indicators: parse_list(&args.indicators),
        start: args.start,
        end: args.end.unwrap_or_else(|| chrono::Local::now().year()),
        extra: args.extra,
    };

    let report = client.fetch_panel(&request, cache.as_ref())?;
    if let Some(w) = report.warning() {
        eprintln!("warning: {w}");
    }
    let panel = &report.panel;

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(panel, path)?,
            "json" => storage::save_json(panel, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", panel.len(), path.display());
    } else {
        println!("{}", panel.columns().join("\t"));
        for row in panel.rows() {
            let mut cells = vec![row.iso2c.clone(), row.country.clone(), row.year.to_string()];
            cells.extend(row.values.iter().map(|v| fmt_opt(*v)));
            if panel.is_enriched() {
                match row.meta.as_ref() {
                    Some(m) => cells.extend([
                        m.iso3c.clone(),
                        fmt_text(&m.region),
                        fmt_text(&m.capital),
                        fmt_opt(m.longitude),
                        fmt_opt(m.latitude),
                        fmt_text(&m.income),
                        fmt_text(&m.lending),
                    ]),
                    None => cells.extend(std::iter::repeat_n("NA".to_string(), 7)),
                }
            }
            println!("{}", cells.join("\t"));
        }
    }
    Ok(())
}

fn cmd_catalog(config: Config, args: CatalogArgs) -> Result<()> {
    let client = Client::new(config)?;
    let catalog = build_catalog(&client)?;
    storage::save_catalog(&catalog, &args.out)
        .with_context(|| format!("write catalog {}", args.out.display()))?;
    eprintln!(
        "Saved {} series and {} countries to {}",
        catalog.series.len(),
        catalog.countries.len(),
        args.out.display()
    );
    Ok(())
}

fn cmd_search(args: SearchArgs) -> Result<()> {
    let cache = load_cache(args.cache.as_ref())?;
    match search(cache.as_ref(), &args.query, args.field.into(), args.short) {
        SearchResults::Short(hits) => {
            for h in hits {
                println!("{}\t{}", h.indicator, h.name);
            }
        }
        SearchResults::Full(rows) => {
            for s in rows {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    s.indicator, s.name, s.source_database, s.source_organization, s.description
                );
            }
        }
    }
    Ok(())
}
