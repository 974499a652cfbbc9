use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pdf_keyword_tally::{
    ChartOutcome, ChartTarget, Pipeline, PdfExtractor, RunConfig, RunOutcome,
    render_chart, render_page_report,
};

#[derive(Parser)]
#[command(name = "pdf-keyword-tally")]
#[command(about = "Count category keywords in a PDF and keep running totals", long_about = None)]
struct Args {
    /// PDF file to scan
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// JSON file holding the cumulative counts
    #[arg(short, long, value_name = "PATH", default_value = "keyword_counts.json")]
    state: PathBuf,

    /// TOML file with the keyword categories (built-in set if omitted)
    #[arg(short, long, value_name = "TOML")]
    keywords: Option<PathBuf>,

    /// Password for encrypted PDFs
    #[arg(short, long)]
    password: Option<String>,

    /// Only scan the first N pages
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Count on the raw extracted text, without NFKC normalization
    #[arg(long)]
    no_normalize: bool,

    /// Write a pie chart of the cumulative counts to this SVG file
    #[arg(long, value_name = "SVG")]
    chart: Option<PathBuf>,

    /// Print a bar chart of the cumulative counts
    #[arg(long)]
    terminal_chart: bool,

    /// Write per-page counts for this document as JSON
    #[arg(long, value_name = "JSON")]
    page_report: Option<PathBuf>,

    /// Include each page's extracted text in the page report
    #[arg(long, requires = "page_report")]
    include_text: bool,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = RunConfig::from_keyword_file(args.keywords.as_deref(), &args.state)?;

    let mut builder = PdfExtractor::builder().normalize(!args.no_normalize);
    if let Some(password) = args.password {
        builder = builder.password(password);
    }
    if let Some(n) = args.max_pages {
        builder = builder.max_pages(n);
    }
    let extractor = builder.build();

    let pipeline = Pipeline::new(config);
    let report = match pipeline.run(&args.file, &extractor)? {
        RunOutcome::Completed(report) => report,
        RunOutcome::ExtractionFailed(e) => {
            // Not fatal: nothing was counted and the state is unchanged.
            eprintln!("Error: {}", e);
            return Ok(());
        }
    };

    if let Some(path) = &args.page_report {
        let texts = args.include_text.then_some(report.texts.as_slice());
        let json = render_page_report(&report.pages, texts)?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("writing page report to {}", path.display()))?;
    }

    println!(
        "{}: {} keyword occurrences on {} pages",
        report.document.display(),
        report.tally.total(),
        report.pages.len()
    );
    println!();
    print!("{}", report.summary);

    if let Some(path) = args.chart {
        if let ChartOutcome::Svg(path) = render_chart(&report.state, &ChartTarget::Svg(path))? {
            println!("Chart saved to {}", path.display());
        }
    }

    if args.terminal_chart {
        if let ChartOutcome::Terminal(text) = render_chart(&report.state, &ChartTarget::Terminal)? {
            println!();
            print!("{}", text);
        }
    }

    Ok(())
}
