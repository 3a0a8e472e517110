use std::{path::PathBuf, time::Duration};

use anyhow::{Result, bail};
use clap::Parser;
use scour_search::{FindInPage, FindOutcome};

mod config;
mod document;
mod report;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "scour")]
#[command(about = "Find and highlight text in a laid-out document", long_about = None)]
#[command(version)]
struct Cli {
    /// Document description (JSON)
    document: PathBuf,

    /// Text to find, matched case-insensitively
    query: String,

    /// Config file to use instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Time slice per search step in milliseconds (overrides the config)
    #[arg(long)]
    budget_ms: Option<u64>,

    /// Move to the next visible match this many times after the search
    #[arg(long, default_value_t = 0)]
    next: usize,

    /// Move to the previous visible match this many times after the search
    #[arg(long, default_value_t = 0)]
    previous: usize,

    /// Print the highlighted document tree
    #[arg(long)]
    show_tree: bool,

    /// Print the highlight stylesheet
    #[arg(long)]
    stylesheet: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("scour: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let app_config = AppConfig::load_or_create(cli.config.as_deref());
    let budget = cli
        .budget_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| app_config.time_budget());
    let find_config = app_config.find_config();

    if cli.stylesheet {
        print!("{}", find_config.stylesheet());
    }

    let mut doc = document::load_document(&cli.document)?;
    let pristine = document::snapshot(&doc);

    let mut find = FindInPage::new(find_config);
    let mut outcome = find.start(&mut doc, &cli.query, budget);
    let mut slices = 1usize;
    while outcome == FindOutcome::Timeout {
        outcome = find.pump(&mut doc, budget);
        slices += 1;
    }
    log::info!(
        "search for {:?} finished in {} slices of {:?}",
        cli.query,
        slices,
        budget
    );

    let mut steps = Vec::new();
    for _ in 0..cli.next {
        steps.push(find.next(&mut doc));
    }
    for _ in 0..cli.previous {
        steps.push(find.previous(&mut doc));
    }

    let summary = report::Summary {
        query: &cli.query,
        slices,
        total_matches: find.matches().len(),
        outcome,
        steps,
        position: find.position(),
    };
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render());
    }

    if cli.show_tree {
        for outline in document::snapshot(&doc) {
            println!("{outline}");
        }
    }

    find.cleanup(&mut doc);
    if document::snapshot(&doc) != pristine {
        bail!("document was not restored after cleanup");
    }
    Ok(())
}
