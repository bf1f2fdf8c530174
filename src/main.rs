//! Covenant CLI - convention linter for Symfony and EasyAdmin projects

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use covenant::config::{Config, OutputFormat};
use covenant::engine::Engine;
use covenant::facts::{FactsRepository, InMemoryFacts};
use covenant::output::{JsonFormatter, OutputFormatter, TextFormatter};
use covenant::rule::ConventionRule;
use covenant::rules::builtin_rules;
use covenant::Severity;
use glob::glob;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "covenant",
    version,
    about = "Symfony and EasyAdmin convention linter",
    long_about = "Checks exported syntax bundles against controller, CRUD admin and web test conventions."
)]
struct Cli {
    /// Syntax bundle files or glob patterns
    #[arg(required_unless_present_any = ["list_rules", "explain"])]
    bundles: Vec<String>,

    /// Reflection facts snapshot (JSON)
    #[arg(long)]
    facts: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Disable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Option<Vec<String>>,

    /// Only enable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    /// Select rules by prefix (e.g., 'easyAdmin' selects all easyAdmin.* rules)
    #[arg(long, value_delimiter = ',')]
    extend: Option<Vec<String>>,

    /// Ignore rules by prefix
    #[arg(long, value_delimiter = ',')]
    ignore: Option<Vec<String>>,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Show detailed information about a specific rule
    #[arg(long)]
    explain: Option<String>,

    /// Exit with 0 even if violations are found
    #[arg(long)]
    exit_zero: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Show per-rule timing statistics
    #[arg(long)]
    timing: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "error".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    }
}

fn print_rule(rule: &dyn ConventionRule) {
    let meta = rule.meta();
    println!(
        "    {} [{}] ({})",
        meta.id.cyan(),
        severity_label(meta.severity),
        meta.category
    );
    if let Some(desc) = &meta.description {
        println!("      {}", desc);
    }
}

fn list_rules(config: &Config) {
    let rules = builtin_rules();
    println!("{} ({} rules)", "Available rules".bold(), rules.len());
    println!();
    for rule in &rules {
        print_rule(rule.as_ref());
        if !config.is_rule_enabled(rule.id()) || !config.is_category_enabled(rule.meta().category) {
            println!("      {}", "(disabled by configuration)".dimmed());
        }
    }
}

fn explain_rule(rule: &dyn ConventionRule) {
    let meta = rule.meta();
    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), meta.id.cyan());
    println!("  {}: {}", "Name".bold(), meta.name);
    println!("  {}: {}", "Severity".bold(), severity_label(meta.severity));
    println!("  {}: {}", "Category".bold(), meta.category);
    println!("  {}: {}", "Inspects".bold(), rule.node_kind());

    if let Some(desc) = &meta.description {
        println!();
        println!("  {}", "Description".bold());
        println!("  {}", desc);
    }

    if let Some(rationale) = &meta.rationale {
        println!();
        println!("  {}", "Rationale".bold());
        println!("  {}", rationale);
    }

    if let Some(bad) = &meta.example_bad {
        println!();
        println!("  {} {}", "Example".bold(), "(incorrect)".red());
        for line in bad.lines() {
            println!("    {}", line);
        }
    }

    if let Some(good) = &meta.example_good {
        println!();
        println!("  {} {}", "Example".bold(), "(correct)".green());
        for line in good.lines() {
            println!("    {}", line);
        }
    }
}

/// Expand glob patterns, keeping plain paths as given
fn expand_bundles(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        for entry in glob(pattern).with_context(|| format!("invalid pattern '{}'", pattern))? {
            match entry {
                Ok(path) if path.is_file() => {
                    files.push(path);
                    matched = true;
                }
                Ok(_) => {}
                Err(e) => debug!("Skipping unreadable path: {}", e),
            }
        }
        if !matched {
            files.push(PathBuf::from(pattern));
        }
    }
    Ok(files)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load_default().context("failed to load default config")?,
    };

    config.merge_cli(
        cli.format.map(OutputFormat::from),
        cli.jobs,
        cli.disable.clone(),
        cli.select.clone(),
    );
    if let Some(prefixes) = &cli.extend {
        config.add_extend_prefixes(prefixes.clone());
    }
    if let Some(prefixes) = &cli.ignore {
        config.add_ignore_prefixes(prefixes.clone());
    }
    Ok(config)
}

fn load_facts(cli: &Cli) -> Result<Arc<FactsRepository>> {
    let repository = match &cli.facts {
        Some(path) => {
            let facts = InMemoryFacts::load(path)
                .with_context(|| format!("failed to load facts snapshot {}", path.display()))?;
            debug!("Loaded {} class facts from {}", facts.len(), path.display());
            FactsRepository::new(Arc::new(facts))
        }
        None => FactsRepository::empty(),
    };
    Ok(Arc::new(repository))
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(&cli)?;

    if cli.list_rules {
        list_rules(&config);
        return Ok(0);
    }

    if let Some(rule_id) = &cli.explain {
        let rules = builtin_rules();
        let Some(rule) = rules.iter().find(|r| r.id() == rule_id.as_str()) else {
            eprintln!("Use {} to see all available rules", "--list-rules".cyan());
            bail!("rule '{}' not found", rule_id);
        };
        explain_rule(rule.as_ref());
        return Ok(0);
    }

    let files = expand_bundles(&cli.bundles)?;
    if files.is_empty() {
        bail!("no syntax bundles to lint");
    }

    let format = config.output.format;
    let engine = Engine::new(config, load_facts(&cli)?);
    let result = engine.lint(&files);

    let formatter: Box<dyn OutputFormatter> = match format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new();
            if cli.no_color {
                Box::new(formatter.without_color())
            } else {
                Box::new(formatter)
            }
        }
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
    };
    print!("{}", formatter.format(&result));

    if cli.timing && matches!(format, OutputFormat::Text) {
        eprintln!();
        eprintln!("{}", "Rule timings".bold());
        for timing in result.sorted_timings() {
            eprintln!(
                "  {:<60} {:>8.2?} total {:>6} evaluations {:>4} matches",
                timing.rule_id, timing.total_time, timing.evaluation_count, timing.match_count
            );
        }
    }

    if cli.exit_zero {
        Ok(0)
    } else {
        Ok(result.exit_code())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            std::process::exit(2);
        }
    }
}
