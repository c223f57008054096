use anyhow::Context;
use clap::{Parser, Subcommand};
use rda_core::{
    core_config_from_env, exceeds_threshold, pattern_distribution, patterns_by_severity,
    AnalysisRecord, AnalysisService, DetailLevel, Identifier, Segment,
};
use rda_gemini::{GeminiAnalyzer, GeminiConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rda")]
#[command(about = "Rhetorical dynamics analysis CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a conversation and store the result
    Analyze {
        /// Conversation text (omit when using --file)
        text: Option<String>,
        /// Read the conversation from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Background for the analyst (relationship, situation)
        #[arg(long, default_value = "")]
        context: String,
        /// compact, standard or deep (defaults to RDA_DETAIL_LEVEL)
        #[arg(long)]
        detail: Option<DetailLevel>,
    },
    /// Browse or edit the stored history
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Print a stored conversation with the cited evidence marked
    Segments {
        /// Record identifier
        id: Identifier,
    },
    /// Print severity groups and pattern counts for a stored record
    Report {
        /// Record identifier
        id: Identifier,
    },
    /// Store a saved analyzer response without calling the analyzer
    Import {
        /// JSON file holding the analyzer response
        #[arg(long)]
        response: PathBuf,
        /// File holding the conversation the response belongs to
        #[arg(long)]
        text: PathBuf,
        /// Context text to keep with the record
        #[arg(long, default_value = "")]
        context: String,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List stored analyses, most recent first
    List,
    /// Show one stored analysis
    Show { id: Identifier },
    /// Remove one stored analysis
    Remove { id: Identifier },
    /// Remove every stored analysis
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("rda=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Nothing to do. Try `rda --help`.");
        return Ok(());
    };

    let env = |name: &str| std::env::var(name).ok();
    let config = core_config_from_env(env)?;
    let analyzer = GeminiAnalyzer::new(GeminiConfig::from_env(env)?)?;
    let service = AnalysisService::open(&config, Arc::new(analyzer))?;

    match command {
        Commands::Analyze {
            text,
            file,
            context,
            detail,
        } => {
            let conversation = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("provide the conversation text or --file"),
            };
            let detail = detail.unwrap_or(service.detail_level());
            match service
                .analyze_with_detail(&conversation, &context, detail)
                .await
            {
                Ok(record) => print_record(&record, service.toxicity_threshold()),
                Err(e) => eprintln!("Error analysing conversation: {}", e),
            }
        }
        Commands::History { action } => match action {
            HistoryCommand::List => {
                let records = service.history().list();
                if records.is_empty() {
                    println!("No analyses stored.");
                }
                for record in records {
                    println!(
                        "{}  {}  score {:>5.1}  {} pattern(s)  {}",
                        record.id(),
                        record.created_at().format("%Y-%m-%d %H:%M"),
                        record.score(),
                        record.patterns().len(),
                        first_line(record.source_text()),
                    );
                }
            }
            HistoryCommand::Show { id } => match service.history().get(id) {
                Some(record) => print_record(&record, service.toxicity_threshold()),
                None => eprintln!("No analysis with ID {}", id),
            },
            HistoryCommand::Remove { id } => {
                if service.history().remove(id) {
                    println!("Removed {}", id);
                } else {
                    println!("No analysis with ID {}", id);
                }
            }
            HistoryCommand::Clear => {
                service.history().clear();
                println!("History cleared.");
            }
        },
        Commands::Segments { id } => match service.history().get(id) {
            Some(record) => {
                let segments = service.segments(id).unwrap_or_default();
                println!("{}", render_segments(&record, &segments));
            }
            None => eprintln!("No analysis with ID {}", id),
        },
        Commands::Report { id } => match service.history().get(id) {
            Some(record) => print_report(&record, service.toxicity_threshold()),
            None => eprintln!("No analysis with ID {}", id),
        },
        Commands::Import {
            response,
            text,
            context,
        } => {
            let raw = std::fs::read_to_string(&response)
                .with_context(|| format!("failed to read {}", response.display()))?;
            let raw: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", response.display()))?;
            let conversation = std::fs::read_to_string(&text)
                .with_context(|| format!("failed to read {}", text.display()))?;
            match service.import(&raw, &conversation, &context) {
                Ok(record) => println!("Imported analysis with ID: {}", record.id()),
                Err(e) => eprintln!("Error importing analysis: {}", e),
            }
        }
    }

    Ok(())
}

fn first_line(text: &str) -> String {
    const PREVIEW_CHARS: usize = 60;
    let line = text.trim().lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}

fn print_record(record: &AnalysisRecord, threshold: u8) {
    println!("ID:       {}", record.id());
    println!("Created:  {}", record.created_at().to_rfc3339());
    println!(
        "Score:    {}{}",
        record.score(),
        if exceeds_threshold(record, threshold) {
            "  (above toxicity threshold)"
        } else {
            ""
        }
    );
    if record.safety_alert() {
        println!("SAFETY ALERT: the analyst flagged this conversation.");
    }
    if !record.context().is_empty() {
        println!("Context:  {}", record.context());
    }
    println!();
    println!("{}", record.summary());
    if !record.subtext().is_empty() {
        println!();
        println!("Subtext: {}", record.subtext());
    }

    let fingerprint = record.fingerprint();
    println!();
    println!(
        "Tone: {}  |  dominance {}  |  validation {}",
        fingerprint.tags.join(", "),
        fingerprint.dominance_ratio,
        fingerprint.validation_score
    );

    println!();
    for pattern in record.patterns() {
        let marker = if pattern.severity().is_critical() { "!" } else { "-" };
        println!("{} [{}] {}", marker, pattern.severity(), pattern.name());
        let located = if pattern.range().is_none() {
            " (not found in text)"
        } else {
            ""
        };
        println!("    \"{}\"{}", pattern.citation(), located);
        println!("    {}", pattern.explanation());
        println!("    Countermeasure: {}", pattern.countermeasure());
    }

    let plan = record.plan();
    println!();
    println!("Conclusion: {}", plan.conclusion);
    for advice in &plan.advice {
        println!("  [{}] {}: {}", advice.priority, advice.title, advice.text);
    }
    println!();
    println!("De-escalating reply: {}", plan.replies.deescalating);
    println!("Assertive reply:     {}", plan.replies.assertive);
    println!("Rationale:           {}", plan.replies.rationale);
}

fn print_report(record: &AnalysisRecord, threshold: u8) {
    println!(
        "Score {} (threshold {}): {}",
        record.score(),
        threshold,
        if exceeds_threshold(record, threshold) {
            "toxic"
        } else {
            "below threshold"
        }
    );
    println!();
    for group in patterns_by_severity(record) {
        println!("{} ({})", group.severity, group.patterns.len());
        for pattern in group.patterns {
            println!("  - {}", pattern.name());
        }
    }
    println!();
    for (name, count) in pattern_distribution(record) {
        println!("{:>3}x {}", count, name);
    }
}

/// Brackets each evidence span and appends a numbered legend of the patterns.
fn render_segments(record: &AnalysisRecord, segments: &[Segment]) -> String {
    let mut text = String::new();
    let mut legend = Vec::new();

    for segment in segments {
        match segment.pattern_id() {
            Some(pattern_id) => {
                legend.push(pattern_id);
                text.push_str(&format!("[{}]^{}", segment.text(), legend.len()));
            }
            None => text.push_str(segment.text()),
        }
    }

    if !legend.is_empty() {
        text.push_str("\n\n");
        for (index, pattern_id) in legend.iter().enumerate() {
            if let Some(pattern) = record.pattern(*pattern_id) {
                text.push_str(&format!(
                    "^{} {} ({})\n",
                    index + 1,
                    pattern.name(),
                    pattern.severity()
                ));
            }
        }
    }

    text
}
