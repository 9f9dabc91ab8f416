//! cerebro CLI: a reasoning agent grounded in memory and consciousness.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use cerebro::config::CerebroConfig;
use cerebro::coordinator::{ANSWER_ACTION, FeedbackCoordinator};
use cerebro::feedback::Feedback;
use cerebro::graph::NodeKind;
use cerebro::graph::concept::ConceptStore;
use cerebro::language::LexicalLanguageService;
use cerebro::normalize::normalize_key;
use cerebro::paths::CerebroPaths;

const EXIT_WORDS: &[&str] = &["salir", "exit"];

#[derive(Parser)]
#[command(name = "cerebro", version, about = "Reasoning agent with memory, consciousness and feedback")]
struct Cli {
    /// Directory for the persisted graphs, policy table and feedback log.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (TOML). Defaults to $XDG_CONFIG_HOME/cerebro/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: ask, answer, give feedback.
    Chat,

    /// Answer a single query.
    Ask {
        /// The query, e.g. "tigre es carnivoro".
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Feedback to learn from right away.
        #[arg(long, value_enum)]
        feedback: Option<FeedbackArg>,
    },

    /// Look for a relation between two concepts.
    Relate { a: String, b: String },

    /// Print the shortest chain between two known concepts.
    Path { a: String, b: String },

    /// Teach a relation between two concepts.
    Remember {
        a: String,
        b: String,
        /// Weight used when either concept is new.
        #[arg(long, default_value = "1.0")]
        weight: f64,
    },

    /// Strengthen (or, with a negative delta, weaken) an existing relation.
    Reinforce {
        a: String,
        b: String,
        #[arg(long, default_value = "0.5", allow_hyphen_values = true)]
        delta: f64,
    },

    /// Link the keywords of a text to each other.
    Learn {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Refuse to respond to queries containing a term.
    Restrict { term: String },

    /// Set an identity attribute.
    Identity { attribute: String, value: String },

    /// Replay the feedback log onto the concept graph.
    Reflect,

    /// Display the concept and consciousness graphs.
    Show,

    /// Show the learned values for a query.
    Policy {
        #[arg(required = true, num_args = 1..)]
        state: Vec<String>,
    },

    /// Print the effective configuration.
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedbackArg {
    Useful,
    NotUseful,
}

impl From<FeedbackArg> for Feedback {
    fn from(arg: FeedbackArg) -> Self {
        match arg {
            FeedbackArg::Useful => Feedback::Useful,
            FeedbackArg::NotUseful => Feedback::NotUseful,
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Config = cli.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let mut agent = FeedbackCoordinator::open(config, Box::new(LexicalLanguageService::new()))?;

    match cli.command {
        Commands::Chat => chat(&mut agent)?,

        Commands::Ask { query, feedback } => {
            let interaction = agent.handle_query(&query.join(" "));
            if interaction.caution {
                println!("(Trying to improve on my earlier answers here.)");
            }
            println!("{}", interaction.answer);
            if let Some(feedback) = feedback {
                if let Some(report) = agent.submit_feedback(interaction, feedback.into()) {
                    println!("Learned: value {:+.3}, impact {:+.2}", report.q_value, report.decision_impact);
                }
            }
        }

        Commands::Relate { a, b } => println!("{}", agent.relate(&a, &b)),

        Commands::Path { a, b } => {
            let path = agent.path(&a, &b)?;
            println!("{}", path.join(" -> "));
        }

        Commands::Remember { a, b, weight } => {
            let total = agent.remember(&a, &b, weight);
            println!("'{a}' <-> '{b}': weight {total:.2}");
        }

        Commands::Reinforce { a, b, delta } => {
            let total = agent.reinforce(&a, &b, delta)?;
            println!("'{a}' <-> '{b}': weight {total:.2}");
        }

        Commands::Learn { text } => {
            let pairs = agent.learn_text(&text.join(" "));
            println!("Linked {pairs} keyword pairs.");
        }

        Commands::Restrict { term } => {
            if agent.restrict(&term) {
                println!("Restricted: '{term}'");
            } else {
                miette::bail!("empty restriction term");
            }
        }

        Commands::Identity { attribute, value } => {
            agent.record_identity(&attribute, &value);
            println!("Identity '{attribute}' = \"{value}\"");
        }

        Commands::Reflect => {
            let report = agent.reflect();
            println!(
                "Replayed {} entries: {} edges adjusted, {} without relation.",
                report.replayed, report.adjusted, report.skipped
            );
            for entry in &report.top_decisions {
                println!("  {} ({:+.2})", entry.decision, entry.impact);
            }
        }

        Commands::Show => show(&agent),

        Commands::Policy { state } => {
            let state = normalize_key(&state.join(" "));
            match agent.policy().values(&state) {
                Some(values) => {
                    println!("Policy for \"{state}\":");
                    for (action, value) in values {
                        println!("  {action}: {value:+.4}");
                    }
                }
                None => println!(
                    "No values for \"{state}\" ({ANSWER_ACTION} = {:+.4}).",
                    agent.policy().value_of(&state, ANSWER_ACTION)
                ),
            }
        }

        // Printed before the stores were opened.
        Commands::Config => {}
    }

    agent.flush()?;
    Ok(())
}

/// Config file, then environment, then command-line flags, then XDG defaults.
fn resolve_config(cli: &Cli) -> Result<CerebroConfig> {
    let xdg = CerebroPaths::resolve().ok();
    let config_file = cli
        .config
        .clone()
        .or_else(|| xdg.as_ref().map(CerebroPaths::config_file));
    let mut config = match config_file {
        Some(path) => CerebroConfig::load(&path)?,
        None => CerebroConfig::default(),
    }
    .apply_env();

    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if config.data_dir.is_none() {
        config.data_dir = xdg.map(|paths| paths.data_dir);
    }
    Ok(config)
}

fn chat(agent: &mut FeedbackCoordinator) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = std::io::stdout();

    println!("CEREBRO: ask me something ('salir' to quit).");
    loop {
        print!("\n> ");
        stdout.flush().into_diagnostic()?;
        let Some(line) = lines.next() else { break };
        let query = line.into_diagnostic()?;
        let query = query.trim();
        if query.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
            break;
        }

        let interaction = agent.handle_query(query);
        if interaction.caution {
            println!("(Trying to improve on my earlier answers here.)");
        }
        println!("CEREBRO: {}", interaction.answer);
        if interaction.answer.is_refusal() {
            continue;
        }

        print!("Was this useful? (yes/no): ");
        stdout.flush().into_diagnostic()?;
        let Some(reply) = lines.next() else { break };
        let feedback = Feedback::from_reply(&reply.into_diagnostic()?);
        if let Some(report) = agent.submit_feedback(interaction, feedback) {
            if !report.reviewed.is_empty() {
                println!("Adjusting behavior after negative feedback.");
            }
            if let Some(reflection) = report.reflection {
                println!(
                    "Reflected on {} past interactions ({} relations adjusted).",
                    reflection.replayed, reflection.adjusted
                );
            }
        }
    }
    println!("Saving and exiting.");
    Ok(())
}

fn show(agent: &FeedbackCoordinator) {
    let concepts = agent.concepts().graph();
    println!(
        "Concept graph: {} nodes, {} edges",
        concepts.node_count(),
        concepts.edge_count()
    );
    for edge in concepts.edges() {
        println!("  {} <-> {} ({:.2})", edge.source, edge.target, edge.weight);
    }

    let consciousness = agent.consciousness().graph();
    println!("Consciousness: {} nodes", consciousness.node_count());
    for kind in [NodeKind::Attribute, NodeKind::Decision, NodeKind::Restriction] {
        for node in consciousness.nodes_of_kind(kind) {
            match (&node.value, node.impact) {
                (Some(value), _) => println!("  [{kind}] {} = \"{value}\"", node.key),
                (None, Some(impact)) => println!("  [{kind}] {} ({impact:+.2})", node.key),
                (None, None) => println!("  [{kind}] {}", node.key),
            }
        }
    }
}
