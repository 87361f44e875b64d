use clap::{Parser, ValueEnum};
use console::style;
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use eve::agent::Agent;
use eve::errors::{AgentError, AgentResult};
use eve::project::{FileProjectStore, ProjectStore};
use eve::prompt::stdio::StdioPrompt;
use eve::providers::anthropic::ANTHROPIC_MODELS;
use eve::providers::factory::{get_provider, ProviderOverrides, ProviderType};
use eve::providers::gemini::GEMINI_MODELS;
use eve::providers::openai::OPENAI_MODELS;
use eve::providers::types::message::Conversation;
use eve::session::session_file::read_messages;
use eve::session::Session;
use eve::tools::builtin_registry;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Model backend (can also be set via LLM_PROVIDER, defaults to anthropic)
    #[arg(short, long, value_enum)]
    provider: Option<ProviderType>,

    /// Model to use (can also be set via LLM_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the selected provider, overrides its environment variable
    #[arg(long)]
    api_key: Option<String>,

    /// Write the conversation here as JSON lines after every turn
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Load the transcript before starting
    #[arg(long, requires = "transcript")]
    resume: bool,

    /// Directory for the project store (can also be set via EVE_PROJECT_DIR)
    #[arg(long)]
    project_dir: Option<PathBuf>,

    /// Print the models known for the provider and exit
    #[arg(long)]
    list_models: bool,
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        if let AgentError::Configuration(_) = err {
            eprintln!("{}", style(&err).red());
            eprintln!("{}", configuration_help());
        } else {
            eprintln!("{} {}", style("Error:").red().bold(), err);
        }
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "eve=debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> AgentResult<()> {
    let provider_type = match cli.provider {
        Some(provider_type) => provider_type,
        None => ProviderType::from_env()?,
    };

    if cli.list_models {
        let models = match provider_type {
            ProviderType::Anthropic => ANTHROPIC_MODELS,
            ProviderType::OpenAi => OPENAI_MODELS,
            ProviderType::Gemini => GEMINI_MODELS,
        };
        println!("{}:", style(provider_type).bold());
        for model in models {
            println!("  {}", model);
        }
        return Ok(());
    }

    let overrides = ProviderOverrides {
        model: cli.model,
        api_key: cli.api_key,
    };
    let provider = get_provider(provider_type, &overrides)?;

    let store = open_project_store(cli.project_dir)?;
    let registry = builtin_registry(store)?;

    let conversation = match (&cli.transcript, cli.resume) {
        (Some(path), true) if path.exists() => {
            let messages = read_messages(path)
                .map_err(|e| AgentError::InvalidConversation(format!("{:#}", e)))?;
            Conversation::from_messages(messages)?
        }
        _ => Conversation::new(),
    };

    let agent = Agent::new(provider, registry);
    let mut session =
        Session::new(agent, Box::new(StdioPrompt::stdio())).with_conversation(conversation);
    if let Some(path) = cli.transcript {
        session = session.with_transcript(path);
    }
    session.start()
}

fn open_project_store(flag: Option<PathBuf>) -> AgentResult<Option<Arc<dyn ProjectStore>>> {
    let dir = flag.or_else(|| {
        env::var("EVE_PROJECT_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    });
    match dir {
        Some(dir) => {
            let store: Arc<dyn ProjectStore> = Arc::new(
                FileProjectStore::open(&dir)
                    .map_err(|e| AgentError::Configuration(format!("{:#}", e)))?,
            );
            Ok(Some(store))
        }
        None => Ok(None),
    }
}

fn configuration_help() -> String {
    let mut help = String::from("\nEnvironment variables:\n");
    push_var(&mut help, "LLM_PROVIDER", "anthropic, openai or gemini (default: anthropic)");
    push_var(&mut help, "LLM_MODEL", "model name for the selected provider");
    push_var(&mut help, "LLM_MAX_TOKENS", "response token limit");
    for provider_type in ProviderType::value_variants() {
        let name = provider_type.as_str();
        let key_help = format!("required for {}", name);
        let host_help = format!("optional API host for {}", name);
        push_var(&mut help, provider_type.api_key_var(), &key_help);
        push_var(&mut help, provider_type.host_var(), &host_help);
    }
    push_var(&mut help, "EVE_PROJECT_DIR", "optional project store directory");
    help
}

fn push_var(help: &mut String, var: &str, description: &str) {
    help.push_str(&format!("  {:<18} {}\n", var, description));
}
