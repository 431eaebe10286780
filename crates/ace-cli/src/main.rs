//! ACE - Agentic Context Engineering CLI
//!
//! The `ace` command runs one task through the Generator → Reflector →
//! Curator pipeline.
//!
//! ## Commands
//!
//! - `run`: Execute the standard team against an OpenAI-compatible endpoint
//! - `prompt`: Print the Generator request without calling any provider

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ace_core::{
    CompletionProvider, Context as PipelineContext, GeneratorPrompt, PipelineConfig, Playbook,
    PromptProvider, Task, TeamManager, TemplatePrompts, EMPTY_PLACEHOLDER, METRICS,
};
use ace_openai::{OpenAiClient, OpenAiConfig};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "ace")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Agentic Context Engineering pipeline runner", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Generator, Reflector and Curator over one task
    Run {
        #[command(flatten)]
        task: TaskArgs,

        /// Cap on concurrent completion calls per stage
        #[arg(long, env = "ACE_MAX_CONCURRENT_CALLS")]
        max_concurrent: Option<usize>,

        /// Model name (default: OPENAI_MODEL or gpt-4.1-mini)
        #[arg(long)]
        model: Option<String>,
    },

    /// Render the Generator request for a task
    Prompt {
        #[command(flatten)]
        task: TaskArgs,
    },
}

#[derive(Args)]
struct TaskArgs {
    /// Task query text
    #[arg(short, long, conflicts_with = "query_file", required_unless_present = "query_file")]
    query: Option<String>,

    /// Read the task query from a file
    #[arg(long)]
    query_file: Option<PathBuf>,

    /// Playbook JSON file: an array of {"id", "content"} entries
    #[arg(short, long)]
    playbook: Option<PathBuf>,

    /// Reference answer handed to the Reflector
    #[arg(long)]
    ground_truth: Option<String>,

    /// Execution feedback handed to the Reflector
    #[arg(long)]
    feedback: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ace_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            task,
            max_concurrent,
            model,
        } => cmd_run(&task, max_concurrent, model.as_deref()).await,
        Commands::Prompt { task } => cmd_prompt(&task),
    }
}

fn load_playbook(path: &Path) -> Result<Playbook> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read playbook file: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse playbook as JSON: {:?}", path))
}

fn load_task(args: &TaskArgs) -> Result<Task> {
    let query = match (&args.query, &args.query_file) {
        (Some(query), _) => query.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file: {:?}", path))?,
        (None, None) => anyhow::bail!("Either --query or --query-file is required"),
    };
    if query.trim().is_empty() {
        anyhow::bail!("Task query is empty");
    }

    let playbook = match &args.playbook {
        Some(path) => load_playbook(path)?,
        None => Playbook::default(),
    };

    let mut task = Task::new(query, playbook);
    if let Some(ground_truth) = &args.ground_truth {
        task = task.with_ground_truth(ground_truth.as_str());
    }
    if let Some(feedback) = &args.feedback {
        task = task.with_environment_feedback(feedback.as_str());
    }
    Ok(task)
}

async fn run_pipeline(
    task: &Task,
    provider: Arc<dyn CompletionProvider>,
    config: &PipelineConfig,
) -> Result<PipelineContext> {
    let team = TeamManager::standard(provider, Arc::new(TemplatePrompts::new()), config);
    let context = team
        .run(task)
        .await
        .with_context(|| format!("Pipeline run failed for team {}", team.name()))?;
    METRICS.flush();
    Ok(context)
}

async fn cmd_run(args: &TaskArgs, max_concurrent: Option<usize>, model: Option<&str>) -> Result<()> {
    let task = load_task(args)?;

    let mut config = PipelineConfig::from_env();
    if let Some(max_concurrent) = max_concurrent {
        config = config.with_max_concurrent(max_concurrent);
    }

    let mut openai = OpenAiConfig::from_env();
    if let Some(model) = model {
        openai = openai.with_model(model);
    }
    if openai.api_key.is_none() {
        anyhow::bail!("OPENAI_API_KEY is not set (export it or add it to .env)");
    }
    info!(model = %openai.model, team = %config.team_name, "Starting pipeline");

    let client = OpenAiClient::new(openai).context("Failed to build OpenAI client")?;
    let context = run_pipeline(&task, Arc::new(client), &config).await?;

    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

fn render_generator_prompt(task: &Task) -> Result<String> {
    let playbook = task.playbook.to_prompt_text()?;
    let request = TemplatePrompts::new().generator_prompt(&GeneratorPrompt {
        playbook: &playbook,
        reflection: EMPTY_PLACEHOLDER,
        question: &task.query,
        context: EMPTY_PLACEHOLDER,
    })?;
    Ok(request)
}

fn cmd_prompt(args: &TaskArgs) -> Result<()> {
    let task = load_task(args)?;
    println!("{}", render_generator_prompt(&task)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ace_core::fakes::ScriptedProvider;
    use ace_core::StageName;
    use clap::CommandFactory;

    fn args(query: Option<&str>) -> TaskArgs {
        TaskArgs {
            query: query.map(str::to_string),
            query_file: None,
            playbook: None,
            ground_truth: None,
            feedback: None,
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_requires_a_query() {
        assert!(Cli::try_parse_from(["ace", "run"]).is_err());
        assert!(Cli::try_parse_from(["ace", "run", "-q", "x", "--query-file", "f"]).is_err());
        assert!(Cli::try_parse_from(["ace", "--json", "run", "-q", "x"]).is_ok());
    }

    #[test]
    fn test_load_task_reads_playbook_and_query_files() {
        let dir = tempfile::tempdir().unwrap();
        let playbook_path = dir.path().join("playbook.json");
        std::fs::write(
            &playbook_path,
            r#"[{"id": "002", "content": "check weather"},
                {"id": "003 formulas_and_calculations", "content": "average = sum/count"}]"#,
        )
        .unwrap();
        let query_path = dir.path().join("query.txt");
        std::fs::write(&query_path, "compute average of numeric strings").unwrap();

        let task = load_task(&TaskArgs {
            query: None,
            query_file: Some(query_path),
            playbook: Some(playbook_path),
            ground_truth: Some("4.5".to_string()),
            feedback: None,
        })
        .unwrap();

        assert_eq!(task.query, "compute average of numeric strings");
        assert_eq!(task.playbook.len(), 2);
        assert!(task.playbook.get("003 formulas_and_calculations").is_some());
        assert_eq!(task.ground_truth_or_placeholder(), "4.5");
        assert_eq!(task.environment_feedback_or_placeholder(), "empty");
    }

    #[test]
    fn test_load_task_rejects_bad_playbook() {
        let dir = tempfile::tempdir().unwrap();
        let playbook_path = dir.path().join("playbook.json");
        std::fs::write(&playbook_path, r#"{"id": "not an array"}"#).unwrap();

        let mut task_args = args(Some("q"));
        task_args.playbook = Some(playbook_path);
        let err = load_task(&task_args).unwrap_err();
        assert!(err.to_string().contains("Failed to parse playbook"));
    }

    #[test]
    fn test_load_task_rejects_blank_query() {
        assert!(load_task(&args(Some("   "))).is_err());
    }

    #[test]
    fn test_prompt_embeds_query_and_playbook() {
        let task = Task::new(
            "compute average",
            Playbook::new(vec![ace_core::PlaybookEntry::new("002", "check weather")]),
        );
        let prompt = render_generator_prompt(&task).unwrap();
        assert!(prompt.contains("compute average"));
        assert!(prompt.contains("check weather"));
    }

    #[tokio::test]
    async fn test_run_pipeline_with_fake_provider() {
        let task = load_task(&args(Some("compute average"))).unwrap();
        let context = run_pipeline(
            &task,
            Arc::new(ScriptedProvider::canned()),
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            context.keys(),
            &[StageName::Generator, StageName::Reflector, StageName::Curator]
        );
        let rendered = serde_json::to_string_pretty(&context).unwrap();
        assert!(rendered.contains("\"final_answer\""));
    }

    #[tokio::test]
    async fn test_run_pipeline_surfaces_provider_failure() {
        let task = load_task(&args(Some("compute average"))).unwrap();
        let err = run_pipeline(
            &task,
            Arc::new(ScriptedProvider::failing(
                ace_core::ProviderError::Authentication("bad key".to_string()),
            )),
            &PipelineConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Pipeline run failed"));
    }
}
