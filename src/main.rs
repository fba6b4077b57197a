use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use flowgate_rs::flowgate::config::RunnerConfig;
use flowgate_rs::flowgate::process::executor::ProcessExecutor;
use flowgate_rs::flowgate::process::loader::ProcessLoader;
use flowgate_rs::flowgate::process::registry::ProcessRegistry;
use flowgate_rs::flowgate::process::validate::validate;
use flowgate_rs::sdk::review::{AutoApproveReviewer, ConsoleReviewer, Reviewer};
use flowgate_rs::sdk::schema::SchemaPolicy;

use serde_json::Value;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RunnerKind {
    /// Synthesize outputs from each step's schema, no network
    Echo,
    /// Prompt an OpenAI-compatible model
    Agent,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a process definition
    Run {
        /// Path to the process YAML file
        #[arg(short, long)]
        file: String,

        /// Inputs as inline JSON, or @path to a JSON file
        #[arg(short, long)]
        input: Option<String>,

        /// Which step runner executes the tasks
        #[arg(short, long, value_enum, default_value_t = RunnerKind::Echo)]
        runner: RunnerKind,

        /// Override MODEL_NAME for the agent runner
        #[arg(short, long)]
        model: Option<String>,

        /// Override FLOWGATE_SCHEMA_POLICY (ignore, warn, enforce)
        #[arg(long)]
        schema_policy: Option<SchemaPolicy>,

        /// Stop at checkpoints and wait for Enter instead of auto-approving
        #[arg(long)]
        interactive: bool,

        /// Also write the JSON outcome to this file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Parse and check a process definition without running it
    Validate {
        /// Path to the process YAML file
        #[arg(short, long)]
        file: String,
    },
    /// List the process definitions in a directory
    List {
        /// Directory containing process YAML files
        #[arg(short, long, default_value = "demos")]
        dir: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Run {
            file,
            input,
            runner,
            model,
            schema_policy,
            interactive,
            output,
        } => {
            let mut config = RunnerConfig::from_env()?;
            if let Some(model) = model {
                config.model_name = model;
            }
            if let Some(policy) = schema_policy {
                config.schema_policy = policy;
            }

            let def = ProcessLoader::new().load_process(&file)?;
            let inputs = match input {
                Some(arg) => ProcessLoader::load_inputs(&arg)?,
                None => Value::Null,
            };

            let step_runner = match runner {
                RunnerKind::Echo => config.echo_runner(),
                RunnerKind::Agent => config.agent_runner()?,
            };
            let reviewer: Arc<dyn Reviewer> = if interactive {
                Arc::new(ConsoleReviewer)
            } else {
                Arc::new(AutoApproveReviewer)
            };

            log::info!(
                "Running process '{}' with {:?} runner, schema policy {:?}",
                def.name,
                runner,
                config.schema_policy
            );

            let executor = ProcessExecutor::new(step_runner)
                .with_reviewer(reviewer)
                .with_schema_policy(config.schema_policy);
            let outcome = executor.run(&def, inputs).await?;

            let rendered = serde_json::to_string_pretty(&outcome)?;
            if let Some(path) = output {
                std::fs::write(&path, &rendered)?;
                log::info!("Wrote outcome to {}", path);
            }
            println!("{}", rendered);

            if !outcome.is_success() {
                std::process::exit(2);
            }
        }
        Commands::Validate { file } => {
            let def = ProcessLoader::new().load_process(&file)?;
            validate(&def)?;
            println!("{}: {} steps, OK", def.name, def.steps.len());
        }
        Commands::List { dir } => {
            let registry = ProcessRegistry::new();
            let count = registry.load_dir(&dir).await?;
            if count == 0 {
                println!("No process definitions found in {}", dir);
            }
            for def in registry.list().await {
                println!("{:<32} {}", def.name, def.description);
            }
        }
    }

    Ok(())
}
