use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    load_settings, reduce, render::format_plain, render_form, run_submission, DocumentRef,
    FormAction, FormEffect, FormState, SubmissionClient,
};
use shared::domain::{InputType, PipelineStep, ProcessingMode};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "compliance", about = "Submit a BRD to the compliance analysis service")]
struct Cli {
    /// Service base URL; overrides compliance_client.toml and the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline, or a single step when --step is given.
    Submit {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        policy: Option<PathBuf>,
        #[arg(long, value_enum)]
        input_type: Option<InputTypeArg>,
        #[arg(long, value_enum)]
        step: Option<StepArg>,
        /// Print the raw service response instead of rendered sections.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective client settings.
    Settings,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputTypeArg {
    Raw,
    Processed,
}

impl From<InputTypeArg> for InputType {
    fn from(value: InputTypeArg) -> Self {
        match value {
            InputTypeArg::Raw => InputType::Raw,
            InputTypeArg::Processed => InputType::Processed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StepArg {
    Summarize,
    Generate,
    Validate,
    Remediate,
}

impl From<StepArg> for PipelineStep {
    fn from(value: StepArg) -> Self {
        match value {
            StepArg::Summarize => PipelineStep::Summarize,
            StepArg::Generate => PipelineStep::Generate,
            StepArg::Validate => PipelineStep::Validate,
            StepArg::Remediate => PipelineStep::Remediate,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = load_settings()?.with_api_base_url(cli.api_url.as_deref());

    match cli.command {
        Command::Settings => {
            println!("api_base_url = {}", settings.api_base_url);
            match settings.request_timeout_secs {
                Some(secs) => println!("request_timeout_secs = {secs}"),
                None => println!("request_timeout_secs = (none)"),
            }
        }
        Command::Submit {
            file,
            policy,
            input_type,
            step,
            json,
        } => {
            let client = SubmissionClient::from_settings(&settings)?;
            let mut state = FormState::new();
            reduce(&mut state, FormAction::SelectDocument(DocumentRef::from_path(&file)));
            if let Some(policy) = policy {
                reduce(&mut state, FormAction::SelectPolicy(DocumentRef::from_path(&policy)));
            }
            if let Some(input_type) = input_type {
                reduce(&mut state, FormAction::SetInputType(input_type.into()));
            }
            if let Some(step) = step {
                reduce(&mut state, FormAction::SetMode(ProcessingMode::Custom));
                reduce(&mut state, FormAction::SetStep(step.into()));
            }

            for effect in reduce(&mut state, FormAction::Submit) {
                match effect {
                    FormEffect::Dispatch(request) => {
                        info!(
                            endpoint = %request.endpoint,
                            document = %request.document.filename,
                            url = %client.base_url(),
                            "submitting"
                        );
                        let outcome = run_submission(&client, request).await;
                        reduce(&mut state, outcome);
                    }
                    FormEffect::Warn(message) => bail!(message),
                }
            }

            if let Some(err) = &state.last_error {
                error!(code = err.code.label(), "submission failed");
                bail!("{} error: {}", err.code.label(), err.message);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&state.output)?);
            } else {
                let sections = render_form(&state);
                if sections.is_empty() {
                    println!("The service returned no displayable sections.");
                } else {
                    print!("{}", format_plain(&sections));
                }
            }
        }
    }

    Ok(())
}
