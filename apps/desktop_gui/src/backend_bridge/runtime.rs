//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{run_submission, AnalysisApi, ClientSettings, FormAction, SubmissionClient};
use crossbeam_channel::{Receiver, Sender};
use shared::error::{ApiError, ErrorCode};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

fn build_api(settings: &ClientSettings) -> Result<Arc<dyn AnalysisApi>, String> {
    SubmissionClient::from_settings(settings)
        .map(|client| Arc::new(client) as Arc<dyn AnalysisApi>)
        .map_err(|err| format!("{err:#}"))
}

/// Completions must reach the form or it stays loading, so this blocks until
/// the UI queue has room.
fn deliver_completion(ui_tx: &Sender<UiEvent>, action: FormAction) {
    if let Err(err) = ui_tx.send(UiEvent::SubmissionFinished(action)) {
        tracing::error!("backend: ui disconnected before submission completed: {err}");
    }
}

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut settings = settings;
            let mut api = match build_api(&settings) {
                Ok(api) => {
                    let _ = ui_tx.try_send(UiEvent::Info(format!(
                        "Ready; service at {}",
                        settings.api_base_url
                    )));
                    Some(api)
                }
                Err(err) => {
                    tracing::error!(url = %settings.api_base_url, "backend: invalid service settings: {err}");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::Settings,
                        err,
                    )));
                    None
                }
            };

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Submit(request) => {
                        let Some(api) = api.clone() else {
                            let message = "missing valid service URL; update it in Service settings";
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                UiErrorContext::Settings,
                                message,
                            )));
                            deliver_completion(
                                &ui_tx,
                                FormAction::SubmissionFailed {
                                    id: request.id,
                                    error: ApiError::new(ErrorCode::Validation, message),
                                },
                            );
                            continue;
                        };
                        tracing::info!(submission = request.id.0, "backend: submit");
                        let ui_tx = ui_tx.clone();
                        // Each submission runs independently; the form keeps only the latest.
                        tokio::spawn(async move {
                            let action = run_submission(api.as_ref(), request).await;
                            let _ = tokio::task::spawn_blocking(move || {
                                deliver_completion(&ui_tx, action)
                            })
                            .await;
                        });
                    }
                    BackendCommand::Configure { api_base_url } => {
                        settings = settings.with_api_base_url(Some(&api_base_url));
                        tracing::info!(url = %settings.api_base_url, "backend: configure");
                        match build_api(&settings) {
                            Ok(rebuilt) => {
                                api = Some(rebuilt);
                                let _ = ui_tx.try_send(UiEvent::Info(format!(
                                    "Service URL set to {}",
                                    settings.api_base_url
                                )));
                            }
                            Err(err) => {
                                tracing::error!("backend: configure failed: {err}");
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Settings,
                                    err,
                                )));
                            }
                        }
                    }
                }
            }
        });
    });
}
