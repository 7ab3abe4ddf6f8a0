use chrono::{DateTime, Local};
use client_core::{
    config::normalize_base_url, reduce, render_form, ClientSettings, DocumentRef, FormAction,
    FormEffect, FormState, ResultSection,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{InputType, PipelineStep, ProcessingMode},
    error::{ApiError, ErrorCode},
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{
    describe_submission_failure, UiError, UiErrorContext, UiEvent,
};
use crate::controller::orchestration::dispatch_backend_command;

pub const SETTINGS_STORAGE_KEY: &str = "compliance_client.desktop_settings";

const ACCENT: egui::Color32 = egui::Color32::from_rgb(250, 204, 21);
const SUBMIT_FILL: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);
const CARD_FILL: egui::Color32 = egui::Color32::from_rgb(26, 26, 26);
const RESULTS_FILL: egui::Color32 = egui::Color32::from_rgb(17, 17, 17);
const CONTROL_WIDTH: f32 = 260.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedDesktopSettings {
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl PersistedDesktopSettings {
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Option<Self> {
        storage.and_then(|storage| {
            storage
                .get_string(SETTINGS_STORAGE_KEY)
                .and_then(|text| serde_json::from_str::<Self>(&text).ok())
        })
    }
}

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub settings: ClientSettings,
}

impl StartupConfig {
    /// Settings file and environment, then the persisted URL, then `--api-url`.
    pub fn resolve(
        base: ClientSettings,
        persisted: Option<&PersistedDesktopSettings>,
        cli_api_url: Option<&str>,
    ) -> Self {
        let persisted_url = persisted.and_then(|p| p.api_base_url.as_deref());
        Self {
            settings: base
                .with_api_base_url(persisted_url)
                .with_api_base_url(cli_api_url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

pub struct ComplianceFormApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    form: FormState,

    api_base_url: String,
    api_url_draft: String,

    status: String,
    status_banner: Option<StatusBanner>,
    last_result_at: Option<DateTime<Local>>,
}

impl ComplianceFormApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let api_base_url = startup.settings.api_base_url;
        Self {
            cmd_tx,
            ui_rx,
            form: FormState::new(),
            api_url_draft: api_base_url.clone(),
            api_base_url,
            status: "Backend worker starting...".to_string(),
            status_banner: None,
            last_result_at: None,
        }
    }

    fn apply(&mut self, action: FormAction) {
        for effect in reduce(&mut self.form, action) {
            match effect {
                FormEffect::Dispatch(request) => {
                    let id = request.id;
                    self.status = format!(
                        "Submitting {} to {}...",
                        request.document.filename, request.endpoint
                    );
                    self.status_banner = None;
                    let queued = dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::Submit(request),
                        &mut self.status,
                    );
                    if !queued {
                        let message = self.status.clone();
                        self.apply(FormAction::SubmissionFailed {
                            id,
                            error: ApiError::new(ErrorCode::Unreachable, message.clone()),
                        });
                        self.status_banner = Some(StatusBanner {
                            severity: StatusBannerSeverity::Error,
                            message,
                        });
                    }
                }
                FormEffect::Warn(message) => {
                    self.status = message.clone();
                    self.status_banner = Some(StatusBanner {
                        severity: StatusBannerSeverity::Warning,
                        message,
                    });
                }
            }
        }
    }

    fn handle_submission_finished(&mut self, action: FormAction) {
        let id = match &action {
            FormAction::SubmissionSucceeded { id, .. } | FormAction::SubmissionFailed { id, .. } => {
                *id
            }
            _ => return self.apply(action),
        };
        let is_latest = self.form.latest_submission == Some(id);
        self.apply(action);
        if !is_latest {
            tracing::debug!(submission = id.0, "ignored superseded submission");
            return;
        }

        match self.form.last_error.clone() {
            Some(error) => {
                let ui_error = UiError::from_api_error(UiErrorContext::Submission, &error);
                self.status = format!(
                    "{} error: {}",
                    ui_error.category().label(),
                    ui_error.message()
                );
                self.status_banner = Some(StatusBanner {
                    severity: StatusBannerSeverity::Error,
                    message: describe_submission_failure(&error),
                });
            }
            None => {
                let now = Local::now();
                self.last_result_at = Some(now);
                self.status = format!("Result received at {}", now.format("%H:%M:%S"));
            }
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::SubmissionFinished(action) => self.handle_submission_finished(action),
                UiEvent::Error(err) => {
                    self.status = format!("{} error: {}", err.category().label(), err.message());
                    if matches!(
                        err.context(),
                        UiErrorContext::BackendStartup | UiErrorContext::Settings
                    ) {
                        self.status_banner = Some(StatusBanner {
                            severity: StatusBannerSeverity::Error,
                            message: self.status.clone(),
                        });
                    }
                }
            }
        }
    }

    fn apply_api_url_draft(&mut self) {
        let normalized = normalize_base_url(&self.api_url_draft);
        self.api_url_draft = normalized.clone();
        if normalized == self.api_base_url {
            return;
        }
        let queued = dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Configure {
                api_base_url: normalized.clone(),
            },
            &mut self.status,
        );
        if queued {
            self.api_base_url = normalized;
        }
    }

    fn pick_document(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Upload BRD Document")
            .pick_file()
        {
            self.apply(FormAction::SelectDocument(DocumentRef::from_path(path)));
        }
    }

    fn pick_policy(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Upload Policy Document (Optional)")
            .pick_file()
        {
            self.apply(FormAction::SelectPolicy(DocumentRef::from_path(path)));
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
                StatusBannerSeverity::Warning => (
                    egui::Color32::from_rgb(102, 84, 28),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(190, 160, 60)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
            ui.add_space(8.0);
        }
    }

    fn show_mode_selector(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for mode in [ProcessingMode::Pipeline, ProcessingMode::Custom] {
                let selected = self.form.mode == mode;
                if ui.radio(selected, mode.label()).clicked() && !selected {
                    self.apply(FormAction::SetMode(mode));
                }
                ui.add_space(24.0);
            }
        });
    }

    fn show_file_pickers(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.vertical(|ui| {
                ui.label("Upload BRD Document:");
                ui.horizontal(|ui| {
                    if ui.button("Choose file...").clicked() {
                        self.pick_document();
                    }
                    match &self.form.document {
                        Some(doc) => ui.label(doc.filename.as_str()),
                        None => ui.weak("No file chosen"),
                    };
                });
            });
            ui.add_space(32.0);
            ui.vertical(|ui| {
                ui.label("Upload Policy Document (Optional):");
                ui.horizontal(|ui| {
                    if ui.button("Choose file...").clicked() {
                        self.pick_policy();
                    }
                    let policy_name = self.form.policy.as_ref().map(|p| p.filename.clone());
                    match policy_name {
                        Some(name) => {
                            ui.label(name);
                            if ui.small_button("Clear").clicked() {
                                self.apply(FormAction::ClearPolicy);
                            }
                        }
                        None => {
                            ui.weak("No file chosen");
                        }
                    }
                });
            });
        });
    }

    fn show_dropdowns(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let input_text = self
                .form
                .input_type
                .map(InputType::label)
                .unwrap_or("File Type");
            egui::ComboBox::from_id_salt("input_type")
                .selected_text(input_text)
                .width(CONTROL_WIDTH)
                .show_ui(ui, |ui| {
                    for input_type in InputType::ALL {
                        let selected = self.form.input_type == Some(input_type);
                        if ui.selectable_label(selected, input_type.label()).clicked() {
                            self.apply(FormAction::SetInputType(input_type));
                        }
                    }
                });

            if self.form.mode == ProcessingMode::Custom {
                ui.add_space(32.0);
                let step_text = self
                    .form
                    .step
                    .map(PipelineStep::label)
                    .unwrap_or("Select Agent Step");
                egui::ComboBox::from_id_salt("agent_step")
                    .selected_text(step_text)
                    .width(CONTROL_WIDTH)
                    .show_ui(ui, |ui| {
                        for step in PipelineStep::ALL {
                            let selected = self.form.step == Some(step);
                            if ui.selectable_label(selected, step.label()).clicked() {
                                self.apply(FormAction::SetStep(step));
                            }
                        }
                    });
            }
        });
    }

    fn show_submit_button(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            let label = if self.form.loading {
                "Running..."
            } else {
                "Start Process"
            };
            let button = egui::Button::new(
                egui::RichText::new(label)
                    .strong()
                    .color(egui::Color32::WHITE),
            )
            .fill(SUBMIT_FILL)
            .min_size(egui::vec2(160.0, 36.0));
            if ui.add(button).clicked() {
                self.apply(FormAction::Submit);
            }
            if !self.form.has_document() {
                ui.small(egui::RichText::new("Select a BRD document to start.").weak());
            }
        });
    }

    fn show_results(&self, ui: &mut egui::Ui) {
        let sections = render_form(&self.form);
        if sections.is_empty() {
            return;
        }

        egui::Frame::NONE
            .fill(RESULTS_FILL)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::same(16))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                for section in &sections {
                    ui.label(
                        egui::RichText::new(section.title())
                            .color(ACCENT)
                            .strong()
                            .size(20.0),
                    );
                    match section {
                        ResultSection::Summary(text) => {
                            ui.label(egui::RichText::new(text).monospace());
                        }
                        ResultSection::ComplianceResults(lines) => {
                            for line in lines {
                                ui.horizontal_wrapped(|ui| {
                                    ui.label(egui::RichText::new(&line.rule).strong());
                                    ui.label("–");
                                    ui.label(egui::RichText::new(&line.status).italics());
                                    if let Some(matched) = line.matched_text() {
                                        ui.label(matched);
                                    }
                                });
                            }
                        }
                        ResultSection::NfrRules(items)
                        | ResultSection::RemediationSuggestions(items) => {
                            for item in items {
                                ui.label(item.as_str());
                            }
                        }
                    }
                    ui.add_space(12.0);
                }
            });
    }

    fn show_service_settings(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Service settings")
            .id_salt("service_settings")
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label("API base URL");
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.api_url_draft)
                            .hint_text(client_core::config::DEFAULT_API_BASE_URL)
                            .desired_width(CONTROL_WIDTH * 1.5),
                    );
                    let enter_pressed =
                        response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("Apply").clicked() || enter_pressed {
                        self.apply_api_url_draft();
                    }
                });
            });
    }

    fn show_form(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    egui::Frame::NONE
                        .fill(CARD_FILL)
                        .corner_radius(12.0)
                        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(51, 51, 51)))
                        .inner_margin(egui::Margin::symmetric(24, 20))
                        .show(ui, |ui| {
                            ui.set_width(ui.available_width());
                            ui.vertical_centered(|ui| {
                                ui.label(
                                    egui::RichText::new("COMPLIANCE AND REMEDIATION GENERATOR")
                                        .color(ACCENT)
                                        .strong()
                                        .size(28.0),
                                );
                            });
                            ui.separator();
                            ui.add_space(12.0);

                            self.show_status_banner(ui);
                            self.show_mode_selector(ui);
                            ui.add_space(16.0);
                            self.show_file_pickers(ui);
                            ui.add_space(16.0);
                            self.show_dropdowns(ui);
                            ui.add_space(20.0);
                            self.show_submit_button(ui);
                            ui.add_space(20.0);
                            self.show_results(ui);
                            ui.add_space(12.0);
                            self.show_service_settings(ui);

                            ui.separator();
                            ui.horizontal_wrapped(|ui| {
                                ui.small("Status:");
                                ui.small(egui::RichText::new(&self.status).weak());
                                if let Some(at) = self.last_result_at {
                                    ui.small(
                                        egui::RichText::new(format!(
                                            "(last result {})",
                                            at.format("%H:%M:%S")
                                        ))
                                        .weak(),
                                    );
                                }
                            });
                        });
                });
        });
    }
}

impl eframe::App for ComplianceFormApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.show_form(ctx);

        if self.form.loading {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedDesktopSettings {
            api_base_url: Some(self.api_base_url.clone()),
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
