mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{load_settings, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;

use backend_bridge::{commands::BackendCommand, runtime};
use controller::events::UiEvent;
use ui::{ComplianceFormApp, PersistedDesktopSettings, StartupConfig};

#[derive(Parser, Debug)]
#[command(name = "compliance-gui", about = "Desktop form for the compliance analysis service")]
struct Args {
    /// Service base URL; overrides saved and file/environment settings.
    #[arg(long)]
    api_url: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let base_settings = load_settings().unwrap_or_else(|err| {
        tracing::warn!("falling back to default client settings: {err:#}");
        ClientSettings::default()
    });

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Compliance and Remediation Generator")
            .with_inner_size([1100.0, 820.0])
            .with_min_inner_size([720.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Compliance and Remediation Generator",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            let persisted = PersistedDesktopSettings::load(cc.storage);
            let startup =
                StartupConfig::resolve(base_settings, persisted.as_ref(), args.api_url.as_deref());
            runtime::launch(cmd_rx, ui_tx, startup.settings.clone());
            Ok(Box::new(ComplianceFormApp::bootstrap(cmd_tx, ui_rx, startup)))
        }),
    )
}
