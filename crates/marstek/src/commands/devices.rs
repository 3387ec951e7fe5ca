//! `marstek devices` -- one-shot fetch of the device list.

use std::time::Duration;

use tabled::Tabled;

use marstek_core::{Coordinator, Device, MetricValue};

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "SoC %")]
    soc: String,
    #[tabled(rename = "Charge W")]
    charge: String,
    #[tabled(rename = "Discharge W")]
    discharge: String,
    #[tabled(rename = "Load W")]
    load: String,
    #[tabled(rename = "Reported")]
    reported: String,
}

fn metric_cell(device: &Device, key: &str) -> String {
    device
        .metric(key)
        .map_or_else(|| "-".into(), MetricValue::to_string)
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone().unwrap_or_default(),
            serial: d.serial.clone().unwrap_or_default(),
            soc: metric_cell(d, "soc"),
            charge: metric_cell(d, "charge"),
            discharge: metric_cell(d, "discharge"),
            load: metric_cell(d, "load"),
            reported: d
                .report_time
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut poller = config::resolve(global)?;
    if args.no_cache {
        poller.cache_ttl = Duration::ZERO;
    }

    let coordinator = Coordinator::new(poller)?;
    let outcome = coordinator.fetch().await?;

    tracing::debug!(source = ?outcome.source, "fetched {} devices", outcome.snapshot.len());

    let rendered = output::render_list(
        &global.output,
        &outcome.snapshot.devices,
        |d| DeviceRow::from(d),
        |d| d.id.clone(),
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}
