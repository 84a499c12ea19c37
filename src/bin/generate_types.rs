//! Export TypeScript bindings for the bus wire types.
//!
//! Usage: `cargo run --bin generate_types [OUT_DIR]` (default: `bindings/`)

use std::path::PathBuf;

use anyhow::{Context, Result};
use ts_rs::TS;

use switchboard::coordinators::{BreadcrumbView, ConfirmationView, DrawerView};
use switchboard::events::{
    BreadcrumbTrail, ConfirmationOutcome, ConfirmationRequest, DrawerContent, NavigationTarget,
};
use switchboard::steps::StepTask;
use switchboard::EventEnvelope;

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("bindings"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    // export_all_to also writes every type these depend on
    EventEnvelope::export_all_to(&out_dir).context("EventEnvelope")?;
    ConfirmationRequest::export_all_to(&out_dir).context("ConfirmationRequest")?;
    ConfirmationOutcome::export_all_to(&out_dir).context("ConfirmationOutcome")?;
    DrawerContent::export_all_to(&out_dir).context("DrawerContent")?;
    BreadcrumbTrail::export_all_to(&out_dir).context("BreadcrumbTrail")?;
    NavigationTarget::export_all_to(&out_dir).context("NavigationTarget")?;
    BreadcrumbView::export_all_to(&out_dir).context("BreadcrumbView")?;
    ConfirmationView::export_all_to(&out_dir).context("ConfirmationView")?;
    DrawerView::export_all_to(&out_dir).context("DrawerView")?;
    StepTask::export_all_to(&out_dir).context("StepTask")?;

    println!("TypeScript bindings written to {}", out_dir.display());
    Ok(())
}
