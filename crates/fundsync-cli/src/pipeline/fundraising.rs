//! Campaign progress and ticket reports from the fundraising API.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local};
use fundsync_ingest::records_to_table;
use fundsync_report::{SheetSpec, SummaryBlock, write_workbook};
use fundsync_source::{Campaign, FundraisingClient, select_campaign};
use fundsync_transform::{members_report, tickets_report};
use serde_json::Value;
use tracing::{info, info_span, warn};

use super::SheetCount;
use super::remote::{UploadResult, upload_report};
use crate::config::AppConfig;

#[derive(Debug)]
pub struct FundraisingReports {
    pub members: usize,
    pub total_raised: f64,
    pub members_file: PathBuf,
    pub tickets: usize,
    pub ticket_sheets: Vec<SheetCount>,
    /// Absent when no ticket matched the year.
    pub tickets_file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct FundraisingOutcome {
    pub campaign: Campaign,
    pub reports: FundraisingReports,
    pub upload: Option<UploadResult>,
}

impl FundraisingOutcome {
    pub fn is_success(&self) -> bool {
        self.upload.as_ref().is_none_or(UploadResult::is_success)
    }
}

/// Writes the members progress workbook and the per-title tickets workbook.
pub fn write_reports(
    config: &AppConfig,
    members: &[Value],
    tickets: &[Value],
    year: i32,
) -> Result<FundraisingReports> {
    let settings = &config.fundraising;

    let report = members_report(records_to_table(members)?)?;
    let total_row = report.total_row();
    let member_count = report.table.len();
    let members_file = config.resolve(&settings.members_file);
    write_workbook(
        &members_file,
        &[SheetSpec::new(settings.members_sheet.clone(), report.table)
            .with_summary(SummaryBlock::Rows(vec![total_row]))],
    )?;
    info!(members = member_count, total_raised = report.total_raised, "wrote members report");

    let split = tickets_report(records_to_table(tickets)?, year)?;
    let ticket_count = split.total_rows();
    let ticket_sheets: Vec<SheetCount> = split
        .groups
        .iter()
        .map(|group| SheetCount {
            label: group.label.clone(),
            source: group.raw_value.clone(),
            rows: group.table.len(),
        })
        .collect();
    let tickets_file = if split.groups.is_empty() {
        warn!(year, "no tickets for this year, skipping tickets report");
        None
    } else {
        let path = config.resolve(&settings.tickets_file);
        let sheets: Vec<SheetSpec> = split
            .groups
            .into_iter()
            .map(|group| SheetSpec::new(group.label, group.table))
            .collect();
        write_workbook(&path, &sheets)?;
        Some(path)
    };

    Ok(FundraisingReports {
        members: member_count,
        total_raised: report.total_raised,
        members_file,
        tickets: ticket_count,
        ticket_sheets,
        tickets_file,
    })
}

pub fn run_fundraising(config: &AppConfig, now: DateTime<Local>) -> Result<FundraisingOutcome> {
    let settings = &config.fundraising;
    let _span = info_span!("fundraising").entered();
    let started = Instant::now();

    let client = FundraisingClient::from_env(&config.api.base_url, &config.api.token_env)?
        .with_timeout(config.api.timeout())?;
    let campaign = select_campaign(client.list_campaigns()?, &settings.campaign)?;
    info!(id = %campaign.id, name = %campaign.name, "selected campaign");

    let members = client
        .campaign_members(&campaign.id.to_string())
        .context("failed to fetch campaign members")?;
    let tickets = client.tickets().context("failed to fetch tickets")?;
    let year = settings.year.unwrap_or_else(|| now.year());
    let reports = write_reports(config, &members, &tickets, year)?;

    let upload = config
        .upload
        .folder(settings.upload_folder.as_deref())
        .map(|folder| upload_report(config, folder, &reports.members_file));

    info!(elapsed_ms = started.elapsed().as_millis() as u64, "fundraising pipeline finished");
    Ok(FundraisingOutcome {
        campaign,
        reports,
        upload,
    })
}
