//! `fundsync.toml` configuration.
//!
//! Every section and field has a default, so a missing file or a partial
//! file is valid. Relative paths resolve against `work_dir`. Secrets never
//! live here: the API token is read from the environment variable named by
//! `api.token_env`, and Google credentials come from token files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use fundsync_google::{DEFAULT_DRIVE_UPLOAD_URL, DEFAULT_PEOPLE_BASE_URL};
use fundsync_source::{CampaignSelector, DEFAULT_BASE_URL, DEFAULT_TOKEN_ENV};
use fundsync_sync::{RetryPolicy, SyncOptions};
use fundsync_transform::{Cohort, ContactExportOptions, PipelineProfile, SheetLabeler};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "fundsync.toml";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding exports, mapping files and generated reports.
    pub work_dir: PathBuf,
    pub api: ApiConfig,
    pub google: GoogleConfig,
    pub upload: UploadConfig,
    pub tickets: TicketsConfig,
    pub transactions: TransactionsConfig,
    pub fundraising: FundraisingConfig,
    pub contacts: ContactsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            api: ApiConfig::default(),
            google: GoogleConfig::default(),
            upload: UploadConfig::default(),
            tickets: TicketsConfig::default(),
            transactions: TransactionsConfig::default(),
            fundraising: FundraisingConfig::default(),
            contacts: ContactsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolves a configured path against `work_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }

    /// The configuration as TOML, for `check-config`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }
}

/// Fundraising platform API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Name of the environment variable holding the bearer token.
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub people_base_url: String,
    pub drive_upload_url: String,
    /// Token file used for Drive uploads.
    pub drive_token_file: PathBuf,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            people_base_url: DEFAULT_PEOPLE_BASE_URL.to_string(),
            drive_upload_url: DEFAULT_DRIVE_UPLOAD_URL.to_string(),
            drive_token_file: PathBuf::from("drive_token.json"),
        }
    }
}

/// Report upload to Drive. Off unless enabled with a folder id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub enabled: bool,
    pub folder_id: String,
}

impl UploadConfig {
    /// Folder to upload into, honouring a per-pipeline override.
    pub fn folder<'a>(&'a self, override_folder: Option<&'a str>) -> Option<&'a str> {
        if !self.enabled {
            return None;
        }
        override_folder
            .or(Some(self.folder_id.as_str()))
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

/// The T-shirt sizing sheet added to the tickets workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TshirtSheet {
    pub enabled: bool,
    pub sheet: String,
    pub size_column: String,
    /// Detail columns written after the size.
    pub detail_columns: Vec<String>,
    pub size_header: String,
    pub count_header: String,
}

impl Default for TshirtSheet {
    fn default() -> Self {
        Self {
            enabled: true,
            sheet: "T-Shirt Sizes".to_string(),
            size_column: "T-shirt sizing (Unisex)".to_string(),
            detail_columns: strings(&["First Name", "Last Name", "Email"]),
            size_header: "T-Shirt Size".to_string(),
            count_header: "Count".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketsConfig {
    /// Exports are `<prefix>*.csv`; the most recently modified one is used.
    pub export_prefix: String,
    pub type_column: String,
    /// Workbook name before the `_MM-DD-YYYY.xlsx` suffix.
    pub output_prefix: String,
    pub profile: PipelineProfile,
    /// Drop columns that are empty within a sheet.
    pub drop_empty_columns: bool,
    pub labeler: SheetLabeler,
    pub tshirt: TshirtSheet,
    /// Overrides `upload.folder_id` for this workbook.
    pub upload_folder: Option<String>,
    /// Write the contact export from sheets starting with `contacts.sheet_prefix`.
    pub export_contacts: bool,
    /// Sync that export to every configured account.
    pub sync_contacts: bool,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            export_prefix: "tickets-".to_string(),
            type_column: "Ticket Type".to_string(),
            output_prefix: "parsed_tickets".to_string(),
            profile: PipelineProfile {
                drop_columns: strings(&[
                    "Ticket Suffix",
                    "Campaign Code",
                    "Campaign Title",
                    "Price",
                    "Check In",
                    "Promo Code",
                    "Checked in by",
                    "Checkin type",
                    "Checkin source",
                    "Check-in Date (UTC)",
                    "Bundled",
                    "Bundle Type",
                ]),
                exclude: None,
                reconcile_removals: false,
            },
            drop_empty_columns: true,
            labeler: SheetLabeler::ticket_types(),
            tshirt: TshirtSheet::default(),
            upload_folder: None,
            export_contacts: true,
            sync_contacts: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionsConfig {
    pub input_file: PathBuf,
    /// `Team member, Email` pairs; a missing or empty file skips the correction.
    pub mapping_file: PathBuf,
    /// Snapshot and change files, plus `snapshots.json`.
    pub output_dir: PathBuf,
    pub workbook_prefix: String,
    /// `(misspelled, correct)` item descriptions.
    pub description_fixes: Vec<(String, String)>,
    pub profile: PipelineProfile,
    pub cohorts: Vec<Cohort>,
}

const RIDE: &str = "2025 Ride for Missing Children";

impl Default for TransactionsConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from("transactions.csv"),
            mapping_file: PathBuf::from("name_mapping.csv"),
            output_dir: PathBuf::from("Rider_Volunteer_CSVs"),
            workbook_prefix: "Rider_Volunteer_MasterList".to_string(),
            description_fixes: vec![(
                format!("{RIDE} - MV New and Returning Riders"),
                format!("{RIDE} - MV New / Returning Riders"),
            )],
            profile: PipelineProfile {
                drop_columns: strings(&[
                    "Campaign Title",
                    "Campaign Slug",
                    "Team",
                    "Reference Number",
                    "First Name",
                    "Last Name",
                    "Country",
                    "Status Friendly",
                    "Fund ID",
                    "Fund Code",
                    "Fund Name",
                    "Dedication Type",
                    "Dedication Name",
                    "Company",
                    "Dedication Recipient Name",
                    "Dedication Recipient Email",
                    "Method",
                    "CC Last Four",
                    "CC Expiration Date",
                    "Discount Code",
                    "Method Subtype",
                    "Amount",
                    "Fee",
                    "Fee Covered",
                    "Donated",
                    "Payout",
                    "Currency",
                    "Plan ID",
                    "Frequency",
                    "Check Number",
                    "Check Deposited (UTC)",
                    "Payment Captured (UTC)",
                    "Refund Date (UTC)",
                    "Dispute Status",
                    "Acknowledged",
                    "Hide Name",
                    "Hide Amount",
                    "Public Name",
                    "Public Message",
                    "Donor's Local Timezone",
                    "Payment Captured (Donor's Local Timezone)",
                    "UTM Source",
                    "UTM Medium",
                    "UTM Campaign",
                    "UTM Term",
                    "UTM Content",
                    "Referrer",
                    "Widget Id",
                    "Match Name",
                    "Match Amount",
                    "External ID",
                    "Household ID",
                    "Household Name",
                    "Item Subtype",
                    "Item Quantity",
                    "Item Price",
                    "Item Discount",
                    "Item Total",
                ]),
                exclude: None,
                reconcile_removals: false,
            },
            cohorts: vec![
                Cohort::new(format!("{RIDE} - MV New / Returning Riders"), "NewAndReturning"),
                Cohort::new(format!("{RIDE} - MV Reciprocal Riders"), "Reciprocal"),
                Cohort::new(format!("{RIDE} - MV Volunteer"), "Volunteer"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundraisingConfig {
    pub campaign: CampaignSelector,
    pub members_file: PathBuf,
    pub members_sheet: String,
    pub tickets_file: PathBuf,
    /// Ticket titles must start with this year; defaults to the current year.
    pub year: Option<i32>,
    pub upload_folder: Option<String>,
}

impl Default for FundraisingConfig {
    fn default() -> Self {
        Self {
            campaign: CampaignSelector::default(),
            members_file: PathBuf::from("Fundraising_Progress.xlsx"),
            members_sheet: "Fundraising".to_string(),
            tickets_file: PathBuf::from("GiveButterReport.xlsx"),
            year: None,
            upload_folder: None,
        }
    }
}

/// One Google account receiving the contact sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    pub token_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactsConfig {
    /// Only sheets whose name starts with this feed the contact export.
    pub sheet_prefix: String,
    pub export: ContactExportOptions,
    /// Two-column `incorrect,correct` substitutions, no header.
    pub mapping_file: PathBuf,
    pub export_file: PathBuf,
    pub accounts: Vec<AccountConfig>,
    /// Remove memberships of `managed_groups` for contacts absent from the export.
    pub reconcile_removals: bool,
    pub managed_groups: Vec<String>,
    pub retry: RetryPolicy,
    pub request_delay_ms: u64,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            sheet_prefix: "MV".to_string(),
            export: ContactExportOptions::default(),
            mapping_file: PathBuf::from("data_map.txt"),
            export_file: PathBuf::from("output.csv"),
            accounts: vec![
                AccountConfig {
                    name: "account1".to_string(),
                    token_file: PathBuf::from("contacts_token_account1.json"),
                },
                AccountConfig {
                    name: "account2".to_string(),
                    token_file: PathBuf::from("contacts_token_account2.json"),
                },
            ],
            reconcile_removals: false,
            managed_groups: Vec::new(),
            retry: RetryPolicy::default(),
            request_delay_ms: 200,
        }
    }
}

impl ContactsConfig {
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            retry: self.retry.clone(),
            request_delay: Duration::from_millis(self.request_delay_ms),
            reconcile_removals: self.reconcile_removals,
            managed_groups: self.managed_groups.clone(),
        }
    }

    /// Sync options for a pipeline that syncs its own export. The pipeline's
    /// `reconcile_removals` switches removals on as well; `managed_groups`
    /// still limits them.
    pub fn sync_options_for(&self, profile: &PipelineProfile) -> SyncOptions {
        let mut options = self.sync_options();
        options.reconcile_removals |= profile.reconcile_removals;
        options
    }
}
