use std::{
    process::{Child, Command, Stdio},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use colored::Colorize as _;
use reqwest::cookie::Jar;
use serde_json::Value;
use thirtyfour::{
    common::config::WebDriverConfig, extensions::query::ElementPollerWithTimeout, prelude::*,
    AlertBehaviour,
};
use tiny_bail::prelude::*;
use url::Url;

use crate::{
    account::{index_in_range, Account},
    api::ApiClient,
    config::Config,
    job::{self, OpenJob},
    locations::LocationTable,
};

/// Owns the browser, the cookie-sharing HTTP client, and all per-run state.
pub struct Bot {
    config: Config,
    server: Option<Child>,
    pub driver: Option<WebDriver>,
    jar: Arc<Jar>,
    api: ApiClient,
    pub accounts: Vec<Account>,
    pub active_account: Option<Value>,
    pub account_name: String,
    pub open_jobs: Vec<OpenJob>,
    pub clone_candidates: Vec<Value>,
    locations: LocationTable,
}

impl Bot {
    /// Fails fast when the location table is missing; nothing else works
    /// without it.
    pub fn new(config: Config) -> Result<Self> {
        let locations = LocationTable::load(&config.locations_path)?;
        let jar = Arc::new(Jar::default());
        let api = ApiClient::new(config.api_url.clone(), jar.clone())?;
        Ok(Self {
            config,
            server: None,
            driver: None,
            jar,
            api,
            accounts: Vec::new(),
            active_account: None,
            account_name: String::new(),
            open_jobs: Vec::new(),
            clone_candidates: Vec::new(),
            locations,
        })
    }

    pub async fn init(&mut self) -> WebDriverResult<()> {
        assert!(self.server.is_none() && self.driver.is_none());

        // Spawn WebDriver server as a child process.
        let server = Command::new("geckodriver")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        std::thread::sleep(Duration::from_millis(100));

        // Connect to WebDriver server.
        let mut caps = DesiredCapabilities::firefox();
        if self.config.headless {
            caps.set_headless()?;
        }
        caps.set_unexpected_alert_behaviour(AlertBehaviour::Dismiss)?;
        let config = WebDriverConfig::builder()
            .poller(Arc::new(ElementPollerWithTimeout::new(
                Duration::from_secs(8),
                Duration::from_millis(100),
            )))
            .build()?;
        let driver =
            WebDriver::new_with_config(self.config.webdriver_url.as_str(), caps, config).await?;
        driver.maximize_window().await?;

        self.server = Some(server);
        self.driver = Some(driver);

        Ok(())
    }

    fn driver(&self) -> Result<&WebDriver> {
        self.driver.as_ref().context("browser is not running")
    }

    /// Opens the login page, types the configured credentials, then waits
    /// for the operator to finish logging in (MFA, captchas, whatever the
    /// site throws at them). Completion is detected by the browser leaving
    /// the login URL, bounded by `login_timeout_secs`.
    pub async fn authenticate(&mut self) -> Result<()> {
        let driver = self.driver()?;
        driver
            .goto(format!("{}/login", self.config.app_url))
            .await?;
        if !self.config.email.is_empty() {
            driver
                .find(By::Css("#email"))
                .await?
                .send_keys(self.config.email.as_str())
                .await?;
            driver
                .find(By::Css("#password"))
                .await?
                .send_keys(self.config.password.as_str())
                .await?;
        }

        log::info!("Waiting for login to complete in the browser...");
        let deadline = Instant::now() + Duration::from_secs(self.config.login_timeout_secs);
        while driver.current_url().await?.as_str().contains("login") {
            if Instant::now() >= deadline {
                bail!(
                    "login did not complete within {}s",
                    self.config.login_timeout_secs,
                );
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }

        self.sync_cookies().await?;
        self.accounts = self.api.accounts().await?;
        log::info!("Logged in; found {} sub-accounts", self.accounts.len());
        Ok(())
    }

    /// Mirrors every browser cookie into the HTTP client's jar. Called
    /// before each API-heavy phase since navigation can rotate the session.
    pub async fn sync_cookies(&self) -> Result<()> {
        let driver = self.driver()?;
        let api_url = Url::parse(&self.config.api_url).context("parsing api_url")?;
        for cookie in driver.get_all_cookies().await? {
            self.jar
                .add_cookie_str(&format!("{}={}", cookie.name, cookie.value), &api_url);
        }
        Ok(())
    }

    /// Enters the sub-account at `index`, leaving the current one first.
    /// An out-of-range index reports an error without touching the browser
    /// or the active-account pointer.
    pub async fn select_account(&mut self, index: usize) -> Result<()> {
        if !index_in_range(index, self.accounts.len()) {
            bail!(
                "account index {index} out of range [0, {})",
                self.accounts.len(),
            );
        }

        let driver = self.driver()?;
        if self.active_account.is_some() {
            driver
                .goto(format!("{}/portal/exit?type=linked", self.config.app_url))
                .await?;
        }

        let account = self.accounts[index].clone();
        driver
            .goto(format!(
                "{}/dashboard?cid={}",
                self.config.app_url,
                account.id_str(),
            ))
            .await?;

        self.active_account = Some(account.id);
        self.account_name = account.name;
        log::info!("Selected account: {}", self.account_name);
        Ok(())
    }

    /// Lists the active account's open jobs, keeping the minimal record
    /// the rotation needs.
    pub async fn fetch_open_jobs(&mut self) -> Result<()> {
        self.sync_cookies().await?;

        let me = self.api.me().await?;
        let user_id = me
            .get("id")
            .and_then(job::json_id)
            .context("user id missing from /user/me response")?;

        let rows = self.api.open_jobs(&user_id).await?;
        self.open_jobs.clear();
        for row in &rows {
            match OpenJob::from_value(row) {
                Some(open_job) => self.open_jobs.push(open_job),
                None => log::warn!("Skipping malformed open-job row: {row}"),
            }
        }
        log::info!(
            "Found {} open jobs on {}",
            self.open_jobs.len(),
            self.account_name,
        );
        Ok(())
    }

    /// Fetches full detail for each open job, one at a time. A failed
    /// detail fetch drops that job from the clone candidates.
    pub async fn enrich_jobs(&mut self) -> Result<()> {
        self.sync_cookies().await?;

        self.clone_candidates.clear();
        for open_job in &self.open_jobs {
            tokio::time::sleep(Duration::from_secs(1)).await;
            match self.api.job_detail(&open_job.id).await {
                Ok(detail) => self.clone_candidates.push(detail),
                Err(err) => log::warn!("Job {}: detail fetch failed: {err:#}", open_job.id),
            }
        }
        log::info!(
            "{} of {} jobs ready to rotate",
            self.clone_candidates.len(),
            self.open_jobs.len(),
        );
        Ok(())
    }

    /// Close-then-clone for each candidate, strictly one job at a time.
    /// Stops after the first cloned job unless `clone_all` is set.
    pub async fn rotate_jobs(&self) -> Result<()> {
        self.sync_cookies().await?;

        let today = Utc::now().date_naive();
        for detail in &self.clone_candidates {
            let id = detail
                .get("id")
                .and_then(job::json_id)
                .unwrap_or_default();
            let title = detail
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("<untitled>");
            let postal = detail
                .get("postal")
                .and_then(job::json_id)
                .unwrap_or_default();

            let Some(location) = self.locations.next_after(&postal) else {
                log::warn!(
                    "{id} | {title}: postal {postal} is not in {}; skipping",
                    self.config.locations_path.display(),
                );
                continue;
            };

            // Close the old posting. A failure here is logged but does not
            // stop the clone; the server may already consider it closed.
            match self.api.close_job(&job::close_payload(detail)).await {
                Ok(_) => log::info!("Closed {title} | {id}"),
                Err(err) => log::warn!("Failed to close {id}: {err:#}"),
            }
            tokio::time::sleep(Duration::from_secs(2)).await;

            // Re-post at the rotated location.
            let payload = job::clone_payload(detail, location, today);
            let created = match self.api.clone_job(&id, &payload).await {
                Ok(created) => created,
                Err(err) => {
                    log::warn!("Failed to clone {id}: {err:#}");
                    continue;
                }
            };

            // The clone comes back with the old posting's custom fields.
            let new_id = created.get("id").cloned().unwrap_or(Value::Null);
            match self.api.clear_custom_fields(&new_id).await {
                Ok(_) => log::info!(
                    "Cloned {title} as {} ({} {})",
                    job::json_id(&new_id).unwrap_or_default(),
                    location.city,
                    location.postal,
                ),
                Err(err) => log::warn!(
                    "Failed to clear custom fields on {}: {err:#}",
                    job::json_id(&new_id).unwrap_or_default(),
                ),
            }

            if !self.config.clone_all {
                break;
            }
        }
        Ok(())
    }

    /// The full pipeline over every sub-account. A failing account is
    /// logged and skipped rather than aborting the run.
    pub async fn run_all(&mut self) -> Result<()> {
        for index in 0..self.accounts.len() {
            c!(self.select_account(index).await);
            c!(self.fetch_open_jobs().await);
            c!(self.enrich_jobs().await);
            c!(self.rotate_jobs().await);
        }
        Ok(())
    }

    pub fn list_jobs(&self) {
        for open_job in &self.open_jobs {
            println!(
                "{} {} {}",
                format!("{:>10}", open_job.id).bold(),
                open_job.postal.cyan(),
                open_job.title,
            );
        }
    }

    pub async fn quit(self) -> Result<()> {
        if let Some(driver) = self.driver {
            driver.quit().await?;
        }
        if let Some(mut server) = self.server {
            server.kill()?;
        }
        Ok(())
    }
}
