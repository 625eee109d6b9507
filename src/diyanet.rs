//! Client for the Diyanet prayer-times website.
//!
//! The site exposes no schedule API, so the monthly table on a district's
//! page is scraped. District lists come from the JSON endpoint the site's
//! own location picker uses.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use log::{info, warn};
use reqwest::blocking::{Client, Response};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::schedule::PrayerSchedule;
use crate::source::PrayerTimeSource;

pub const BASE_URL: &str = "https://namazvakitleri.diyanet.gov.tr/tr-TR/";

const USER_AGENT: &str = concat!("prayer-clock/", env!("CARGO_PKG_VERSION"));
const ROW_SELECTOR: &str = "#tab-1 .vakit-table tbody tr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct District {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct DistrictListing {
    #[serde(rename = "StateRegionList", default)]
    districts: Vec<RawDistrict>,
}

#[derive(Debug, Deserialize)]
struct RawDistrict {
    #[serde(rename = "IlceAdi")]
    name: String,
    #[serde(rename = "IlceID")]
    id: Value,
}

impl From<RawDistrict> for District {
    fn from(raw: RawDistrict) -> Self {
        let id = match raw.id {
            Value::String(id) => id,
            other => other.to_string(),
        };
        Self { name: raw.name, id }
    }
}

pub struct DiyanetClient {
    client: Client,
    base_url: String,
}

impl DiyanetClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self { client, base_url })
    }

    pub fn districts(&self, city_id: &str) -> Result<Vec<District>> {
        let url = format!("{}home/GetRegList", self.base_url);
        let response = self.get(
            &url,
            &[
                ("ChangeType", "state"),
                ("CountryId", "2"),
                ("Culture", "tr-TR"),
                ("StateId", city_id),
            ],
        )?;

        let listing: DistrictListing = response
            .json()
            .context("District list is not valid JSON")?;

        Ok(listing.districts.into_iter().map(District::from).collect())
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        info!("Requesting {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .with_context(|| format!("Request to {url} failed"))?;

        if !response.status().is_success() {
            bail!("Request to {} returned {}", url, response.status());
        }
        Ok(response)
    }
}

impl PrayerTimeSource for DiyanetClient {
    fn fetch_schedule(&self, district_id: &str) -> Result<PrayerSchedule> {
        let url = format!("{}{}", self.base_url, district_id);
        let body = self
            .get(&url, &[])?
            .text()
            .context("Failed to read prayer-times page")?;
        parse_schedule_html(&body)
    }
}

/// Extracts `{date -> [times]}` from a district page. Rows that cannot be
/// read are skipped; a page without the table is an error.
pub fn parse_schedule_html(html: &str) -> Result<PrayerSchedule> {
    let document = Html::parse_document(html);
    let rows = selector(ROW_SELECTOR)?;
    let cells = selector("td")?;

    let mut schedule = PrayerSchedule::new();
    let mut found_rows = false;

    for row in document.select(&rows) {
        found_rows = true;
        let texts: Vec<String> = row.select(&cells).map(cell_text).collect();

        let Some(date) = texts.first().and_then(|cell| parse_row_date(cell)) else {
            warn!("Skipping prayer-times row with unreadable date: {:?}", texts.first());
            continue;
        };

        let times: Vec<String> = texts.into_iter().skip(2).collect();
        if times.is_empty() {
            warn!("Skipping prayer-times row for {} without times", date);
            continue;
        }
        schedule.insert_day(date, times);
    }

    if !found_rows {
        bail!("Prayer-times table not found in page");
    }
    Ok(schedule)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow!("Invalid selector {css:?}: {err:?}"))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Reads dates such as `"16 Ekim 2026 Cuma"`.
fn parse_row_date(cell: &str) -> Option<NaiveDate> {
    let mut fields = cell.split_whitespace();
    let day: u32 = fields.next()?.parse().ok()?;
    let month = month_number(fields.next()?)?;
    let year: i32 = fields.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "Ocak" => 1,
        "Şubat" => 2,
        "Mart" => 3,
        "Nisan" => 4,
        "Mayıs" => 5,
        "Haziran" => 6,
        "Temmuz" => 7,
        "Ağustos" => 8,
        "Eylül" => 9,
        "Ekim" => 10,
        "Kasım" => 11,
        "Aralık" => 12,
        _ => return None,
    };
    Some(month)
}
