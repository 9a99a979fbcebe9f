//! Play Store listing scrape
//!
//! Google offers no public API for the production version of an app, so
//! the provider fetches the public listing page and scans its HTML. Three
//! patterns are tried in order of confidence: the "Current Version" label
//! of the older layout, the softwareVersion field of the embedded
//! structured data, and finally the first bare version triple anywhere in
//! the page. The listing serves release triples only, so observed versions
//! carry build number 1.

use crate::core::error::StoreError;
use crate::core::report::{Observation, VersionSource};
use crate::stores::StoreProvider;
use crate::version::VersionTag;
use regex::Regex;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("shipver/", env!("CARGO_PKG_VERSION"));

pub struct PlayStoreProvider {
  agent: ureq::Agent,
  listing_url: String,
  package_name: String,
  labeled: Regex,
  structured: Regex,
  bare: Regex,
}

impl PlayStoreProvider {
  pub fn new(listing_url: String, package_name: String) -> Self {
    Self {
      agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
      listing_url,
      package_name,
      labeled: Regex::new(r"(?s)Current Version.{0,400}?(\d+\.\d+\.\d+)").unwrap(),
      structured: Regex::new(r#""softwareVersion"\s*:\s*"\s*([^"]+?)\s*""#).unwrap(),
      bare: Regex::new(r"\d+\.\d+\.\d+").unwrap(),
    }
  }

  /// Version currently published on the listing page.
  pub fn published_version(&self) -> Result<VersionTag, StoreError> {
    let response = self
      .agent
      .get(&self.listing_url)
      .query("id", &self.package_name)
      .query("hl", "en")
      .set("User-Agent", USER_AGENT)
      .call();

    let response = match response {
      Ok(response) => response,
      Err(ureq::Error::Status(status, response)) => {
        let body = response.into_string().unwrap_or_default();
        return Err(StoreError::Api {
          url: self.listing_url.clone(),
          status,
          body: body.chars().take(240).collect(),
        });
      }
      Err(e) => {
        return Err(StoreError::Network {
          url: self.listing_url.clone(),
          reason: e.to_string(),
        });
      }
    };

    let html = response.into_string().map_err(|e| StoreError::Network {
      url: self.listing_url.clone(),
      reason: format!("unreadable response body: {e}"),
    })?;

    self.scan_version(&html).ok_or_else(|| StoreError::NoVersionInResponse {
      source: "Play Store listing".to_string(),
    })
  }

  /// Scans listing HTML for a version, most reliable pattern first.
  pub fn scan_version(&self, html: &str) -> Option<VersionTag> {
    self
      .labeled
      .captures(html)
      .and_then(|caps| VersionTag::parse(&caps[1]).ok())
      .or_else(|| {
        self
          .structured
          .captures(html)
          .and_then(|caps| VersionTag::parse(&caps[1]).ok())
      })
      .or_else(|| {
        self
          .bare
          .find(html)
          .and_then(|m| VersionTag::parse(m.as_str()).ok())
      })
  }
}

impl StoreProvider for PlayStoreProvider {
  fn source(&self) -> VersionSource {
    VersionSource::PlayStore
  }

  fn fetch_latest(&self) -> Observation {
    match self.published_version() {
      Ok(version) => Observation::Known { version },
      Err(e) => Observation::Unknown { cause: e.to_string() },
    }
  }
}
