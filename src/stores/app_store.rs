//! App Store Connect build lookup
//!
//! Two requests per fetch: resolve the app record by bundle identifier,
//! then list the ten most recent builds sorted by version descending and
//! take the highest tag. Every request carries a freshly minted bearer
//! token from [`TokenSigner`].

use crate::core::error::StoreError;
use crate::core::report::{Observation, VersionSource};
use crate::stores::StoreProvider;
use crate::stores::token::TokenSigner;
use crate::version::VersionTag;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an error body is kept for the report.
const BODY_SNIPPET_CHARS: usize = 240;

pub struct AppStoreProvider {
  agent: ureq::Agent,
  api_url: String,
  bundle_id: String,
  signer: TokenSigner,
}

#[derive(Deserialize)]
struct AppsResponse {
  data: Vec<AppRecord>,
}

#[derive(Deserialize)]
struct AppRecord {
  id: String,
}

#[derive(Deserialize)]
struct BuildsResponse {
  data: Vec<BuildRecord>,
}

#[derive(Deserialize)]
struct BuildRecord {
  attributes: BuildAttributes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildAttributes {
  version: Option<String>,
  build_number: Option<String>,
}

impl AppStoreProvider {
  pub fn new(api_url: String, bundle_id: String, signer: TokenSigner) -> Self {
    Self {
      agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
      api_url: api_url.trim_end_matches('/').to_string(),
      bundle_id,
      signer,
    }
  }

  /// Highest build App Store Connect knows about for the configured app.
  pub fn latest_build(&self) -> Result<VersionTag, StoreError> {
    let token = self.signer.sign()?;
    let app_id = self.find_app(&token)?;

    let url = format!("{}/apps/{}/builds", self.api_url, app_id);
    let response = self.get(&url, &token, &[("limit", "10"), ("sort", "-version")])?;
    let builds: BuildsResponse = response.into_json().map_err(|e| StoreError::Network {
      url: url.clone(),
      reason: format!("unreadable response body: {e}"),
    })?;

    latest_from(builds).ok_or_else(|| StoreError::NoVersionInResponse {
      source: "App Store".to_string(),
    })
  }

  fn find_app(&self, token: &str) -> Result<String, StoreError> {
    let url = format!("{}/apps", self.api_url);
    let response = self.get(&url, token, &[("filter[bundleId]", &self.bundle_id)])?;
    let apps: AppsResponse = response.into_json().map_err(|e| StoreError::Network {
      url,
      reason: format!("unreadable response body: {e}"),
    })?;
    single_app(apps, &self.bundle_id)
  }

  fn get(
    &self,
    url: &str,
    token: &str,
    query: &[(&str, &str)],
  ) -> Result<ureq::Response, StoreError> {
    let mut request = self
      .agent
      .get(url)
      .set("Authorization", &format!("Bearer {token}"));
    for (key, value) in query {
      request = request.query(key, value);
    }

    match request.call() {
      Ok(response) => Ok(response),
      Err(ureq::Error::Status(status, response)) => {
        let body = response.into_string().unwrap_or_default();
        Err(StoreError::Api {
          url: url.to_string(),
          status,
          body: body.chars().take(BODY_SNIPPET_CHARS).collect(),
        })
      }
      Err(e) => Err(StoreError::Network {
        url: url.to_string(),
        reason: e.to_string(),
      }),
    }
  }
}

/// The app record the bundle id resolves to, which must be unique.
fn single_app(mut apps: AppsResponse, bundle_id: &str) -> Result<String, StoreError> {
  if apps.data.len() == 1 {
    Ok(apps.data.remove(0).id)
  } else {
    Err(StoreError::AppNotFound {
      bundle_id: bundle_id.to_string(),
      matches: apps.data.len(),
    })
  }
}

/// Folds a builds listing into the highest version tag it carries.
///
/// A build with no parseable version is ignored; a missing or non-numeric
/// buildNumber counts as build 1.
fn latest_from(builds: BuildsResponse) -> Option<VersionTag> {
  builds
    .data
    .into_iter()
    .filter_map(|build| {
      let mut tag = VersionTag::parse(build.attributes.version.as_deref()?).ok()?;
      tag.build = build
        .attributes
        .build_number
        .as_deref()
        .and_then(|n| n.parse().ok())
        .unwrap_or(1);
      Some(tag)
    })
    .max()
}

impl StoreProvider for AppStoreProvider {
  fn source(&self) -> VersionSource {
    VersionSource::AppStore
  }

  fn fetch_latest(&self) -> Observation {
    match self.latest_build() {
      Ok(version) => Observation::Known { version },
      Err(e) => Observation::Unknown { cause: e.to_string() },
    }
  }
}
