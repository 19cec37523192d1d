use std::env;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Environment variable holding the personal access token used to
/// authenticate against the hub.
pub const AUTH_TOKEN_VAR : &str = "ALLSPICE_AUTH_TOKEN";

/// Hub instance used when no --allspice_hub_url override is given.
pub const DEFAULT_HUB_URL : &str = "https://hub.allspice.io";

#[derive(thiserror::Error,Debug)]
pub enum HubError {
    #[error("Please set the environment variable ALLSPICE_AUTH_TOKEN")]
    MissingToken,
    #[error("Repository identifier '{0}' is not in the form 'owner/repo'")]
    MalformedRepoName(String),
    #[error("Request to '{url}' failed with status {status}")]
    Status { url : String, status : reqwest::StatusCode },
    #[error("Request to the hub failed: {0}")]
    Transport(#[from] reqwest::Error)
}

/// An 'owner/repo' pair naming a repository on the hub.
///
/// This is only the identifier as the user wrote it; resolving it to an
/// actual repository record happens through `HubClient::get_repository`.
#[derive(Debug,Clone,Hash,Eq,PartialEq)]
pub struct RepoName {
    pub owner : String,
    pub name : String
}

impl FromStr for RepoName {
    type Err = HubError;
    fn from_str(s : &str) -> Result<Self, Self::Err> {
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => {
                Ok(RepoName { owner : (*owner).to_owned(), name : (*name).to_owned() })
            }
            _ => { Err(HubError::MalformedRepoName(s.to_owned())) }
        }
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f : &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A repository record as the hub returns it.  Only the fields this tool
/// reads are deserialized.
#[derive(Debug,Clone,Deserialize)]
pub struct Repository {
    pub id : i64,
    pub full_name : String,
    pub default_branch : String
}

/// Read the auth token from the environment.
///
/// An unset variable and an empty one are both rejected: the hub would
/// refuse the anonymous request much later with a far less useful
/// diagnostic, so this is checked before any network traffic happens.
pub fn auth_token_from_env() -> Result<String, HubError> {
    match env::var(AUTH_TOKEN_VAR) {
        Ok(token) if !token.is_empty() => { Ok(token) }
        _ => { Err(HubError::MissingToken) }
    }
}

/// Authenticated client for a single hub instance.
///
/// Every request carries the personal access token in the Authorization
/// header using the hub's 'token' scheme.
pub struct HubClient {
    http : reqwest::blocking::Client,
    base_url : String,
    token : String
}

impl HubClient {
    pub fn new(token : &str, base_url : Option<&str>) -> Result<HubClient, HubError> {
        let http = reqwest::blocking::Client::builder().build()?;
        let base_url = base_url.unwrap_or(DEFAULT_HUB_URL).trim_end_matches('/').to_owned();
        Ok(HubClient { http, base_url, token : token.to_owned() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve an 'owner/repo' identifier to the repository record on the
    /// hub.  A non-success status (missing repository, bad token, ...) is an
    /// error carrying the status and URL.
    pub fn get_repository(&self, repo : &RepoName) -> Result<Repository, HubError> {
        let url = format!("{}/api/v1/repos/{}/{}", self.base_url, repo.owner, repo.name);
        let resp = self.http.get(&url)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", self.token))
            .send()?;
        if !resp.status().is_success() {
            return Err(HubError::Status { url, status : resp.status() });
        }
        Ok(resp.json()?)
    }

    /// POST a JSON body to a path under the base URL and deserialize the
    /// JSON response, with the token attached.
    pub(crate) fn post_json<B, T>(&self, path : &str, body : &B) -> Result<T, HubError>
    where B : serde::Serialize,
          T : serde::de::DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.http.post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", self.token))
            .json(body)
            .send()?;
        if !resp.status().is_success() {
            return Err(HubError::Status { url, status : resp.status() });
        }
        Ok(resp.json()?)
    }
}
