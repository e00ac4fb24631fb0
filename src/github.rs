//! GitHub collaborators: repository search over the REST API and working
//! copies via `git clone`.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::error::{CovgapError, Result};
use crate::model::Repository;

/// Source of candidate repositories and local working copies. The
/// orchestrator depends on this trait, never on the GitHub client directly.
pub trait RepoHost {
    /// Find up to `limit` repositories in `language` with at least
    /// `min_stars` stars, most-starred first.
    fn search(&self, language: &str, min_stars: u32, limit: u32) -> Result<Vec<Repository>>;

    /// Produce a local working copy of `owner/name` under `dest`, replacing
    /// any previous checkout, and return its path.
    fn clone_repo(&self, owner: &str, name: &str, dest: &Path) -> Result<PathBuf>;
}

/// GitHub-backed [`RepoHost`].
pub struct GitHubHost {
    token: Option<String>,
}

impl GitHubHost {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    name: String,
    html_url: String,
    language: Option<String>,
    owner: Option<SearchOwner>,
}

#[derive(Deserialize)]
struct SearchOwner {
    login: String,
}

impl RepoHost for GitHubHost {
    fn search(&self, language: &str, min_stars: u32, limit: u32) -> Result<Vec<Repository>> {
        let url = format!(
            "https://api.github.com/search/repositories\
             ?q=language:{language}+stars:>={min_stars}&sort=stars&order=desc&per_page={limit}"
        );

        let mut request = ureq::get(&url)
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "covgap")
            .set("X-GitHub-Api-Version", "2022-11-28");
        if let Some(ref token) = self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let resp = match request.call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(CovgapError::Fetch(format!(
                    "GitHub search failed (HTTP {code}): {body}"
                )));
            }
            Err(e) => return Err(CovgapError::Fetch(format!("GitHub search failed: {e}"))),
        };

        let parsed: SearchResponse = resp
            .into_json()
            .map_err(|e| CovgapError::Fetch(format!("Invalid GitHub search response: {e}")))?;

        Ok(parsed
            .items
            .into_iter()
            .map(|item| Repository {
                owner: item
                    .owner
                    .map(|o| o.login)
                    .unwrap_or_else(|| "unknown".to_string()),
                name: item.name,
                url: item.html_url,
                language: item.language.unwrap_or_else(|| language.to_string()),
            })
            .collect())
    }

    fn clone_repo(&self, owner: &str, name: &str, dest: &Path) -> Result<PathBuf> {
        let repo_url = format!("https://github.com/{owner}/{name}.git");
        let checkout = dest.join(name);

        // A stale checkout from a previous run would make git refuse the
        // clone, so remove it first.
        if checkout.exists() {
            std::fs::remove_dir_all(&checkout)
                .map_err(|e| CovgapError::Fetch(format!("Could not remove {checkout:?}: {e}")))?;
        }
        std::fs::create_dir_all(dest)?;

        let output = Command::new("git")
            .arg("clone")
            .arg("--depth=1")
            .arg(&repo_url)
            .arg(&checkout)
            .output()
            .map_err(|e| CovgapError::Fetch(format!("Failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CovgapError::Fetch(format!(
                "git clone of {owner}/{name} failed: {}",
                stderr.trim()
            )));
        }

        Ok(checkout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_deserialization() {
        let body = r#"{
            "items": [
                {
                    "name": "react",
                    "html_url": "https://github.com/facebook/react",
                    "language": "JavaScript",
                    "owner": { "login": "facebook" }
                },
                {
                    "name": "orphan",
                    "html_url": "https://github.com/x/orphan",
                    "language": null,
                    "owner": null
                }
            ]
        }"#;

        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].owner.as_ref().unwrap().login, "facebook");
        assert!(parsed.items[1].language.is_none());
    }

    #[test]
    fn test_clone_failure_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let host = GitHubHost::new(None);
        // Nonexistent repo on a local path that cannot resolve.
        let err = host
            .clone_repo("no-such-owner", "no-such-repo-covgap-test", dir.path())
            .unwrap_err();
        assert!(matches!(err, CovgapError::Fetch(_)));
    }
}
