//! GitHub release and tag listings as [`ReleaseSource`]s.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};
use crate::libs::catalog::{ReleaseEntry, ReleasePage, ReleaseSource};
use crate::schemas::release::{GithubRelease, GithubTag};

const GITHUB_API: &str = "https://api.github.com";

/// A small blocking client for the GitHub REST API.
pub struct GithubClient {
    agent: ureq::Agent,
    api_base: String,
    token: Option<String>,
}

impl GithubClient {
    /// Creates a client talking to `api.github.com`.
    ///
    /// # Arguments
    /// * `timeout`: Overall timeout of each page request.
    /// * `token`: Sent as `Authorization: Bearer` when present; lifts the anonymous rate limit.
    pub fn new(timeout: Duration, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("kbin/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            api_base: GITHUB_API.to_string(),
            token,
        }
    }

    /// Points the client at another API root (GitHub Enterprise, a local test server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Release listing of `owner/repo`.
    pub fn releases<'a>(&'a self, owner: &'a str, repo: &'a str) -> RepoListing<'a> {
        RepoListing {
            client: self,
            owner,
            repo,
            kind: ListingKind::Releases,
        }
    }

    /// Tag listing of `owner/repo`.
    pub fn tags<'a>(&'a self, owner: &'a str, repo: &'a str) -> RepoListing<'a> {
        RepoListing {
            client: self,
            owner,
            repo,
            kind: ListingKind::Tags,
        }
    }

    fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        per_page: usize,
    ) -> Result<(Vec<T>, bool)> {
        let url = format!("{}{}", self.api_base, path);
        debug!(target: "kbin::github", %url, page, per_page, authenticated = self.token.is_some(), "listing");

        let mut request = self
            .agent
            .get(&url)
            .query("per_page", &per_page.to_string())
            .query("page", &page.to_string())
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        let response = request.call()?;
        let has_next = has_next_page(response.header("link"));
        let body = response
            .into_string()
            .map_err(|e| Error::network(&url, e.to_string()))?;
        let items = serde_json::from_str(&body)?;
        Ok((items, has_next))
    }
}

#[derive(Debug, Clone, Copy)]
enum ListingKind {
    Releases,
    Tags,
}

/// A paginated listing of one repository's releases or tags.
pub struct RepoListing<'a> {
    client: &'a GithubClient,
    owner: &'a str,
    repo: &'a str,
    kind: ListingKind,
}

impl ReleaseSource for RepoListing<'_> {
    fn list_page(&self, page: u32, per_page: usize) -> Result<ReleasePage> {
        let (entries, has_next) = match self.kind {
            ListingKind::Releases => {
                let path = format!("/repos/{}/{}/releases", self.owner, self.repo);
                let (items, next) = self.client.get_page::<GithubRelease>(&path, page, per_page)?;
                (items.into_iter().map(ReleaseEntry::from).collect(), next)
            }
            ListingKind::Tags => {
                let path = format!("/repos/{}/{}/tags", self.owner, self.repo);
                let (items, next) = self.client.get_page::<GithubTag>(&path, page, per_page)?;
                (items.into_iter().map(ReleaseEntry::from).collect(), next)
            }
        };
        Ok(ReleasePage { entries, has_next })
    }
}

/// Whether a `Link` response header advertises a `rel="next"` page.
fn has_next_page(link: Option<&str>) -> bool {
    link.is_some_and(|header| {
        header
            .split(',')
            .any(|part| part.split(';').skip(1).any(|p| p.trim() == r#"rel="next""#))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::catalog::{CatalogQuery, resolve_versions};
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serves one canned response per connection and reports each request line.
    fn serve(responses: Vec<(String, String)>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (extra_headers, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                    line.clear();
                }
                tx.send(request_line.trim().to_string()).unwrap();
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
                    body.len(),
                    extra_headers
                );
                stream.write_all(head.as_bytes()).unwrap();
                stream.write_all(body.as_bytes()).unwrap();
            }
        });
        (base, rx)
    }

    #[test]
    fn link_header_next_detection() {
        let link = r#"<https://api.github.com/repos/a/b/releases?page=2>; rel="next", <https://api.github.com/repos/a/b/releases?page=5>; rel="last""#;
        assert!(has_next_page(Some(link)));
        let last = r#"<https://api.github.com/repos/a/b/releases?page=1>; rel="prev""#;
        assert!(!has_next_page(Some(last)));
        assert!(!has_next_page(None));
    }

    #[test]
    fn releases_are_paged_and_filtered() {
        let page1 = r#"[{"tag_name":"v3.14.0","name":"Helm v3.14.0","prerelease":false},
                        {"tag_name":"v3.15.0-rc.1","name":"Helm v3.15.0-rc.1","prerelease":true}]"#;
        let page2 = r#"[{"tag_name":"v3.13.3","name":"Helm v3.13.3","prerelease":false}]"#;
        let (base, requests) = serve(vec![
            (
                "Link: <http://x/releases?page=2>; rel=\"next\"\r\n".to_string(),
                page1.to_string(),
            ),
            (String::new(), page2.to_string()),
        ]);
        let client = GithubClient::new(Duration::from_secs(5), None).with_api_base(base);

        let versions = resolve_versions(&client.releases("helm", "helm"), &CatalogQuery::SEMVER, 5).unwrap();

        assert_eq!(versions, vec!["3.14.0", "3.13.3"]);
        let first = requests.recv().unwrap();
        assert!(first.starts_with("GET /repos/helm/helm/releases?"), "{first}");
        assert!(first.contains("per_page=5") && first.contains("page=1"), "{first}");
        assert!(requests.recv().unwrap().contains("page=2"));
    }

    #[test]
    fn tags_listing_maps_names() {
        let body = r#"[{"name":"v1.30.2","commit":{"sha":"abc"}},{"name":"v1.30.1","commit":{"sha":"def"}}]"#;
        let (base, requests) = serve(vec![(String::new(), body.to_string())]);
        let client = GithubClient::new(Duration::from_secs(5), Some("t0ken".into())).with_api_base(base);

        let page = client.tags("kubernetes", "kubernetes").list_page(1, 20).unwrap();

        assert_eq!(page.entries, vec![ReleaseEntry::new("v1.30.2"), ReleaseEntry::new("v1.30.1")]);
        assert!(!page.has_next);
        assert!(requests.recv().unwrap().starts_with("GET /repos/kubernetes/kubernetes/tags?"));
    }
}
