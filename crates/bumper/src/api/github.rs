//! Tags of a GitHub repository, managed through the REST API.
use super::{NewTag, RemoteTag, TagHost, Tagger};
use crate::repo::RepoSlug;
use reqwest::{header, Method, StatusCode};
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "2022-11-28";
pub const MEDIA_TYPE: &str = "application/vnd.github+json";
pub const PER_PAGE: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("request failed")]
    Http(#[from] reqwest::Error),
    #[error("invalid API url {url:?}")]
    InvalidUrl {
        #[source]
        source: Option<url::ParseError>,
        url: String,
    },
    #[error("invalid token")]
    InvalidToken(#[source] header::InvalidHeaderValue),
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("tag {0:?} already exists")]
    AlreadyExists(String),
    #[error("GitHub API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct Commit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    commit: Commit,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Reference {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct AnnotatedTag {
    sha: String,
    object: GitObject,
}

#[derive(Debug, Serialize)]
struct CreateTagObject<'a> {
    tag: &'a str,
    message: &'a str,
    object: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tagger: Option<&'a Tagger>,
}

#[derive(Debug, Serialize)]
struct CreateReference<'a> {
    #[serde(rename = "ref")]
    reference: String,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateReference<'a> {
    sha: &'a str,
    force: bool,
}

/// Extract the URL of the next page from a `Link` header.
///
/// ```
/// let link = r#"<https://api.github.com/repositories/1/tags?page=2>; rel="next", <https://api.github.com/repositories/1/tags?page=5>; rel="last""#;
/// assert_eq!(
///     bumper::api::github::next_page(link).as_deref(),
///     Some("https://api.github.com/repositories/1/tags?page=2"),
/// );
/// ```
#[must_use]
pub fn next_page(link: &str) -> Option<String> {
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        let url = parts.next()?.strip_prefix('<')?.strip_suffix('>')?;
        parts
            .any(|param| matches!(param, r#"rel="next""# | "rel=next"))
            .then(|| url.to_string())
    })
}

/// Client for the tags of a single GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHub {
    client: reqwest::Client,
    api_url: url::Url,
    repo: RepoSlug,
    authenticated: bool,
}

impl GitHub {
    /// Create a new client.
    ///
    /// # Errors
    /// When the API url is invalid or the HTTP client cannot be constructed.
    pub fn new(api_url: &str, repo: RepoSlug, token: Option<&str>) -> Result<Self, Error> {
        let api_url = url::Url::parse(api_url).map_err(|source| Error::InvalidUrl {
            source: Some(source),
            url: api_url.to_string(),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl {
                source: None,
                url: api_url.to_string(),
            });
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static(API_VERSION),
        );
        if let Some(token) = token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(Error::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url,
            repo,
            authenticated: token.is_some(),
        })
    }

    #[must_use]
    pub fn repo(&self) -> &RepoSlug {
        &self.repo
    }

    /// URL of an endpoint below `/repos/{owner}/{repo}`.
    ///
    /// Segments containing `/` (e.g. branch names) are split into path segments.
    fn repo_url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> url::Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["repos", self.repo.owner.as_str(), self.repo.name.as_str()])
                .extend(segments.into_iter().flat_map(|segment| segment.split('/')));
        }
        url
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        what: impl FnOnce() -> String,
    ) -> Result<reqwest::Response, Error> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(url = %response.url(), %status, "github api");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|body| body.message)
            .unwrap_or(body);
        match status {
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized { message }),
            StatusCode::NOT_FOUND => Err(Error::NotFound(what())),
            status => Err(Error::Api { status, message }),
        }
    }

    async fn get<T>(&self, url: url::Url, what: impl FnOnce() -> String) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .send(self.client.request(Method::GET, url), what)
            .await?;
        Ok(response.json().await?)
    }

    /// Follow annotated tags to the commit they point at.
    async fn peel(&self, mut object: GitObject) -> Result<String, Error> {
        while object.kind == "tag" {
            let url = self.repo_url(["git", "tags", object.sha.as_str()]);
            let sha = object.sha.clone();
            let tag: AnnotatedTag = self.get(url, || format!("tag object {sha}")).await?;
            tracing::trace!(tag = tag.sha, "peeled annotated tag");
            object = tag.object;
        }
        Ok(object.sha)
    }

    async fn create_ref(&self, name: &str, sha: &str) -> Result<(), Error> {
        let url = self.repo_url(["git", "refs"]);
        let body = CreateReference {
            reference: format!("refs/tags/{name}"),
            sha,
        };
        let request = self.client.request(Method::POST, url).json(&body);
        match self.send(request, || format!("commit {sha}")).await {
            Err(Error::Api { status, .. }) if status == StatusCode::UNPROCESSABLE_ENTITY => {
                Err(Error::AlreadyExists(name.to_string()))
            }
            other => other.map(|_| ()),
        }
    }
}

impl TagHost for GitHub {
    type Error = Error;

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn default_branch(&self) -> Result<String, Self::Error> {
        let url = self.repo_url(std::iter::empty());
        let repo: Repository = self
            .get(url, || format!("repository {}", self.repo))
            .await?;
        Ok(repo.default_branch)
    }

    async fn resolve_ref(&self, reference: &str) -> Result<String, Self::Error> {
        let url = self.repo_url(["commits", reference]);
        let commit: Commit = self.get(url, || format!("ref {reference:?}")).await?;
        Ok(commit.sha)
    }

    async fn tags(&self) -> Result<Vec<RemoteTag>, Self::Error> {
        let mut url = self.repo_url(["tags"]);
        url.query_pairs_mut()
            .append_pair("per_page", &PER_PAGE.to_string());

        let mut tags = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let request = self.client.request(Method::GET, url);
            let response = self
                .send(request, || format!("repository {}", self.repo))
                .await?;
            next = response
                .headers()
                .get(header::LINK)
                .and_then(|link| link.to_str().ok())
                .and_then(next_page)
                .and_then(|next| url::Url::parse(&next).ok());
            let page: Vec<Tag> = response.json().await?;
            tracing::debug!(count = page.len(), "received tags");
            tags.extend(page.into_iter().map(|tag| RemoteTag {
                name: tag.name,
                commit_sha: tag.commit.sha,
            }));
        }
        Ok(tags)
    }

    async fn tag(&self, name: &str) -> Result<Option<RemoteTag>, Self::Error> {
        let url = self.repo_url(["git", "ref", "tags", name]);
        let reference: Reference = match self.get(url, || format!("tag {name:?}")).await {
            Ok(reference) => reference,
            Err(Error::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        let commit_sha = self.peel(reference.object).await?;
        Ok(Some(RemoteTag {
            name: name.to_string(),
            commit_sha,
        }))
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<RemoteTag, Self::Error> {
        tracing::debug!(tag = tag.name, lightweight = tag.is_lightweight(), "create tag");
        let target = match &tag.message {
            None => tag.commit_sha.clone(),
            Some(message) => {
                let url = self.repo_url(["git", "tags"]);
                let body = CreateTagObject {
                    tag: &tag.name,
                    message,
                    object: &tag.commit_sha,
                    kind: "commit",
                    tagger: tag.tagger.as_ref(),
                };
                let request = self.client.request(Method::POST, url).json(&body);
                let response = self
                    .send(request, || format!("commit {}", tag.commit_sha))
                    .await?;
                let object: AnnotatedTag = response.json().await?;
                tracing::debug!(sha = object.sha, "created tag object");
                object.sha
            }
        };
        self.create_ref(&tag.name, &target).await?;
        Ok(RemoteTag {
            name: tag.name.clone(),
            commit_sha: tag.commit_sha.clone(),
        })
    }

    async fn update_tag(&self, name: &str, commit_sha: &str) -> Result<RemoteTag, Self::Error> {
        let url = self.repo_url(["git", "refs", "tags", name]);
        let body = UpdateReference {
            sha: commit_sha,
            force: true,
        };
        let request = self.client.request(Method::PATCH, url).json(&body);
        self.send(request, || format!("tag {name:?}")).await?;
        Ok(RemoteTag {
            name: name.to_string(),
            commit_sha: commit_sha.to_string(),
        })
    }

    async fn delete_tag(&self, name: &str) -> Result<(), Self::Error> {
        let url = self.repo_url(["git", "refs", "tags", name]);
        let request = self.client.request(Method::DELETE, url);
        match self.send(request, || format!("tag {name:?}")).await {
            Err(Error::Api { status, .. }) if status == StatusCode::UNPROCESSABLE_ENTITY => {
                Err(Error::NotFound(format!("tag {name:?}")))
            }
            other => other.map(|_| ()),
        }
    }
}
