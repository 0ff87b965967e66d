//! Protected-resource fetch with a single refresh-and-retry.

use std::sync::Arc;

use crate::error::PipelineError;
use crate::traits::{FetchFailure, ResourceApi, TokenRefresher};
use crate::types::{ResourceSnapshot, TokenSet};

/// Message returned when the account has no channel.
pub const NO_RESOURCE_MESSAGE: &str = "No YouTube channel found.";

/// Fetches a [`ResourceSnapshot`], refreshing the access token at most once.
///
/// On an authorization failure, and only when a refresh token is present,
/// exactly one refresh call is made and the fetch is retried once. Any
/// failure after that is terminal.
#[derive(Clone)]
pub struct ResourceFetcher {
    api: Arc<dyn ResourceApi>,
    refresher: Arc<dyn TokenRefresher>,
}

impl ResourceFetcher {
    /// Creates a fetcher over the given resource API and refresher.
    #[must_use]
    pub fn new(api: Arc<dyn ResourceApi>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self { api, refresher }
    }

    /// Fetches the snapshot. On refresh, `tokens` is updated in place so the
    /// caller proceeds with the live access token.
    ///
    /// # Errors
    ///
    /// - `NoResource` if the account has no resource
    /// - `ResourceFetch` for any other failure, including a failed refresh
    pub async fn fetch(&self, tokens: &mut TokenSet) -> Result<ResourceSnapshot, PipelineError> {
        let reason = match self.api.fetch_snapshot(&tokens.access_token).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(FetchFailure::Unauthorized(reason)) => reason,
            Err(other) => return Err(Self::classify(other)),
        };

        let refresh_token = match &tokens.refresh_token {
            Some(token) if tokens.can_refresh() => token.clone(),
            _ => {
                return Err(PipelineError::resource_fetch(format!(
                    "Failed to fetch YouTube channel: {reason}; no refresh token available."
                )));
            }
        };

        tracing::debug!(%reason, "Access token rejected, refreshing once");

        let refreshed = self
            .refresher
            .refresh(&refresh_token)
            .await
            .map_err(|e| {
                PipelineError::resource_fetch(format!(
                    "Failed to fetch YouTube channel: token refresh failed: {e}"
                ))
            })?;
        tokens.absorb_refresh(refreshed);

        self.api
            .fetch_snapshot(&tokens.access_token)
            .await
            .map_err(Self::classify)
    }

    fn classify(failure: FetchFailure) -> PipelineError {
        match failure {
            FetchFailure::NoResource => PipelineError::no_resource(NO_RESOURCE_MESSAGE),
            FetchFailure::Unauthorized(reason) | FetchFailure::Failed(reason) => {
                PipelineError::resource_fetch(format!("Failed to fetch YouTube channel: {reason}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::ErrorKind;

    /// Replays a scripted sequence of responses and records the tokens used.
    struct ScriptedApi {
        responses: Mutex<VecDeque<Result<ResourceSnapshot, FetchFailure>>>,
        seen_tokens: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<Result<ResourceSnapshot, FetchFailure>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                seen_tokens: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen_tokens.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceApi for ScriptedApi {
        async fn fetch_snapshot(
            &self,
            access_token: &str,
        ) -> Result<ResourceSnapshot, FetchFailure> {
            self.seen_tokens.lock().unwrap().push(access_token.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchFailure::Failed("script exhausted".into())))
        }
    }

    struct CountingRefresher {
        calls: AtomicUsize,
        result: Result<TokenSet, PipelineError>,
    }

    impl CountingRefresher {
        fn ok(access: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(TokenSet::new(access)),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(PipelineError::token("invalid_grant")),
            }
        }
    }

    #[async_trait]
    impl TokenRefresher for CountingRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<TokenSet, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn snapshot() -> ResourceSnapshot {
        ResourceSnapshot::new("UC1", "Chan")
    }

    #[tokio::test]
    async fn test_fetch_success_without_refresh() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(snapshot())]));
        let refresher = Arc::new(CountingRefresher::ok("tok2"));
        let fetcher = ResourceFetcher::new(api.clone(), refresher.clone());

        let mut tokens = TokenSet::new("tok1").with_refresh_token("ref1");
        let result = fetcher.fetch(&mut tokens).await.unwrap();

        assert_eq!(result.id, "UC1");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.seen(), vec!["tok1"]);
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_exactly_once() {
        let api = Arc::new(ScriptedApi::new(vec![
            Err(FetchFailure::Unauthorized("401".into())),
            Ok(snapshot()),
        ]));
        let refresher = Arc::new(CountingRefresher::ok("tok2"));
        let fetcher = ResourceFetcher::new(api.clone(), refresher.clone());

        let mut tokens = TokenSet::new("tok1").with_refresh_token("ref1");
        let result = fetcher.fetch(&mut tokens).await.unwrap();

        assert_eq!(result.title, "Chan");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.seen(), vec!["tok1", "tok2"]);
        assert_eq!(tokens.access_token, "tok2");
        assert_eq!(tokens.refresh_token.as_deref(), Some("ref1"));
    }

    #[tokio::test]
    async fn test_second_failure_is_terminal() {
        let api = Arc::new(ScriptedApi::new(vec![
            Err(FetchFailure::Unauthorized("401".into())),
            Err(FetchFailure::Unauthorized("401 again".into())),
            Ok(snapshot()),
        ]));
        let refresher = Arc::new(CountingRefresher::ok("tok2"));
        let fetcher = ResourceFetcher::new(api.clone(), refresher.clone());

        let mut tokens = TokenSet::new("tok1").with_refresh_token("ref1");
        let err = fetcher.fetch(&mut tokens).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ResourceFetch);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_without_refresh_token() {
        let api = Arc::new(ScriptedApi::new(vec![Err(FetchFailure::Unauthorized(
            "401".into(),
        ))]));
        let refresher = Arc::new(CountingRefresher::ok("tok2"));
        let fetcher = ResourceFetcher::new(api.clone(), refresher.clone());

        let mut tokens = TokenSet::new("tok1");
        let err = fetcher.fetch(&mut tokens).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ResourceFetch);
        assert!(err.to_string().contains("no refresh token"));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_resource_fetch_error() {
        let api = Arc::new(ScriptedApi::new(vec![Err(FetchFailure::Unauthorized(
            "401".into(),
        ))]));
        let refresher = Arc::new(CountingRefresher::failing());
        let fetcher = ResourceFetcher::new(api.clone(), refresher.clone());

        let mut tokens = TokenSet::new("tok1").with_refresh_token("ref1");
        let err = fetcher.fetch(&mut tokens).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ResourceFetch);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.seen().len(), 1);
        assert_eq!(tokens.access_token, "tok1");
    }

    #[tokio::test]
    async fn test_no_resource() {
        let api = Arc::new(ScriptedApi::new(vec![Err(FetchFailure::NoResource)]));
        let refresher = Arc::new(CountingRefresher::ok("tok2"));
        let fetcher = ResourceFetcher::new(api, refresher.clone());

        let mut tokens = TokenSet::new("tok1").with_refresh_token("ref1");
        let err = fetcher.fetch(&mut tokens).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoResource);
        assert_eq!(err.to_string(), NO_RESOURCE_MESSAGE);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_resource_after_refresh() {
        let api = Arc::new(ScriptedApi::new(vec![
            Err(FetchFailure::Unauthorized("401".into())),
            Err(FetchFailure::NoResource),
        ]));
        let refresher = Arc::new(CountingRefresher::ok("tok2"));
        let fetcher = ResourceFetcher::new(api, refresher);

        let mut tokens = TokenSet::new("tok1").with_refresh_token("ref1");
        let err = fetcher.fetch(&mut tokens).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoResource);
    }
}
