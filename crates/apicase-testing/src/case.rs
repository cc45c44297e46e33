//! One API test case: an in-process server, a clean database and the
//! fixture/expectation folders.

use std::future::Future;
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum_test::{TestRequest, TestResponse, TestServer};
use futures::FutureExt;
use http::StatusCode;
use serde::Serialize;
use tracing::debug;

use apicase_core::HarnessError;
use apicase_core::path::TestFolders;
use apicase_core::tracing::init_tracing;

use crate::assert;
use crate::expectation::ExpectationStore;
use crate::fixture::{FixtureSet, FixtureStore};

pub struct ApiTestCase<S: FixtureStore> {
    server: TestServer,
    store: Arc<S>,
    folders: TestFolders,
    fixtures: FixtureSet,
    expectations: ExpectationStore,
}

impl<S: FixtureStore> ApiTestCase<S> {
    /// Start `router` in-process and purge the database.
    pub async fn setup(router: Router, store: S, folders: TestFolders) -> Result<Self, HarnessError> {
        Self::with_shared_store(router, Arc::new(store), folders).await
    }

    async fn with_shared_store(
        router: Router,
        store: Arc<S>,
        folders: TestFolders,
    ) -> Result<Self, HarnessError> {
        init_tracing();
        let server = TestServer::new(router).map_err(HarnessError::Client)?;
        store.purge().await?;

        let fixtures = FixtureSet::new(folders.fixtures_folder());
        let expectations = ExpectationStore::from_folders(&folders);
        debug!(
            fixtures = %fixtures.folder().display(),
            expected_responses = %expectations.folder().display(),
            "test case ready"
        );
        Ok(Self {
            server,
            store,
            folders,
            fixtures,
            expectations,
        })
    }

    /// Purge the database.
    pub async fn teardown(self) -> Result<(), HarnessError> {
        self.store.purge().await
    }

    /// Set up a case, run `body` against it and purge the database afterwards,
    /// also when `body` panics. The panic is re-raised after the purge.
    pub async fn run<F, Fut, T>(
        router: Router,
        store: S,
        folders: TestFolders,
        body: F,
    ) -> Result<T, HarnessError>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = T>,
    {
        let store = Arc::new(store);
        let case = Self::with_shared_store(router, Arc::clone(&store), folders).await?;

        let outcome = AssertUnwindSafe(body(case)).catch_unwind().await;
        let purged = store.purge().await;
        match outcome {
            Ok(value) => purged.map(|()| value),
            Err(panic) => resume_unwind(panic),
        }
    }

    // ── Requests ────────────────────────────────────────────────────────────

    pub fn server(&self) -> &TestServer {
        &self.server
    }

    pub fn get(&self, path: &str) -> TestRequest {
        self.server.get(path)
    }

    pub fn post_json<B: Serialize>(&self, path: &str, body: &B) -> TestRequest {
        self.server.post(path).json(body)
    }

    pub fn put_json<B: Serialize>(&self, path: &str, body: &B) -> TestRequest {
        self.server.put(path).json(body)
    }

    pub fn patch_json<B: Serialize>(&self, path: &str, body: &B) -> TestRequest {
        self.server.patch(path).json(body)
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        self.server.delete(path)
    }

    // ── Fixtures ────────────────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn folders(&self) -> &TestFolders {
        &self.folders
    }

    pub fn fixtures_folder(&self) -> &Path {
        self.fixtures.folder()
    }

    pub fn add_fixture_files<I, P>(&mut self, sources: I) -> Result<(), HarnessError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.fixtures.add_fixture_files(sources)
    }

    pub async fn persist_fixtures(&mut self) -> Result<usize, HarnessError> {
        self.fixtures.persist_fixtures(self.store.as_ref()).await
    }

    pub async fn load_fixtures_from_directory(&self, source: &str) -> Result<usize, HarnessError> {
        self.fixtures
            .load_fixtures_from_directory(self.store.as_ref(), source)
            .await
    }

    // ── Expectations ────────────────────────────────────────────────────────

    pub fn expectations(&self) -> &ExpectationStore {
        &self.expectations
    }

    #[track_caller]
    pub fn assert_response(&self, response: &TestResponse, name: &str, status: StatusCode) {
        assert::assert_response(response, &self.expectations, name, status);
    }

    #[track_caller]
    pub fn assert_response_content(&self, response: &TestResponse, name: &str) {
        assert::assert_json_response_content(response, &self.expectations, name);
    }
}
