//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use agentcfg::{
    build, ConfigRecord, DocumentStore, Page, QueryDispatcher, ReadinessState, RefreshScheduler,
    RefreshSettings, ServiceMatcher, UpstreamError,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

struct Scripted {
    delay: Duration,
    result: Result<Page, UpstreamError>,
}

/// In-memory document store that replays a queue of responses.
///
/// Once the queue is drained every request answers with an empty page, so a
/// scheduler keeps cycling without errors.
#[derive(Default)]
pub struct ScriptedStore {
    script: Mutex<VecDeque<Scripted>>,
    opens: Mutex<Vec<Instant>>,
    continues: Mutex<Vec<String>>,
    releases: Mutex<Vec<String>>,
    release_delay: Mutex<Duration>,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, delay: Duration, result: Result<Page, UpstreamError>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted { delay, result });
    }

    pub fn push_page(&self, cursor: &str, records: Vec<ConfigRecord>) {
        self.push(Duration::ZERO, Ok(Page::new(cursor, records)));
    }

    pub fn push_delayed_page(&self, delay: Duration, cursor: &str, records: Vec<ConfigRecord>) {
        self.push(delay, Ok(Page::new(cursor, records)));
    }

    pub fn push_status(&self, status: u16) {
        self.push(Duration::ZERO, Err(UpstreamError::status(status, None)));
    }

    pub fn push_transport_error(&self) {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        self.push(Duration::ZERO, Err(UpstreamError::transport(io)));
    }

    /// Makes every later cursor release sleep for `delay` before answering.
    pub fn set_release_delay(&self, delay: Duration) {
        *self.release_delay.lock().unwrap() = delay;
    }

    /// When each cycle started, by the tokio clock.
    pub fn opens(&self) -> Vec<Instant> {
        self.opens.lock().unwrap().clone()
    }

    pub fn continues(&self) -> Vec<String> {
        self.continues.lock().unwrap().clone()
    }

    pub fn releases(&self) -> Vec<String> {
        self.releases.lock().unwrap().clone()
    }

    async fn next(&self) -> Result<Page, UpstreamError> {
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Scripted { delay, result }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(Page::new("exhausted", Vec::new())),
        }
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn open_cursor(
        &self,
        _page_size: usize,
        _keep_alive: Duration,
    ) -> Result<Page, UpstreamError> {
        self.opens.lock().unwrap().push(Instant::now());
        self.next().await
    }

    async fn continue_cursor(
        &self,
        cursor: &str,
        _keep_alive: Duration,
    ) -> Result<Page, UpstreamError> {
        self.continues.lock().unwrap().push(cursor.to_string());
        self.next().await
    }

    async fn release_cursor(&self, cursor: &str) -> Result<(), UpstreamError> {
        self.releases.lock().unwrap().push(cursor.to_string());
        let delay = *self.release_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

pub type Engine = (
    RefreshScheduler<Arc<ScriptedStore>>,
    QueryDispatcher<ServiceMatcher>,
);

pub fn settings(interval: Duration, timeout: Duration) -> RefreshSettings {
    RefreshSettings {
        interval,
        timeout,
        page_size: 2,
    }
}

pub fn engine(store: &Arc<ScriptedStore>, settings: &RefreshSettings) -> Engine {
    build(Arc::clone(store), settings, ServiceMatcher)
}

pub fn record(name: &str, etag: &str) -> ConfigRecord {
    ConfigRecord::new(name, "", etag)
}

/// Polls until the dispatcher reaches `state`, advancing the tokio clock.
pub async fn wait_for_state(dispatcher: &QueryDispatcher<ServiceMatcher>, state: ReadinessState) {
    for _ in 0..10_000 {
        if dispatcher.state() == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("dispatcher never reached {state:?}");
}
