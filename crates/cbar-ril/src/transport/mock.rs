//! Mock command channel simulating a network's barring service

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cbar_core::{
    is_valid_password, BarringCategory, ChannelError, ChannelRequest, CommandChannel, Password,
    RawResponse,
};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::config::{ConfigError, MockConfig};
use crate::facility::facility_code;

/// A canned reaction for the next request, overriding the simulation
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Reply with this response
    Respond(RawResponse),
    /// Never reply
    Hang,
}

/// Simulated network
///
/// Outgoing categories are mutually exclusive, as are incoming ones;
/// deactivating `AllBarring` clears everything. Responses can be overridden
/// one request at a time with [`MockChannel::push_script`].
pub struct MockChannel {
    config: MockConfig,
    radio_on: AtomicBool,
    password: RwLock<String>,
    active: RwLock<HashSet<BarringCategory>>,
    script: Mutex<VecDeque<Scripted>>,
    history: RwLock<Vec<ChannelRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockChannel {
    pub fn new(config: &MockConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let active = config.active_categories()?;
        Ok(Self {
            config: config.clone(),
            radio_on: AtomicBool::new(config.radio_on),
            password: RwLock::new(config.password.clone()),
            active: RwLock::new(active),
            script: Mutex::new(VecDeque::new()),
            history: RwLock::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Subscription (SIM slot) this channel serves
    pub fn subscription(&self) -> u8 {
        self.config.subscription
    }

    /// Toggle radio power (airplane mode)
    pub fn set_radio_on(&self, on: bool) {
        self.radio_on.store(on, Ordering::SeqCst);
    }

    /// Queue a canned reaction for the next request
    pub fn push_script(&self, scripted: Scripted) {
        self.script.lock().push_back(scripted);
    }

    /// Replace the network-side barring table
    pub fn set_active(&self, categories: impl IntoIterator<Item = BarringCategory>) {
        *self.active.write() = categories.into_iter().collect();
    }

    /// Whether a category is active on the simulated network
    pub fn is_active(&self, category: BarringCategory) -> bool {
        self.active.read().contains(&category)
    }

    /// Current network-side password
    pub fn network_password(&self) -> String {
        self.password.read().clone()
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<ChannelRequest> {
        self.history.read().clone()
    }

    /// Categories queried so far, in arrival order
    pub fn queried_categories(&self) -> Vec<BarringCategory> {
        self.history
            .read()
            .iter()
            .filter_map(|r| match r {
                ChannelRequest::Query { category } => Some(*category),
                _ => None,
            })
            .collect()
    }

    /// Highest number of requests that were in flight at the same time
    pub fn max_concurrent_requests(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn handle(&self, request: ChannelRequest) -> RawResponse {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        debug!(
            facility = facility_code(request.category()),
            subscription = self.config.subscription,
            "Mock channel: request"
        );
        self.history.write().push(request.clone());

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(Scripted::Respond(raw)) => return raw,
            Some(Scripted::Hang) => std::future::pending::<()>().await,
            None => {}
        }

        if !self.radio_on.load(Ordering::SeqCst) {
            return RawResponse::exception(ChannelError::RadioNotAvailable);
        }

        self.simulate(&request)
    }

    fn simulate(&self, request: &ChannelRequest) -> RawResponse {
        match request {
            ChannelRequest::Query { category } => {
                let active = self.active.read();
                let enabled = match category {
                    BarringCategory::AllBarring => !active.is_empty(),
                    c => active.contains(c),
                };
                RawResponse::status(enabled)
            }
            ChannelRequest::Set {
                category,
                enable,
                password,
            } => {
                if !self.password_matches(password) {
                    return RawResponse::exception(ChannelError::IncorrectPassword);
                }
                let mut active = self.active.write();
                match (category.direction(), enable) {
                    (None, false) => active.clear(),
                    (None, true) => {
                        return RawResponse::exception(ChannelError::UnsupportedFacility(
                            facility_code(*category).to_string(),
                        ))
                    }
                    (Some(direction), true) => {
                        active.retain(|c| c.direction() != Some(direction));
                        active.insert(*category);
                    }
                    (Some(_), false) => {
                        active.remove(category);
                    }
                }
                RawResponse::ack()
            }
            ChannelRequest::ChangePassword { old, new, .. } => {
                if !self.password_matches(old) {
                    return RawResponse::exception(ChannelError::IncorrectPassword);
                }
                if !is_valid_password(new.expose()) {
                    return RawResponse::exception(ChannelError::CommandFailed(
                        "new password rejected".to_string(),
                    ));
                }
                *self.password.write() = new.expose().to_string();
                RawResponse::ack()
            }
        }
    }

    fn password_matches(&self, password: &Password) -> bool {
        *self.password.read() == password.expose()
    }
}

#[async_trait]
impl CommandChannel for MockChannel {
    async fn query_barring_status(&self, category: BarringCategory) -> RawResponse {
        self.handle(ChannelRequest::Query { category }).await
    }

    async fn set_barring_status(
        &self,
        category: BarringCategory,
        enable: bool,
        password: &Password,
    ) -> RawResponse {
        self.handle(ChannelRequest::Set {
            category,
            enable,
            password: password.clone(),
        })
        .await
    }

    async fn change_password(
        &self,
        category: BarringCategory,
        old: &Password,
        new: &Password,
    ) -> RawResponse {
        self.handle(ChannelRequest::ChangePassword {
            category,
            old: old.clone(),
            new: new.clone(),
        })
        .await
    }

    async fn radio_available(&self) -> bool {
        self.radio_on.load(Ordering::SeqCst)
    }
}
