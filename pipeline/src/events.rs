//! Lifecycle events and where they go.
//!
//! Events are published only after a transition has been committed and the
//! application lock released. Sinks never block and never fail a transition.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use verification::{TaskDecision, TaskKind};

use crate::application::ApplicationStatus;
use crate::authority::AuthorityRole;
use crate::config::EventsConfig;

/// Something observable happened to an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum LifecycleEvent {
    /// A verification task was submitted
    VerificationCompleted {
        application_id: String,
        task_id: String,
        kind: TaskKind,
        decision: TaskDecision,
        at: DateTime<Utc>,
    },
    ApplicationStateChanged {
        application_id: String,
        from: ApplicationStatus,
        to: ApplicationStatus,
        authority: AuthorityRole,
        officer_id: String,
        at: DateTime<Utc>,
    },
    InstallmentReleased {
        application_id: String,
        installment: u8,
        percentage: u8,
        amount: u64,
        at: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    pub fn application_id(&self) -> &str {
        match self {
            Self::VerificationCompleted { application_id, .. }
            | Self::ApplicationStateChanged { application_id, .. }
            | Self::InstallmentReleased { application_id, .. } => application_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::VerificationCompleted { .. } => "verification_completed",
            Self::ApplicationStateChanged { .. } => "application_state_changed",
            Self::InstallmentReleased { .. } => "installment_released",
        }
    }
}

/// Receives committed lifecycle events.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: LifecycleEvent);
}

/// Fans events out to any number of subscribers over a tokio broadcast channel.
pub struct BroadcastEventSink {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: LifecycleEvent) {
        let name = event.name();
        // Err only means nobody is listening
        if self.sender.send(event).is_err() {
            debug!(event = name, "No subscribers for lifecycle event");
        }
    }
}

/// Keeps every event in memory, in publication order.
#[derive(Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events concerning one application.
    pub fn events_for(&self, application_id: &str) -> Vec<LifecycleEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.application_id() == application_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemoryEventSink {
    fn publish(&self, event: LifecycleEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Forwards every event to each inner sink, in order.
#[derive(Default)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutEventSink {
    fn publish(&self, event: LifecycleEvent) {
        for sink in &self.sinks {
            sink.publish(event.clone());
        }
    }
}

/// Writes events to the log and nowhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: LifecycleEvent) {
        match &event {
            LifecycleEvent::VerificationCompleted {
                application_id,
                task_id,
                kind,
                decision,
                ..
            } => info!(%application_id, %task_id, %kind, %decision, "Verification completed"),
            LifecycleEvent::ApplicationStateChanged {
                application_id,
                from,
                to,
                authority,
                officer_id,
                ..
            } => info!(%application_id, %from, %to, %authority, %officer_id, "Application state changed"),
            LifecycleEvent::InstallmentReleased {
                application_id,
                installment,
                percentage,
                amount,
                ..
            } => info!(%application_id, installment, percentage, amount, "Installment released"),
        }
    }
}
