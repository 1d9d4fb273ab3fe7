//! Scripted scenarios against a fresh service.
//!
//! A script logs officers in, files applications and then plays officer
//! actions in order. Aliases stand in for generated ids. A failing step is
//! recorded and the replay carries on; a step may name the failure kind it
//! expects.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use verification::{checklist_items, GeoTag, TaskDecision, TaskKind, VerificationTask};

use crate::application::{Application, NewApplication, StateReview};
use crate::audit::{AuditEntry, AuditStats};
use crate::authority::AuthorityRole;
use crate::config::PipelineConfig;
use crate::events::{FanoutEventSink, LifecycleEvent, MemoryEventSink, TracingEventSink};
use crate::evidence::{EvidenceStore, EvidenceUpload, MemoryEvidenceStore};
use crate::service::ApprovalService;
use crate::session::{IdentityProvider, SessionStore};
use crate::types::{EntityKind, PipelineError, Result};

fn default_true() -> bool {
    true
}

fn default_content_type() -> String {
    "image/jpeg".to_string()
}

/// An officer who completed the identity ceremony.
#[derive(Debug, Clone, Deserialize)]
pub struct OfficerLogin {
    pub id: String,
    pub role: AuthorityRole,
    #[serde(default = "default_true")]
    pub second_factor: bool,
}

/// One officer action.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum Action {
    CreateTask {
        application: String,
        kind: TaskKind,
        /// Alias later steps use for the task
        task: String,
    },
    Checklist {
        task: String,
        item: String,
        #[serde(default = "default_true")]
        confirmed: bool,
    },
    /// Confirm every checklist item of the task's kind
    ConfirmChecklist { task: String },
    Evidence {
        task: String,
        /// Captured bytes, as text
        content: String,
        #[serde(default = "default_content_type")]
        content_type: String,
        visit_date: NaiveDate,
        latitude: f64,
        longitude: f64,
    },
    Score {
        task: String,
        answers: BTreeMap<String, usize>,
    },
    Decide {
        task: String,
        decision: TaskDecision,
        remarks: String,
    },
    Submit { task: String },
    Forward { application: String },
    StateReview {
        application: String,
        #[serde(default = "default_true")]
        acknowledge: bool,
        #[serde(default)]
        reason: String,
    },
    Consent { application: String, approved: bool },
    Release {
        application: String,
        /// Installment number; the next one due when omitted
        #[serde(default)]
        installment: Option<u8>,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTask { .. } => "create_task",
            Self::Checklist { .. } => "checklist",
            Self::ConfirmChecklist { .. } => "confirm_checklist",
            Self::Evidence { .. } => "evidence",
            Self::Score { .. } => "score",
            Self::Decide { .. } => "decide",
            Self::Submit { .. } => "submit",
            Self::Forward { .. } => "forward",
            Self::StateReview { .. } => "state_review",
            Self::Consent { .. } => "consent",
            Self::Release { .. } => "release",
        }
    }
}

/// A step: who acts, what they do, and optionally how it should fail.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub officer: String,
    #[serde(flatten)]
    pub action: Action,
    /// Expected failure kind, e.g. `schedule_exhausted`
    #[serde(default)]
    pub expect: Option<String>,
}

/// A complete scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Overrides the configuration the replay was started with
    #[serde(default)]
    pub config: Option<PipelineConfig>,
    pub officers: Vec<OfficerLogin>,
    /// Applications keyed by alias
    pub applications: BTreeMap<String, NewApplication>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| PipelineError::Config(e.to_string()))
    }
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub officer: String,
    pub action: &'static str,
    /// Failure kind, if the step failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the outcome matched the step's expectation
    pub as_expected: bool,
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepOutcome>,
    pub applications: BTreeMap<String, Application>,
    pub tasks: BTreeMap<String, VerificationTask>,
    pub events: Vec<LifecycleEvent>,
    pub audit: AuditStats,
    /// Audited calls that targeted each application, newest first
    pub audit_trail: BTreeMap<String, Vec<AuditEntry>>,
}

impl ReplayReport {
    /// Steps whose outcome differed from what the script expected.
    pub fn unexpected(&self) -> Vec<&StepOutcome> {
        self.steps.iter().filter(|s| !s.as_expected).collect()
    }
}

struct Replay {
    service: ApprovalService,
    sessions: SessionStore,
    evidence: MemoryEvidenceStore,
    tokens: HashMap<String, String>,
    applications: BTreeMap<String, String>,
    tasks: BTreeMap<String, String>,
}

/// Run a script and collect the outcome.
pub async fn run(script: Script, config: PipelineConfig) -> Result<ReplayReport> {
    let config = script.config.clone().unwrap_or(config);
    let recorder = Arc::new(MemoryEventSink::new());
    let sink = FanoutEventSink::new()
        .with(recorder.clone())
        .with(Arc::new(TracingEventSink));

    let mut replay = Replay {
        sessions: SessionStore::new(Duration::from_secs(config.authority.session_ttl_secs)),
        service: ApprovalService::new(config, Arc::new(sink))?,
        evidence: MemoryEvidenceStore::new(),
        tokens: HashMap::new(),
        applications: BTreeMap::new(),
        tasks: BTreeMap::new(),
    };

    for officer in &script.officers {
        let token = replay
            .sessions
            .open_session(officer.id.as_str(), officer.role, officer.second_factor)?;
        replay.tokens.insert(officer.id.clone(), token);
    }

    for (alias, new) in script.applications {
        let id = replay.service.submit_application(new).await?;
        replay.applications.insert(alias, id);
    }

    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.into_iter().enumerate() {
        let action = step.action.name();
        let result = replay.apply(&step).await;
        let error_kind = result.as_ref().err().map(|e| e.kind().to_string());
        let as_expected = error_kind == step.expect;
        if !as_expected {
            warn!(index, action, expected = ?step.expect, actual = ?error_kind, "Unexpected step outcome");
        }
        steps.push(StepOutcome {
            index,
            officer: step.officer,
            action,
            error: result.err().map(|e| e.to_string()),
            error_kind,
            as_expected,
        });
    }

    let mut applications = BTreeMap::new();
    let mut audit_trail = BTreeMap::new();
    for (alias, id) in &replay.applications {
        applications.insert(alias.clone(), replay.service.get_application_state(id).await?);
        audit_trail.insert(alias.clone(), replay.service.audit().for_target(id).await);
    }
    let mut tasks = BTreeMap::new();
    for (alias, id) in &replay.tasks {
        tasks.insert(alias.clone(), replay.service.get_task_state(id).await?);
    }

    let report = ReplayReport {
        steps,
        applications,
        tasks,
        events: recorder.events(),
        audit: replay.service.audit().stats().await,
        audit_trail,
    };
    info!(
        steps = report.steps.len(),
        unexpected = report.unexpected().len(),
        events = report.events.len(),
        "Replay finished"
    );
    Ok(report)
}

impl Replay {
    async fn apply(&mut self, step: &Step) -> Result<()> {
        let token = self
            .tokens
            .get(&step.officer)
            .ok_or_else(|| PipelineError::NotFound {
                kind: EntityKind::Session,
                id: step.officer.clone(),
            })?;
        let caller = self.sessions.resolve(token).await?;
        let service = &self.service;

        match &step.action {
            Action::CreateTask {
                application,
                kind,
                task,
            } => {
                let id = service
                    .create_verification_task(&caller, self.application(application)?, *kind)
                    .await?;
                self.tasks.insert(task.clone(), id);
            }
            Action::Checklist {
                task,
                item,
                confirmed,
            } => {
                service
                    .record_checklist_item(&caller, self.task(task)?, item, *confirmed)
                    .await?
            }
            Action::ConfirmChecklist { task } => {
                let task_id = self.task(task)?;
                let kind = service.get_task_state(task_id).await?.kind;
                for item in checklist_items(kind) {
                    service
                        .record_checklist_item(&caller, task_id, item, true)
                        .await?;
                }
            }
            Action::Evidence {
                task,
                content,
                content_type,
                visit_date,
                latitude,
                longitude,
            } => {
                let artifact = self
                    .evidence
                    .put(EvidenceUpload {
                        content_type: content_type.clone(),
                        bytes: content.as_bytes().to_vec(),
                        captured_at: Utc::now(),
                        geo_tag: GeoTag {
                            latitude: *latitude,
                            longitude: *longitude,
                        },
                    })
                    .await?;
                service
                    .record_evidence(&caller, self.task(task)?, artifact, *visit_date)
                    .await?
            }
            Action::Score { task, answers } => {
                let task_id = self.task(task)?;
                for (indicator_id, option_index) in answers {
                    service
                        .record_score(&caller, task_id, indicator_id, *option_index)
                        .await?;
                }
            }
            Action::Decide {
                task,
                decision,
                remarks,
            } => {
                service
                    .record_decision(&caller, self.task(task)?, *decision, remarks)
                    .await?
            }
            Action::Submit { task } => {
                service.submit_task(&caller, self.task(task)?).await?;
            }
            Action::Forward { application } => {
                service
                    .forward_to_state(&caller, self.application(application)?)
                    .await?
            }
            Action::StateReview {
                application,
                acknowledge,
                reason,
            } => {
                let review = if *acknowledge {
                    StateReview::Acknowledge
                } else {
                    StateReview::Reject {
                        reason: reason.clone(),
                    }
                };
                service
                    .record_state_review(&caller, self.application(application)?, review)
                    .await?
            }
            Action::Consent {
                application,
                approved,
            } => {
                service
                    .record_consent(&caller, self.application(application)?, *approved)
                    .await?
            }
            Action::Release {
                application,
                installment,
            } => {
                let application_id = self.application(application)?;
                match installment {
                    Some(n) => service.record_fund_release(&caller, application_id, *n).await?,
                    None => service.release_installment(&caller, application_id).await?,
                };
            }
        }
        Ok(())
    }

    fn application(&self, alias: &str) -> Result<&str> {
        self.applications
            .get(alias)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::NotFound {
                kind: EntityKind::Application,
                id: alias.to_string(),
            })
    }

    fn task(&self, alias: &str) -> Result<&str> {
        self.tasks
            .get(alias)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::NotFound {
                kind: EntityKind::VerificationTask,
                id: alias.to_string(),
            })
    }
}
