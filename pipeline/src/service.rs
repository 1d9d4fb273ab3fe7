//! The approval service: single source of truth for applications and tasks.
//!
//! Each application lives with its verification tasks behind one `RwLock`.
//! A mutating call takes the write lock of exactly one application, applies
//! the operation to a draft copy and commits the draft only if every step
//! succeeded. Events are published after the lock is released.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use indicators::{Assessment, IndicatorCatalog, ScoringEngine};
use verification::{EvidenceArtifact, Progress, TaskDecision, TaskKind, TaskStatus, VerificationTask};

use crate::application::{
    Application, ApplicationStatus, Eligibility, NewApplication, StateChange, StateReview,
};
use crate::audit::{AuditEntry, AuditLog, AuditOutcome};
use crate::authority::{authorize, authorize_assignee, Caller, Operation};
use crate::config::{PipelineConfig, VerificationConfig};
use crate::events::{EventSink, LifecycleEvent};
use crate::funding::FundReleaseRecord;
use crate::types::{PipelineError, Result};

/// An application and everything recorded against it.
#[derive(Debug, Clone)]
struct ApplicationEntry {
    application: Application,
    tasks: BTreeMap<String, VerificationTask>,
}

impl ApplicationEntry {
    /// Resolve a task for writing by `caller`.
    fn task_for_write(
        &mut self,
        caller: &Caller,
        operation: Operation,
        task_id: &str,
    ) -> Result<&mut VerificationTask> {
        let application = &self.application;
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| PipelineError::task_not_found(task_id))?;

        authorize_assignee(caller, operation, &task.assigned_officer)?;
        if !task.is_open() {
            return Err(PipelineError::AlreadySubmitted {
                task_id: task.id.clone(),
            });
        }
        application.ensure_active(operation)?;
        Ok(task)
    }

    fn started(&mut self, progress: Progress, caller: &Caller) {
        if progress == Progress::Started {
            self.application.verification_started(caller);
        }
    }

    /// Move the application on after a task was submitted.
    fn settle_verification(
        &mut self,
        decision: TaskDecision,
        caller: &Caller,
        required: &VerificationConfig,
    ) -> Result<()> {
        if !decision.is_positive() {
            return self
                .application
                .complete_verification(Eligibility::NotEligible, caller);
        }

        let any_open = self.tasks.values().any(VerificationTask::is_open);
        let all_required = required.required_kinds.iter().all(|kind| {
            self.tasks.values().any(|task| {
                task.kind == *kind
                    && task.status == TaskStatus::Submitted
                    && task.decision.is_some_and(|d| d.is_positive())
            })
        });

        if all_required && !any_open {
            self.application
                .complete_verification(Eligibility::Eligible, caller)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Application(&'a str),
    Task(&'a str),
}

impl<'a> Target<'a> {
    fn id(&self) -> &'a str {
        match self {
            Self::Application(id) | Self::Task(id) => id,
        }
    }
}

/// Multi-authority approval pipeline.
pub struct ApprovalService {
    config: PipelineConfig,
    engine: ScoringEngine,
    applications: DashMap<String, Arc<RwLock<ApplicationEntry>>>,
    /// Task id -> application id
    task_index: DashMap<String, String>,
    events: Arc<dyn EventSink>,
    audit: Arc<AuditLog>,
}

impl ApprovalService {
    /// Create a service over the standard indicator catalog.
    pub fn new(config: PipelineConfig, events: Arc<dyn EventSink>) -> Result<Self> {
        let catalog = IndicatorCatalog::standard()?;
        Self::with_catalog(config, Arc::new(catalog), events)
    }

    /// Create a service over a caller-supplied catalog.
    pub fn with_catalog(
        config: PipelineConfig,
        catalog: Arc<IndicatorCatalog>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        let threshold = config.scoring.eligibility_threshold;
        if threshold > catalog.max_total() {
            return Err(PipelineError::Config(format!(
                "eligibility_threshold {} exceeds catalog maximum {}",
                threshold,
                catalog.max_total()
            )));
        }

        info!(
            catalog = %catalog.fingerprint(),
            indicators = catalog.len(),
            threshold,
            required_kinds = ?config.verification.required_kinds,
            "Approval service initialized"
        );

        Ok(Self {
            engine: ScoringEngine::with_threshold(catalog, threshold),
            audit: Arc::new(AuditLog::with_max_entries(config.audit.max_entries)),
            config,
            applications: DashMap::new(),
            task_index: DashMap::new(),
            events,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &Arc<IndicatorCatalog> {
        self.engine.catalog()
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    // ========================================================================
    // Requester
    // ========================================================================

    /// Accept a new application. Needs no authority.
    pub async fn submit_application(&self, new: NewApplication) -> Result<String> {
        let result = Application::submit(new).map(|application| {
            let id = application.id.clone();
            info!(
                application_id = %id,
                village = %application.village,
                estimated_cost = application.estimated_cost,
                "Application submitted"
            );
            self.applications.insert(
                id.clone(),
                Arc::new(RwLock::new(ApplicationEntry {
                    application,
                    tasks: BTreeMap::new(),
                })),
            );
            (id, Vec::new())
        });

        let target = match &result {
            Ok((id, _)) => id.clone(),
            Err(_) => String::new(),
        };
        self.finish(Operation::SubmitApplication, None, &target, result)
            .await
    }

    // ========================================================================
    // IVA officer
    // ========================================================================

    /// Open a verification task assigned to the calling officer.
    pub async fn create_verification_task(
        &self,
        caller: &Caller,
        application_id: &str,
        kind: TaskKind,
    ) -> Result<String> {
        let operation = Operation::CreateVerificationTask;
        let task_id = self
            .mutate(operation, caller, Target::Application(application_id), |entry| {
                entry.application.ensure_active(operation)?;
                if let Some(open) = entry.tasks.values().find(|t| t.kind == kind && t.is_open()) {
                    return Err(PipelineError::TaskAlreadyOpen {
                        application_id: application_id.to_string(),
                        kind,
                        task_id: open.id.clone(),
                    });
                }
                entry.application.open_verification(caller)?;

                let task = VerificationTask::new(application_id, kind, caller.officer_id.as_str());
                let task_id = task.id.clone();
                entry.application.task_ids.push(task_id.clone());
                entry.tasks.insert(task_id.clone(), task);
                Ok((task_id, Vec::new()))
            })
            .await?;

        self.task_index
            .insert(task_id.clone(), application_id.to_string());
        Ok(task_id)
    }

    pub async fn record_checklist_item(
        &self,
        caller: &Caller,
        task_id: &str,
        item_id: &str,
        confirmed: bool,
    ) -> Result<()> {
        let operation = Operation::RecordChecklistItem;
        self.mutate(operation, caller, Target::Task(task_id), |entry| {
            let task = entry.task_for_write(caller, operation, task_id)?;
            let progress = task.record_checklist_item(item_id, confirmed)?;
            entry.started(progress, caller);
            Ok(((), Vec::new()))
        })
        .await
    }

    /// Attach an evidence reference obtained from the evidence store.
    pub async fn record_evidence(
        &self,
        caller: &Caller,
        task_id: &str,
        artifact: EvidenceArtifact,
        visit_date: NaiveDate,
    ) -> Result<()> {
        let operation = Operation::RecordEvidence;
        self.mutate(operation, caller, Target::Task(task_id), |entry| {
            let task = entry.task_for_write(caller, operation, task_id)?;
            let progress = task.record_evidence(artifact, visit_date)?;
            entry.started(progress, caller);
            Ok(((), Vec::new()))
        })
        .await
    }

    pub async fn record_score(
        &self,
        caller: &Caller,
        task_id: &str,
        indicator_id: &str,
        option_index: usize,
    ) -> Result<()> {
        let operation = Operation::RecordScore;
        let catalog = self.engine.catalog();
        self.mutate(operation, caller, Target::Task(task_id), |entry| {
            let task = entry.task_for_write(caller, operation, task_id)?;
            task.record_score(catalog, indicator_id, option_index)?;
            Ok(((), Vec::new()))
        })
        .await
    }

    pub async fn record_decision(
        &self,
        caller: &Caller,
        task_id: &str,
        decision: TaskDecision,
        remarks: &str,
    ) -> Result<()> {
        let operation = Operation::RecordDecision;
        self.mutate(operation, caller, Target::Task(task_id), |entry| {
            let task = entry.task_for_write(caller, operation, task_id)?;
            task.record_decision(decision, remarks)?;
            Ok(((), Vec::new()))
        })
        .await
    }

    /// Submit a task. A negative decision rejects the application; a positive
    /// one verifies it once every required kind has passed.
    pub async fn submit_task(&self, caller: &Caller, task_id: &str) -> Result<TaskDecision> {
        let operation = Operation::SubmitTask;
        self.mutate(operation, caller, Target::Task(task_id), |entry| {
            let task = entry.task_for_write(caller, operation, task_id)?;
            let decision = task.submit(&self.engine)?;
            let event = LifecycleEvent::VerificationCompleted {
                application_id: task.application_id.clone(),
                task_id: task.id.clone(),
                kind: task.kind,
                decision,
                at: Utc::now(),
            };

            entry.settle_verification(decision, caller, &self.config.verification)?;
            Ok((decision, vec![event]))
        })
        .await
    }

    pub async fn forward_to_state(&self, caller: &Caller, application_id: &str) -> Result<()> {
        self.mutate(
            Operation::ForwardToState,
            caller,
            Target::Application(application_id),
            |entry| {
                entry.application.forward_to_state(caller)?;
                Ok(((), Vec::new()))
            },
        )
        .await
    }

    // ========================================================================
    // State officer
    // ========================================================================

    pub async fn record_state_review(
        &self,
        caller: &Caller,
        application_id: &str,
        review: StateReview,
    ) -> Result<()> {
        self.mutate(
            Operation::RecordStateReview,
            caller,
            Target::Application(application_id),
            |entry| {
                entry.application.record_state_review(review, caller)?;
                Ok(((), Vec::new()))
            },
        )
        .await
    }

    // ========================================================================
    // Central officer
    // ========================================================================

    pub async fn record_consent(
        &self,
        caller: &Caller,
        application_id: &str,
        approved: bool,
    ) -> Result<()> {
        self.mutate(
            Operation::RecordConsent,
            caller,
            Target::Application(application_id),
            |entry| {
                entry.application.record_consent(approved, caller)?;
                Ok(((), Vec::new()))
            },
        )
        .await
    }

    /// Release the next installment due.
    pub async fn release_installment(
        &self,
        caller: &Caller,
        application_id: &str,
    ) -> Result<FundReleaseRecord> {
        self.release(caller, application_id, None).await
    }

    /// Release a named installment.
    pub async fn record_fund_release(
        &self,
        caller: &Caller,
        application_id: &str,
        installment: u8,
    ) -> Result<FundReleaseRecord> {
        self.release(caller, application_id, Some(installment)).await
    }

    async fn release(
        &self,
        caller: &Caller,
        application_id: &str,
        installment: Option<u8>,
    ) -> Result<FundReleaseRecord> {
        self.mutate(
            Operation::ReleaseInstallment,
            caller,
            Target::Application(application_id),
            |entry| {
                let record = entry.application.release_installment(installment, caller)?;
                let event = LifecycleEvent::InstallmentReleased {
                    application_id: application_id.to_string(),
                    installment: record.installment,
                    percentage: record.percentage,
                    amount: record.amount,
                    at: record.released_at,
                };
                Ok((record, vec![event]))
            },
        )
        .await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get_application_state(&self, application_id: &str) -> Result<Application> {
        let slot = self.slot(application_id)?;
        let entry = slot.read().await;
        debug!(%application_id, status = %entry.application.status, "Application read");
        Ok(entry.application.clone())
    }

    pub async fn get_task_state(&self, task_id: &str) -> Result<VerificationTask> {
        let slot = self.slot(&self.application_of(task_id)?)?;
        let entry = slot.read().await;
        entry
            .tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| PipelineError::task_not_found(task_id))
    }

    /// Tasks of an application, in creation order.
    pub async fn tasks_of(&self, application_id: &str) -> Result<Vec<VerificationTask>> {
        let slot = self.slot(application_id)?;
        let entry = slot.read().await;
        Ok(entry
            .application
            .task_ids
            .iter()
            .filter_map(|id| entry.tasks.get(id).cloned())
            .collect())
    }

    /// Score a task's sheet. A submitted task reports the assessment frozen
    /// at submission; an open one is scored as it stands.
    pub async fn assess_task(&self, task_id: &str) -> Result<Option<Assessment>> {
        let task = self.get_task_state(task_id).await?;
        if task.status == TaskStatus::Submitted {
            return Ok(task.assessment);
        }
        Ok(task.assess(&self.engine)?)
    }

    /// Snapshots of every application currently in `status`.
    pub async fn applications_in(&self, status: ApplicationStatus) -> Vec<Application> {
        let slots: Vec<Arc<RwLock<ApplicationEntry>>> = self
            .applications
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut matching = Vec::new();
        for slot in slots {
            let entry = slot.read().await;
            if entry.application.status == status {
                matching.push(entry.application.clone());
            }
        }
        matching.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        matching
    }

    pub fn application_count(&self) -> usize {
        self.applications.len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn slot(&self, application_id: &str) -> Result<Arc<RwLock<ApplicationEntry>>> {
        self.applications
            .get(application_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| PipelineError::application_not_found(application_id))
    }

    fn application_of(&self, task_id: &str) -> Result<String> {
        self.task_index
            .get(task_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| PipelineError::task_not_found(task_id))
    }

    /// Authorize, apply, audit and publish.
    async fn mutate<R, F>(
        &self,
        operation: Operation,
        caller: &Caller,
        target: Target<'_>,
        apply: F,
    ) -> Result<R>
    where
        F: FnOnce(&mut ApplicationEntry) -> Result<(R, Vec<LifecycleEvent>)>,
    {
        let result = self.commit(operation, caller, target, apply).await;
        self.finish(operation, Some(caller), target.id(), result)
            .await
    }

    async fn commit<R, F>(
        &self,
        operation: Operation,
        caller: &Caller,
        target: Target<'_>,
        apply: F,
    ) -> Result<(R, Vec<LifecycleEvent>)>
    where
        F: FnOnce(&mut ApplicationEntry) -> Result<(R, Vec<LifecycleEvent>)>,
    {
        authorize(
            caller,
            operation,
            self.config.authority.require_second_factor,
        )?;

        let application_id = match target {
            Target::Application(id) => id.to_string(),
            Target::Task(task_id) => self.application_of(task_id)?,
        };
        let slot = self.slot(&application_id)?;
        let mut entry = slot.write().await;

        let mut draft = entry.clone();
        let mark = draft.application.history.len();
        let (value, mut events) = apply(&mut draft)?;

        for change in &draft.application.history[mark..] {
            info!(
                %application_id,
                from = %change.from,
                to = %change.to,
                authority = %change.authority,
                officer_id = %change.officer_id,
                "Application transitioned"
            );
            events.push(state_changed(&application_id, change));
        }

        *entry = draft;
        Ok((value, events))
    }

    /// Log and audit the outcome, then publish events of a committed call.
    async fn finish<R>(
        &self,
        operation: Operation,
        caller: Option<&Caller>,
        target_id: &str,
        result: Result<(R, Vec<LifecycleEvent>)>,
    ) -> Result<R> {
        match &result {
            Ok(_) => debug!(%operation, %target_id, "Operation committed"),
            Err(err) => warn!(
                %operation,
                %target_id,
                officer_id = caller.map(|c| c.officer_id.as_str()).unwrap_or("-"),
                kind = err.kind(),
                error = %err,
                "Operation refused"
            ),
        }

        if self.config.audit.enabled {
            self.audit
                .record(AuditEntry::new(
                    operation,
                    caller,
                    target_id,
                    AuditOutcome::from_result(&result),
                ))
                .await;
        }

        let (value, events) = result?;
        for event in events {
            self.events.publish(event);
        }
        Ok(value)
    }
}

fn state_changed(application_id: &str, change: &StateChange) -> LifecycleEvent {
    LifecycleEvent::ApplicationStateChanged {
        application_id: application_id.to_string(),
        from: change.from,
        to: change.to,
        authority: change.authority,
        officer_id: change.officer_id.clone(),
        at: change.at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::AuthorityRole;
    use crate::events::MemoryEventSink;
    use verification::{checklist_items, GeoTag};

    struct Fixture {
        service: ApprovalService,
        sink: Arc<MemoryEventSink>,
        iva: Caller,
    }

    fn fixture_with(config: PipelineConfig) -> Fixture {
        let sink = Arc::new(MemoryEventSink::new());
        let service = ApprovalService::new(config, sink.clone()).unwrap();
        Fixture {
            service,
            sink,
            iva: Caller::new("iva-1", AuthorityRole::IvaOfficer),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(PipelineConfig::default())
    }

    fn new_application() -> NewApplication {
        NewApplication {
            village: "Sonpur".to_string(),
            block: "Manjhi".to_string(),
            district: "Saran".to_string(),
            state: "Bihar".to_string(),
            requester: "Sonpur Gram Panchayat".to_string(),
            estimated_cost: 20_00_000,
            description: "Drainage and community hall".to_string(),
        }
    }

    fn artifact() -> EvidenceArtifact {
        EvidenceArtifact::new(
            "sha256-abc",
            Utc::now(),
            GeoTag {
                latitude: 25.78,
                longitude: 84.73,
            },
        )
    }

    fn visit() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 9).unwrap()
    }

    /// Fill every field of a task so it can be submitted.
    async fn complete_task(f: &Fixture, task_id: &str, kind: TaskKind, decision: TaskDecision) {
        for item in checklist_items(kind) {
            f.service
                .record_checklist_item(&f.iva, task_id, item, true)
                .await
                .unwrap();
        }
        f.service
            .record_evidence(&f.iva, task_id, artifact(), visit())
            .await
            .unwrap();
        if kind.requires_scoring() {
            let ids: Vec<String> = f
                .service
                .catalog()
                .indicators()
                .iter()
                .map(|i| i.id.clone())
                .collect();
            for id in ids {
                f.service.record_score(&f.iva, task_id, &id, 0).await.unwrap();
            }
        }
        f.service
            .record_decision(&f.iva, task_id, decision, "Inspected with the sarpanch")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_task_creation_moves_application() {
        let f = fixture();
        let app_id = f.service.submit_application(new_application()).await.unwrap();
        let task_id = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Village)
            .await
            .unwrap();

        let app = f.service.get_application_state(&app_id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::AwaitingVerification);
        assert_eq!(app.task_ids, vec![task_id.clone()]);

        let task = f.service.get_task_state(&task_id).await.unwrap();
        assert_eq!(task.assigned_officer, "iva-1");
        assert_eq!(task.status, TaskStatus::Assigned);

        let err = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Village)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "task_already_open");
    }

    #[tokio::test]
    async fn test_first_field_write_starts_verification() {
        let f = fixture();
        let app_id = f.service.submit_application(new_application()).await.unwrap();
        let task_id = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Village)
            .await
            .unwrap();

        // Scoring alone does not start the task
        f.service
            .record_score(&f.iva, &task_id, "ws-piped-water", 1)
            .await
            .unwrap();
        let app = f.service.get_application_state(&app_id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::AwaitingVerification);

        f.service
            .record_checklist_item(&f.iva, &task_id, "site_inspected", true)
            .await
            .unwrap();
        let app = f.service.get_application_state(&app_id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::VerificationInProgress);
        let task = f.service.get_task_state(&task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_failed_write_commits_nothing() {
        let f = fixture();
        let app_id = f.service.submit_application(new_application()).await.unwrap();
        let task_id = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Village)
            .await
            .unwrap();

        let err = f
            .service
            .record_checklist_item(&f.iva, &task_id, "not_an_item", true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");

        let err = f
            .service
            .record_score(&f.iva, &task_id, "ws-piped-water", 7)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidOption { option_index: 7, .. }));

        let task = f.service.get_task_state(&task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert!(task.score_sheet.is_none());
        let app = f.service.get_application_state(&app_id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::AwaitingVerification);
    }

    #[tokio::test]
    async fn test_only_assignee_may_write() {
        let f = fixture();
        let app_id = f.service.submit_application(new_application()).await.unwrap();
        let task_id = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Village)
            .await
            .unwrap();

        let colleague = Caller::new("iva-2", AuthorityRole::IvaOfficer);
        let err = f
            .service
            .record_checklist_item(&colleague, &task_id, "site_inspected", true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let central = Caller::new("co-1", AuthorityRole::CentralOfficer);
        let err = f
            .service
            .submit_task(&central, &task_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let stats = f.service.audit().stats().await;
        assert_eq!(stats.forbidden, 2);
    }

    #[tokio::test]
    async fn test_submission_emits_events_after_commit() {
        let f = fixture();
        let app_id = f.service.submit_application(new_application()).await.unwrap();
        let task_id = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Village)
            .await
            .unwrap();
        complete_task(&f, &task_id, TaskKind::Village, TaskDecision::Eligible).await;

        let decision = f.service.submit_task(&f.iva, &task_id).await.unwrap();
        assert_eq!(decision, TaskDecision::Eligible);

        let app = f.service.get_application_state(&app_id).await.unwrap();
        assert_eq!(
            app.status,
            ApplicationStatus::Verified {
                eligibility: Eligibility::Eligible
            }
        );

        let events = f.sink.events_for(&app_id);
        let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                "application_state_changed",
                "application_state_changed",
                "verification_completed",
                "application_state_changed",
            ]
        );

        let assessment = f.service.assess_task(&task_id).await.unwrap().unwrap();
        assert_eq!(assessment.report.total, 0);
    }

    #[tokio::test]
    async fn test_required_kinds_gate_verification() {
        let mut config = PipelineConfig::default();
        config.verification.required_kinds = vec![TaskKind::Village, TaskKind::Committee];
        let f = fixture_with(config);

        let app_id = f.service.submit_application(new_application()).await.unwrap();
        let village = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Village)
            .await
            .unwrap();
        let committee = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Committee)
            .await
            .unwrap();

        complete_task(&f, &village, TaskKind::Village, TaskDecision::Eligible).await;
        f.service.submit_task(&f.iva, &village).await.unwrap();
        let app = f.service.get_application_state(&app_id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::VerificationInProgress);

        complete_task(&f, &committee, TaskKind::Committee, TaskDecision::Verified).await;
        f.service.submit_task(&f.iva, &committee).await.unwrap();
        let app = f.service.get_application_state(&app_id).await.unwrap();
        assert_eq!(
            app.status,
            ApplicationStatus::Verified {
                eligibility: Eligibility::Eligible
            }
        );
        assert_eq!(f.service.tasks_of(&app_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_writes_on_rejected_application_fail() {
        let mut config = PipelineConfig::default();
        config.verification.required_kinds = vec![TaskKind::Village, TaskKind::Agency];
        let f = fixture_with(config);

        let app_id = f.service.submit_application(new_application()).await.unwrap();
        let village = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Village)
            .await
            .unwrap();
        let agency = f
            .service
            .create_verification_task(&f.iva, &app_id, TaskKind::Agency)
            .await
            .unwrap();

        complete_task(&f, &agency, TaskKind::Agency, TaskDecision::NotVerified).await;
        f.service.submit_task(&f.iva, &agency).await.unwrap();
        let app = f.service.get_application_state(&app_id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Rejected);

        let err = f
            .service
            .record_checklist_item(&f.iva, &village, "site_inspected", true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_transition");

        let err = f
            .service
            .record_checklist_item(&f.iva, &agency, "agency_registration_verified", false)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "already_submitted");
    }

    #[tokio::test]
    async fn test_second_factor_required_by_default() {
        let f = fixture();
        let app_id = f.service.submit_application(new_application()).await.unwrap();
        let unverified = f.iva.clone().without_second_factor();
        let err = f
            .service
            .create_verification_task(&unverified, &app_id, TaskKind::Village)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let mut config = PipelineConfig::default();
        config.authority.require_second_factor = false;
        let relaxed = fixture_with(config);
        let app_id = relaxed
            .service
            .submit_application(new_application())
            .await
            .unwrap();
        assert!(relaxed
            .service
            .create_verification_task(&unverified, &app_id, TaskKind::Village)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let f = fixture();
        assert_eq!(
            f.service.get_application_state("missing").await.unwrap_err().kind(),
            "not_found"
        );
        assert_eq!(
            f.service
                .record_checklist_item(&f.iva, "missing", "site_inspected", true)
                .await
                .unwrap_err()
                .kind(),
            "not_found"
        );
        assert_eq!(
            f.service.assess_task("missing").await.unwrap_err().kind(),
            "not_found"
        );
    }

    #[tokio::test]
    async fn test_applications_in_status() {
        let f = fixture();
        let first = f.service.submit_application(new_application()).await.unwrap();
        let second = f.service.submit_application(new_application()).await.unwrap();
        f.service
            .create_verification_task(&f.iva, &second, TaskKind::Village)
            .await
            .unwrap();

        let submitted = f.service.applications_in(ApplicationStatus::Submitted).await;
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].id, first);
        let awaiting = f
            .service
            .applications_in(ApplicationStatus::AwaitingVerification)
            .await;
        assert_eq!(awaiting.len(), 1);
        assert_eq!(f.service.application_count(), 2);
    }

    #[tokio::test]
    async fn test_threshold_above_catalog_maximum_rejected() {
        let catalog = Arc::new(IndicatorCatalog::standard().unwrap());
        let mut config = PipelineConfig::default();
        config.scoring.eligibility_threshold = 150;
        let err = ApprovalService::with_catalog(config, catalog, Arc::new(MemoryEventSink::new()))
            .err()
            .unwrap();
        assert_eq!(err.kind(), "config");
    }

    #[tokio::test]
    async fn test_threshold_checked_against_custom_catalog() {
        use indicators::{Domain, Indicator, IndicatorOption};

        let mut indicator = Indicator::availability("hall", "civic", "Community hall?");
        indicator.options.push(IndicatorOption::new("Collapsed", 200));
        let domain = Domain {
            id: "civic".to_string(),
            name: "Civic infrastructure".to_string(),
            indicator_ids: vec!["hall".to_string()],
            max_points: 0,
        };
        let catalog = Arc::new(IndicatorCatalog::from_parts(vec![domain], vec![indicator]).unwrap());
        assert_eq!(catalog.max_total(), 200);

        let mut config = PipelineConfig::default();
        config.scoring.eligibility_threshold = 150;
        let service =
            ApprovalService::with_catalog(config, catalog, Arc::new(MemoryEventSink::new())).unwrap();
        assert_eq!(service.engine().threshold(), 150);
    }
}
