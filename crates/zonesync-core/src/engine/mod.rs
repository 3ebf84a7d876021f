//! Reconciliation engine
//!
//! The [`Reconciler`] is responsible for:
//! - Making sure the zone exists on the provider
//! - Fetching and normalizing the observed zone
//! - Planning corrections against the desired [`DomainConfig`]
//! - Applying corrections in planner order, with retries and a failure policy
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   desired    ┌──────────────┐
//! │ DomainConfig │─────────────▶│  Reconciler  │──── EngineEvent ───▶ (monitoring)
//! └──────────────┘              └──────────────┘
//!                                  │       ▲
//!                     corrections  │       │ observed RRSets
//!                                  ▼       │
//!                               ┌──────────────┐
//!                               │ DnsProvider  │
//!                               └──────────────┘
//! ```
//!
//! ## Application
//!
//! Corrections run in the order the planner produced them. Corrections of
//! one pass may run concurrently when `max_parallel_per_pass > 1`; a pass
//! only starts once every correction of the previous pass has finished.
//! Retries belong to the engine: a failed correction is retried on its own
//! before anything after it runs.
//!
//! ## Apex nameservers
//!
//! Unless the domain declares its own apex NS records, the provider's
//! nameservers are added to the desired state so a push never removes the
//! zone's delegation.

use crate::config::{DomainConfig, EngineConfig, FailurePolicy};
use crate::error::{Error, Result};
use crate::model::{Capabilities, Label, Record, RecordData, RecordType, audit_records, normalize};
use crate::plan::{Correction, compute_corrections};
use crate::traits::DnsProvider;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// TTL for apex NS records taken from the provider when the zone has none yet
const APEX_NS_TTL: u32 = 300;

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Reconciliation of a zone started
    Started {
        zone: String,
    },

    /// The zone was missing and has been created
    ZoneCreated {
        zone: String,
    },

    /// Corrections have been planned
    PlanReady {
        zone: String,
        corrections: usize,
    },

    /// Desired and observed state already match
    InSync {
        zone: String,
    },

    /// A correction was applied
    CorrectionApplied {
        zone: String,
        index: usize,
        msg: String,
        attempts: usize,
    },

    /// A correction failed after all retries
    CorrectionFailed {
        zone: String,
        index: usize,
        msg: String,
        error: String,
        retry_count: usize,
    },

    /// Application finished
    Finished {
        zone: String,
        applied: usize,
        failed: usize,
        aborted: bool,
    },
}

/// A correction that could not be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionFailure {
    /// Position in the correction list
    pub index: usize,
    /// The correction's message
    pub msg: String,
    /// The last error, verbatim
    pub error: String,
}

/// Outcome of applying a correction list
#[derive(Debug, Clone)]
pub struct ApplyReport {
    /// Zone the corrections targeted
    pub zone: String,
    /// Number of corrections handed to the engine
    pub planned: usize,
    /// Number of corrections applied successfully
    pub applied: usize,
    /// Failed corrections, in list order
    pub failures: Vec<CorrectionFailure>,
    /// Whether fail-fast stopped the run before every correction was tried
    pub aborted: bool,
    /// When application started
    pub started_at: DateTime<Utc>,
    /// When application finished
    pub finished_at: DateTime<Utc>,
}

impl ApplyReport {
    fn new(zone: &str, planned: usize) -> Self {
        let now = Utc::now();
        Self {
            zone: zone.to_string(),
            planned,
            applied: 0,
            failures: Vec::new(),
            aborted: false,
            started_at: now,
            finished_at: now,
        }
    }

    /// Whether every planned correction was applied
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }

    /// Number of corrections never attempted
    pub fn skipped(&self) -> usize {
        self.planned - self.applied - self.failures.len()
    }

    /// Turn the first failure into an error
    pub fn into_result(self) -> Result<Self> {
        match self.failures.first() {
            Some(failure) => Err(Error::mutation(failure.msg.clone(), failure.error.clone())),
            None => Ok(self),
        }
    }
}

/// Zone reconciliation engine
///
/// One reconciler drives one provider and can reconcile any number of
/// domains, one after the other.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Preview with [`Reconciler::plan()`], or push with [`Reconciler::reconcile()`]
/// 3. Drain the event receiver for monitoring
///
/// ## Load Resistance
///
/// Events go through a bounded channel; when it is full new events are
/// dropped and a warning is logged.
pub struct Reconciler {
    /// DNS provider for reading and mutating zones
    provider: Arc<dyn DnsProvider>,

    /// Engine settings
    engine: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields engine events
    pub fn new(
        provider: Box<dyn DnsProvider>,
        engine: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        engine.validate()?;

        let (tx, rx) = mpsc::channel(engine.event_channel_capacity);

        let reconciler = Self {
            provider: Arc::from(provider),
            engine,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// The provider this reconciler drives
    pub fn provider(&self) -> &dyn DnsProvider {
        self.provider.as_ref()
    }

    /// Make sure `zone` exists, creating it if allowed
    ///
    /// Returns `true` when the zone had to be created.
    pub async fn ensure_zone(&self, zone: &str) -> Result<bool> {
        if self.zone_exists(zone).await? {
            debug!("Zone {} exists", zone);
            return Ok(false);
        }

        if !self.engine.create_missing_zones {
            return Err(Error::not_found(format!(
                "zone {} does not exist and create_missing_zones is off",
                zone
            )));
        }

        self.provider.create_zone(zone).await?;
        info!("Created zone {} on {}", zone, self.provider.provider_name());
        self.emit_event(EngineEvent::ZoneCreated {
            zone: zone.to_string(),
        });
        Ok(true)
    }

    /// Fetch and normalize every record set of `zone`
    ///
    /// # Errors
    ///
    /// - `Error::Fetch` when listing or reading a record set fails
    /// - `Error::Unsupported` when the zone holds a record type this crate cannot model
    /// - `Error::Parse` when a record set's payload is malformed
    pub async fn fetch_observed(&self, zone: &str) -> Result<Vec<Record>> {
        let refs = self
            .provider
            .list_zone_record_names(zone)
            .await
            .map_err(|e| Error::fetch(format!("listing {}: {}", zone, e)))?;

        let mut records = Vec::new();
        for rrset in refs {
            let record_type: RecordType = rrset.record_type.parse()?;
            let native = self
                .provider
                .get_rrset(zone, &rrset.name, record_type)
                .await
                .map_err(|e| Error::fetch(format!("{} {}: {}", rrset.name, record_type, e)))?;
            records.extend(normalize(&native, zone, &rrset.name, record_type)?);
        }

        debug!("Observed {} record(s) in {}", records.len(), zone);
        Ok(records)
    }

    /// Compute the corrections that bring `domain` in sync, without mutating anything
    ///
    /// A zone the provider does not host yet is planned against an empty
    /// observed state.
    pub async fn plan(&self, domain: &DomainConfig) -> Result<Vec<Correction>> {
        let zone = domain.zone();
        let desired = domain.desired_records();
        let capabilities = self.provider.capabilities();
        audit_records(&desired, &capabilities)?;

        let mut observed = if self.zone_exists(&zone).await? {
            self.fetch_observed(&zone).await?
        } else {
            warn!("Zone {} does not exist yet, planning against an empty zone", zone);
            Vec::new()
        };
        let desired = self
            .with_apex_nameservers(&zone, desired, &mut observed, &capabilities)
            .await?;

        let corrections = compute_corrections(&zone, desired, observed, &capabilities)?;
        if corrections.is_empty() {
            info!("Zone {} is in sync", zone);
            self.emit_event(EngineEvent::InSync { zone: zone.clone() });
        } else {
            info!("Planned {} correction(s) for {}", corrections.len(), zone);
            self.emit_event(EngineEvent::PlanReady {
                zone: zone.clone(),
                corrections: corrections.len(),
            });
        }
        Ok(corrections)
    }

    /// Ensure the zone, plan, and apply
    ///
    /// Fatal errors (fetch, parse, unsupported, planning invariant) abort
    /// before any correction runs. Correction failures are reported in the
    /// returned [`ApplyReport`].
    pub async fn reconcile(&self, domain: &DomainConfig) -> Result<ApplyReport> {
        let zone = domain.zone();
        self.emit_event(EngineEvent::Started { zone: zone.clone() });

        // nothing is created for a domain that cannot be hosted
        audit_records(&domain.desired_records(), &self.provider.capabilities())?;
        self.ensure_zone(&zone).await?;
        let corrections = self.plan(domain).await?;
        Ok(self.apply(&zone, &corrections).await)
    }

    /// Nameservers the provider assigns to `domain`
    pub async fn nameservers(&self, domain: &str) -> Result<Vec<String>> {
        self.provider.get_nameservers(domain).await
    }

    /// Apply `corrections` in order
    ///
    /// Never reorders corrections. Under [`FailurePolicy::FailFast`] nothing
    /// after the first failure is started; under [`FailurePolicy::Continue`]
    /// every correction is attempted.
    pub async fn apply(&self, zone: &str, corrections: &[Correction]) -> ApplyReport {
        let mut report = ApplyReport::new(zone, corrections.len());

        let mut start = 0;
        while start < corrections.len() {
            let pass = corrections[start].pass();
            let end = corrections[start..]
                .iter()
                .position(|c| c.pass() != pass)
                .map_or(corrections.len(), |offset| start + offset);

            debug!("Applying {:?} pass: corrections {}..{}", pass, start, end);
            let stop = if self.engine.max_parallel_per_pass > 1 {
                self.apply_concurrent(zone, start, &corrections[start..end], &mut report)
                    .await
            } else {
                self.apply_sequential(zone, start, &corrections[start..end], &mut report)
                    .await
            };

            if stop {
                report.aborted = report.applied + report.failures.len() < corrections.len();
                break;
            }
            start = end;
        }

        report.finished_at = Utc::now();
        if report.is_success() {
            info!("Applied {} correction(s) to {}", report.applied, zone);
        } else {
            error!(
                "{} of {} correction(s) failed on {} ({} skipped)",
                report.failures.len(),
                report.planned,
                zone,
                report.skipped()
            );
        }
        self.emit_event(EngineEvent::Finished {
            zone: zone.to_string(),
            applied: report.applied,
            failed: report.failures.len(),
            aborted: report.aborted,
        });
        report
    }

    /// Apply one pass strictly in order; returns `true` when fail-fast must stop the run
    async fn apply_sequential(
        &self,
        zone: &str,
        offset: usize,
        corrections: &[Correction],
        report: &mut ApplyReport,
    ) -> bool {
        for (i, correction) in corrections.iter().enumerate() {
            let outcome = apply_with_retry(
                Arc::clone(&self.provider),
                correction.clone(),
                self.engine.max_retries,
                self.engine.retry_delay_secs,
            )
            .await;

            if self.record_outcome(zone, offset + i, correction, outcome, report) {
                return true;
            }
        }
        false
    }

    /// Apply one pass with up to `max_parallel_per_pass` corrections in flight
    ///
    /// Outcomes are recorded in list order once the pass has drained. After
    /// a failure under fail-fast no new correction is started, but those
    /// already in flight finish.
    async fn apply_concurrent(
        &self,
        zone: &str,
        offset: usize,
        corrections: &[Correction],
        report: &mut ApplyReport,
    ) -> bool {
        let limit = self.engine.max_parallel_per_pass;
        let fail_fast = self.engine.failure_policy == FailurePolicy::FailFast;

        let mut tasks = JoinSet::new();
        let mut pending: BTreeMap<usize, &Correction> = BTreeMap::new();
        let mut outcomes: BTreeMap<usize, Outcome> = BTreeMap::new();
        let mut failed = false;

        for (i, correction) in corrections.iter().enumerate() {
            if fail_fast && failed {
                break;
            }

            while tasks.len() >= limit {
                if let Some(joined) = tasks.join_next().await {
                    failed |= collect(joined, &mut pending, &mut outcomes);
                }
            }
            if fail_fast && failed {
                break;
            }

            let index = offset + i;
            pending.insert(index, correction);
            let provider = Arc::clone(&self.provider);
            let correction = correction.clone();
            let max_retries = self.engine.max_retries;
            let retry_delay_secs = self.engine.retry_delay_secs;
            tasks.spawn(async move {
                let outcome = apply_with_retry(provider, correction, max_retries, retry_delay_secs).await;
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            collect(joined, &mut pending, &mut outcomes);
        }

        // tasks that died without reporting
        for (index, correction) in pending {
            outcomes.insert(
                index,
                Outcome {
                    attempts: 1,
                    result: Err(Error::mutation(correction.msg.clone(), "task aborted")),
                },
            );
        }

        let mut stop = false;
        for (index, outcome) in outcomes {
            let correction = &corrections[index - offset];
            stop |= self.record_outcome(zone, index, correction, outcome, report);
        }
        stop
    }

    /// Record one correction's outcome; returns `true` when fail-fast must stop the run
    fn record_outcome(
        &self,
        zone: &str,
        index: usize,
        correction: &Correction,
        outcome: Outcome,
        report: &mut ApplyReport,
    ) -> bool {
        match outcome.result {
            Ok(()) => {
                info!("#{}: {}", index + 1, correction.msg);
                report.applied += 1;
                self.emit_event(EngineEvent::CorrectionApplied {
                    zone: zone.to_string(),
                    index,
                    msg: correction.msg.clone(),
                    attempts: outcome.attempts,
                });
                false
            }
            Err(e) => {
                error!("#{} failed: {}", index + 1, e);
                report.failures.push(CorrectionFailure {
                    index,
                    msg: correction.msg.clone(),
                    error: e.to_string(),
                });
                self.emit_event(EngineEvent::CorrectionFailed {
                    zone: zone.to_string(),
                    index,
                    msg: correction.msg.clone(),
                    error: e.to_string(),
                    retry_count: outcome.attempts.saturating_sub(1),
                });
                self.engine.failure_policy == FailurePolicy::FailFast
            }
        }
    }

    /// Add the provider's nameservers as apex NS records when `desired` has none
    ///
    /// Observed apex NS records are kept at their current TTL. When the
    /// provider reports no nameservers, or cannot host NS records, the apex
    /// NS set is left out of the comparison entirely.
    async fn with_apex_nameservers(
        &self,
        zone: &str,
        mut desired: Vec<Record>,
        observed: &mut Vec<Record>,
        capabilities: &Capabilities,
    ) -> Result<Vec<Record>> {
        let apex_ns = Label::new(zone, RecordType::Ns);
        if desired.iter().any(|r| r.label() == apex_ns) {
            return Ok(desired);
        }

        let nameservers = self
            .provider
            .get_nameservers(zone)
            .await
            .map_err(|e| Error::fetch(format!("nameservers of {}: {}", zone, e)))?;

        if nameservers.is_empty() || !capabilities.supports(RecordType::Ns) {
            debug!("Leaving apex NS of {} unmanaged", zone);
            observed.retain(|r| r.label() != apex_ns);
            return Ok(desired);
        }

        let ttl = observed
            .iter()
            .find(|r| r.label() == apex_ns)
            .map_or(APEX_NS_TTL, Record::ttl);
        debug!("Adding {} provider nameserver(s) to {}", nameservers.len(), zone);
        desired.extend(nameservers.iter().map(|ns| {
            Record::new(
                zone,
                zone,
                ttl,
                RecordData::Ns {
                    target: ns.clone(),
                },
            )
        }));
        Ok(desired)
    }

    async fn zone_exists(&self, zone: &str) -> Result<bool> {
        self.provider
            .zone_exists(zone)
            .await
            .map_err(|e| Error::fetch(format!("checking zone {}: {}", zone, e)))
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Send event, logging warning if channel is full (backpressure)
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Result of running one correction, retries included
struct Outcome {
    attempts: usize,
    result: Result<()>,
}

/// Run a correction, retrying it on its own up to `max_retries` times
async fn apply_with_retry(
    provider: Arc<dyn DnsProvider>,
    correction: Correction,
    max_retries: usize,
    retry_delay_secs: u64,
) -> Outcome {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match correction.apply(provider.as_ref()).await {
            Ok(()) => {
                return Outcome {
                    attempts: attempt,
                    result: Ok(()),
                };
            }
            Err(e) if attempt <= max_retries => {
                warn!("Attempt {} failed for {}: {}", attempt, correction.operation, e);
                tokio::time::sleep(Duration::from_secs(retry_delay_secs)).await;
            }
            Err(e) => {
                return Outcome {
                    attempts: attempt,
                    result: Err(e),
                };
            }
        }
    }
}

/// Store a finished task's outcome; returns `true` if it failed
fn collect(
    joined: std::result::Result<(usize, Outcome), tokio::task::JoinError>,
    pending: &mut BTreeMap<usize, &Correction>,
    outcomes: &mut BTreeMap<usize, Outcome>,
) -> bool {
    match joined {
        Ok((index, outcome)) => {
            pending.remove(&index);
            let failed = outcome.result.is_err();
            outcomes.insert(index, outcome);
            failed
        }
        Err(e) => {
            error!("Correction task failed: {}", e);
            true
        }
    }
}
