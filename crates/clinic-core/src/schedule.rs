//! Schedule queries for the admin and portal views.
//!
//! [`ScheduleService`] loads the raw rules a subject owns, expands each one
//! through the [`RecurrenceExpander`] and merges the results into a single
//! time-ordered list. Nothing is cached: every call recomputes from the
//! current rule data.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::CoreError;
use crate::models::{
    Appointment, Frequency, Patient, Prescription, ScheduleConfig, ScheduleKind,
    ScheduledOccurrence,
};
use crate::recurrence::RecurrenceExpander;
use crate::repository::{Repository, RuleStore};
use crate::window::{Clock, ScheduleView, SystemClock, Window, WindowPolicy};

/// Portal home: who the patient is and what is coming up this week.
#[derive(Debug, Clone, Serialize)]
pub struct PatientOverview {
    pub patient: Patient,
    pub window: Window,
    pub upcoming_appointments: Vec<ScheduledOccurrence>,
    pub upcoming_refills: Vec<ScheduledOccurrence>,
}

/// Admin detail page: stored records plus their full-list expansion.
#[derive(Debug, Clone, Serialize)]
pub struct PatientDetail {
    pub patient: Patient,
    pub appointments: Vec<Appointment>,
    pub prescriptions: Vec<Prescription>,
    pub window: Window,
    pub upcoming_appointments: Vec<ScheduledOccurrence>,
    pub upcoming_refills: Vec<ScheduledOccurrence>,
}

pub struct ScheduleService<S, C = SystemClock> {
    store: S,
    clock: C,
    policy: WindowPolicy,
    expander: RecurrenceExpander,
}

impl<S: RuleStore> ScheduleService<S, SystemClock> {
    pub fn new(store: S, config: &ScheduleConfig) -> Self {
        Self::with_clock(store, SystemClock, config)
    }
}

impl<S: RuleStore, C: Clock> ScheduleService<S, C> {
    pub fn with_clock(store: S, clock: C, config: &ScheduleConfig) -> Self {
        Self {
            store,
            clock,
            policy: WindowPolicy::from_config(config),
            expander: RecurrenceExpander::from_config(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// Reads the service's clock once.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Occurrences of `kind` owned by `subject_id` inside `window`.
    ///
    /// # Behavior
    /// - One `load_rules` call; the store filters by ownership only
    /// - Each rule is expanded with the configured cap
    /// - Result is ordered by instant, ties broken by source record id
    /// - Any malformed rule fails the whole query with `InvalidRule`
    pub async fn occurrences_for(
        &self,
        subject_id: i64,
        kind: ScheduleKind,
        window: &Window,
    ) -> Result<Vec<ScheduledOccurrence>, CoreError> {
        window.validate()?;
        let records = self.store.load_rules(subject_id, kind).await?;

        let mut merged = Vec::new();
        for record in &records {
            let (rule, instants) = self
                .expander
                .expand_record(record, window)
                .map_err(|e| {
                    tracing::warn!(subject_id, %kind, rule_id = record.id, error = %e, "rejected rule");
                    e
                })?;

            merged.extend(instants.into_iter().map(|at| ScheduledOccurrence {
                source_id: record.id,
                kind,
                at,
                frequency: rule.frequency,
                details: record.display.clone(),
            }));
        }

        sort_occurrences(&mut merged);

        tracing::debug!(
            subject_id,
            %kind,
            rules = records.len(),
            occurrences = merged.len(),
            lower = %window.lower,
            upper = %window.upper,
            "expanded schedule"
        );
        Ok(merged)
    }

    pub async fn view_occurrences_at(
        &self,
        subject_id: i64,
        kind: ScheduleKind,
        view: ScheduleView,
        now: NaiveDateTime,
    ) -> Result<Vec<ScheduledOccurrence>, CoreError> {
        let window = self.policy.window_for(view, now)?;
        self.occurrences_for(subject_id, kind, &window).await
    }

    /// Next 7 days (by default), with "now" read once from the clock.
    pub async fn dashboard_occurrences(
        &self,
        subject_id: i64,
        kind: ScheduleKind,
    ) -> Result<Vec<ScheduledOccurrence>, CoreError> {
        let now = self.clock.now();
        self.view_occurrences_at(subject_id, kind, ScheduleView::Dashboard, now)
            .await
    }

    /// Next 90 days (by default), with "now" read once from the clock.
    pub async fn full_list_occurrences(
        &self,
        subject_id: i64,
        kind: ScheduleKind,
    ) -> Result<Vec<ScheduledOccurrence>, CoreError> {
        let now = self.clock.now();
        self.view_occurrences_at(subject_id, kind, ScheduleView::FullList, now)
            .await
    }
}

impl<S: Repository, C: Clock> ScheduleService<S, C> {
    /// Patient identity plus dashboard appointments and refills from a single "now".
    pub async fn patient_overview(&self, patient_id: i64) -> Result<PatientOverview, CoreError> {
        let patient = self.find_patient(patient_id).await?;
        let window = self.policy.dashboard_window(self.clock.now())?;

        let upcoming_appointments = self
            .occurrences_for(patient_id, ScheduleKind::Appointment, &window)
            .await?;
        let upcoming_refills = self
            .occurrences_for(patient_id, ScheduleKind::Refill, &window)
            .await?;

        Ok(PatientOverview {
            patient,
            window,
            upcoming_appointments,
            upcoming_refills,
        })
    }

    /// Stored appointments and prescriptions with their full-list expansion.
    pub async fn patient_detail(&self, patient_id: i64) -> Result<PatientDetail, CoreError> {
        let patient = self.find_patient(patient_id).await?;
        let window = self.policy.full_list_window(self.clock.now())?;

        let appointments = self.store.find_appointments_for_patient(patient_id).await?;
        let prescriptions = self.store.find_prescriptions_for_patient(patient_id).await?;
        let upcoming_appointments = self
            .occurrences_for(patient_id, ScheduleKind::Appointment, &window)
            .await?;
        let upcoming_refills = self
            .occurrences_for(patient_id, ScheduleKind::Refill, &window)
            .await?;

        Ok(PatientDetail {
            patient,
            appointments,
            prescriptions,
            window,
            upcoming_appointments,
            upcoming_refills,
        })
    }

    async fn find_patient(&self, patient_id: i64) -> Result<Patient, CoreError> {
        self.store
            .find_patient_by_id(patient_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Patient with id {} not found", patient_id)))
    }
}

/// Orders by instant, then by owning record id.
pub fn sort_occurrences(occurrences: &mut [ScheduledOccurrence]) {
    occurrences.sort_by(|a, b| a.at.cmp(&b.at).then(a.source_id.cmp(&b.source_id)));
}

/// Human-readable label for a frequency in a given kind's vocabulary.
pub fn schedule_label(kind: ScheduleKind, frequency: Frequency) -> &'static str {
    match (kind, frequency) {
        (_, Frequency::None) => "once",
        (ScheduleKind::Appointment, Frequency::Weekly) => "every week",
        (ScheduleKind::Appointment, Frequency::Monthly) => "every month",
        (ScheduleKind::Refill, Frequency::Weekly) => "weekly refill",
        (ScheduleKind::Refill, Frequency::Monthly) => "monthly refill",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DisplayFields, RuleRecord};
    use crate::window::FixedClock;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn appointment(id: i64, anchor: NaiveDateTime, frequency: &str) -> RuleRecord {
        RuleRecord {
            id,
            anchor: Some(anchor),
            frequency: frequency.to_string(),
            explicit_end: None,
            display: DisplayFields::Appointment {
                provider: format!("Provider {}", id),
            },
        }
    }

    /// In-memory store that counts how often it is read.
    struct MemoryStore {
        appointments: Vec<RuleRecord>,
        refills: Vec<RuleRecord>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl MemoryStore {
        fn new(appointments: Vec<RuleRecord>) -> Self {
            Self {
                appointments,
                refills: Vec::new(),
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl RuleStore for MemoryStore {
        async fn load_rules(&self, _subject_id: i64, kind: ScheduleKind) -> Result<Vec<RuleRecord>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CoreError::StorageUnavailable(sqlx::Error::PoolTimedOut));
            }
            Ok(match kind {
                ScheduleKind::Appointment => self.appointments.clone(),
                ScheduleKind::Refill => self.refills.clone(),
            })
        }
    }

    fn service(store: MemoryStore, now: NaiveDateTime) -> ScheduleService<MemoryStore, FixedClock> {
        ScheduleService::with_clock(store, FixedClock(now), &ScheduleConfig::default())
    }

    #[tokio::test]
    async fn test_ties_break_by_record_id() {
        let store = MemoryStore::new(vec![
            appointment(7, date(2025, 1, 3), "none"),
            appointment(2, date(2025, 1, 3), "none"),
            appointment(5, date(2025, 1, 2), "none"),
        ]);
        let svc = service(store, date(2025, 1, 1));
        let window = Window::new(date(2025, 1, 1), date(2025, 1, 31), date(2025, 1, 1)).unwrap();

        let result = svc
            .occurrences_for(1, ScheduleKind::Appointment, &window)
            .await
            .unwrap();

        let ids: Vec<i64> = result.iter().map(|o| o.source_id).collect();
        assert_eq!(ids, vec![5, 2, 7]);
    }

    #[tokio::test]
    async fn test_merges_rules_in_time_order() {
        let store = MemoryStore::new(vec![
            appointment(1, date(2025, 1, 1), "weekly"),
            appointment(2, date(2025, 1, 4), "none"),
        ]);
        let svc = service(store, date(2025, 1, 1));
        let window = Window::new(date(2025, 1, 1), date(2025, 1, 15), date(2025, 1, 1)).unwrap();

        let result = svc
            .occurrences_for(1, ScheduleKind::Appointment, &window)
            .await
            .unwrap();

        let got: Vec<(i64, NaiveDateTime)> = result.iter().map(|o| (o.source_id, o.at)).collect();
        assert_eq!(
            got,
            vec![
                (1, date(2025, 1, 1)),
                (2, date(2025, 1, 4)),
                (1, date(2025, 1, 8)),
                (1, date(2025, 1, 15)),
            ]
        );
        assert_eq!(result[0].frequency, Frequency::Weekly);
        assert_eq!(
            result[1].details,
            DisplayFields::Appointment { provider: "Provider 2".to_string() }
        );
    }

    #[tokio::test]
    async fn test_single_store_call_per_query() {
        let store = MemoryStore::new(vec![
            appointment(1, date(2025, 1, 1), "weekly"),
            appointment(2, date(2025, 1, 2), "monthly"),
        ]);
        let svc = service(store, date(2025, 1, 1));

        svc.full_list_occurrences(1, ScheduleKind::Appointment).await.unwrap();
        assert_eq!(svc.store().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dashboard_is_subset_of_full_list() {
        let now = date(2025, 1, 1);
        let store = MemoryStore::new(vec![
            appointment(1, date(2024, 11, 20), "weekly"),
            appointment(2, date(2024, 12, 31), "monthly"),
            appointment(3, now + Duration::days(3), "none"),
            appointment(4, now + Duration::days(30), "none"),
        ]);
        let svc = service(store, now);

        let dashboard = svc.dashboard_occurrences(1, ScheduleKind::Appointment).await.unwrap();
        let full = svc.full_list_occurrences(1, ScheduleKind::Appointment).await.unwrap();

        assert!(!dashboard.is_empty());
        assert!(dashboard.len() < full.len());
        for occurrence in &dashboard {
            assert!(full.contains(occurrence));
        }
    }

    #[tokio::test]
    async fn test_invalid_rule_is_surfaced() {
        let store = MemoryStore::new(vec![
            appointment(1, date(2025, 1, 2), "weekly"),
            appointment(2, date(2025, 1, 2), "biweekly"),
        ]);
        let svc = service(store, date(2025, 1, 1));

        let result = svc.dashboard_occurrences(1, ScheduleKind::Appointment).await;
        assert!(matches!(result, Err(CoreError::InvalidRule(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut store = MemoryStore::new(vec![]);
        store.fail = true;
        let svc = service(store, date(2025, 1, 1));

        let result = svc.full_list_occurrences(1, ScheduleKind::Refill).await;
        assert!(matches!(result, Err(CoreError::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_invalid_window_rejected_before_store_read() {
        let svc = service(MemoryStore::new(vec![]), date(2025, 1, 1));
        let inverted = Window {
            lower: date(2025, 2, 1),
            upper: date(2025, 1, 1),
            now: date(2025, 2, 1),
        };

        let result = svc.occurrences_for(1, ScheduleKind::Appointment, &inverted).await;
        assert!(matches!(result, Err(CoreError::InvalidWindow { .. })));
        assert_eq!(svc.store().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refill_kind_reads_refill_rules() {
        let mut store = MemoryStore::new(vec![appointment(1, date(2025, 1, 2), "none")]);
        store.refills.push(RuleRecord {
            id: 10,
            anchor: Some(date(2025, 1, 3)),
            frequency: "monthly".to_string(),
            explicit_end: None,
            display: DisplayFields::Refill {
                medication: "Metformin".to_string(),
                dosage: "500mg".to_string(),
                quantity: 60,
            },
        });
        let svc = service(store, date(2025, 1, 1));

        let refills = svc.dashboard_occurrences(1, ScheduleKind::Refill).await.unwrap();
        assert_eq!(refills.len(), 1);
        assert_eq!(refills[0].source_id, 10);
        assert_eq!(refills[0].kind, ScheduleKind::Refill);
    }

    #[test]
    fn test_schedule_labels() {
        assert_eq!(schedule_label(ScheduleKind::Refill, Frequency::Monthly), "monthly refill");
        assert_eq!(schedule_label(ScheduleKind::Appointment, Frequency::None), "once");
    }
}
