//! Registered patients and their latest burden, recomputed on demand by the host.

use burden_core::{AlertLevel, BurdenConfig, BurdenError, PatientCheckIn, RegisteredPatient};
use burden_facilities::FacilityStore;
use chrono::{DateTime, Utc};

use crate::compute_burden;

/// Owns the facility store and the patients currently waiting.
///
/// Nothing here runs on a timer: the hosting application decides when to call
/// [`WaitingRoom::recompute_all`].
#[derive(Debug, Clone)]
pub struct WaitingRoom {
    store: FacilityStore,
    config: BurdenConfig,
    patients: Vec<RegisteredPatient>,
}

impl WaitingRoom {
    pub fn new(store: FacilityStore, config: BurdenConfig) -> Result<Self, BurdenError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            patients: Vec::new(),
        })
    }

    pub fn register(&mut self, patient: RegisteredPatient) -> Result<(), BurdenError> {
        if self.patient(&patient.id).is_some() {
            return Err(BurdenError::DuplicatePatient(patient.id));
        }
        tracing::info!(
            patient = %patient.id,
            facility = %patient.assigned_hospital_key,
            "patient registered"
        );
        self.patients.push(patient);
        Ok(())
    }

    pub fn patient(&self, id: &str) -> Option<&RegisteredPatient> {
        self.patients.iter().find(|patient| patient.id == id)
    }

    pub fn patients(&self) -> &[RegisteredPatient] {
        &self.patients
    }

    pub fn config(&self) -> &BurdenConfig {
        &self.config
    }

    pub fn store(&self) -> &FacilityStore {
        &self.store
    }

    /// Record a check-in and refresh that patient's burden straight away.
    ///
    /// The patient is left untouched when the recomputation fails.
    pub fn add_check_in(
        &mut self,
        id: &str,
        check_in: PatientCheckIn,
        now: DateTime<Utc>,
    ) -> Result<&RegisteredPatient, BurdenError> {
        let position = self.position(id)?;
        let mut updated = self.patients[position].clone();
        updated.discomfort_level = Some(check_in.discomfort);
        updated.check_ins.push(check_in);
        self.refresh(&mut updated, now)?;

        self.patients[position] = updated;
        Ok(&self.patients[position])
    }

    /// Staff attended to the patient: lower the burden and reclassify the alert.
    pub fn apply_intervention(&mut self, id: &str) -> Result<&RegisteredPatient, BurdenError> {
        let position = self.position(id)?;
        let patient = &mut self.patients[position];

        let relief = self.config.intervention_relief;
        let lowered = (patient.burden_index.unwrap_or(0.0) - relief).max(0.0);
        patient.burden_index = Some(lowered);
        patient.alert_level = Some(AlertLevel::classify(
            lowered,
            patient.planning_to_leave(),
            &self.config,
        ));

        tracing::info!(patient = %id, burden = lowered, "intervention applied");
        Ok(patient)
    }

    /// Recompute one patient's burden as of `now`.
    pub fn recompute(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<&RegisteredPatient, BurdenError> {
        let position = self.position(id)?;
        let mut patient = self.patients[position].clone();
        self.refresh(&mut patient, now)?;

        self.patients[position] = patient;
        Ok(&self.patients[position])
    }

    /// Recompute every patient; returns how many were updated.
    ///
    /// A patient whose data fails validation keeps its previous values.
    pub fn recompute_all(&mut self, now: DateTime<Utc>) -> usize {
        let ids: Vec<String> = self.patients.iter().map(|p| p.id.clone()).collect();
        let mut updated = 0;

        for id in &ids {
            match self.recompute(id, now) {
                Ok(_) => updated += 1,
                Err(err) => {
                    tracing::warn!(patient = %id, error = %err, "skipping burden recomputation");
                }
            }
        }

        tracing::info!(updated, total = ids.len(), "waiting room recomputed");
        updated
    }

    /// Patients sorted by alert level then burden, most urgent first.
    pub fn board(&self) -> Vec<&RegisteredPatient> {
        let mut board: Vec<&RegisteredPatient> = self.patients.iter().collect();
        board.sort_by(|a, b| {
            b.alert_level
                .cmp(&a.alert_level)
                .then_with(|| {
                    b.burden_index
                        .unwrap_or(0.0)
                        .total_cmp(&a.burden_index.unwrap_or(0.0))
                })
        });
        board
    }

    fn position(&self, id: &str) -> Result<usize, BurdenError> {
        self.patients
            .iter()
            .position(|patient| patient.id == id)
            .ok_or_else(|| BurdenError::UnknownPatient(id.to_string()))
    }

    fn refresh(
        &self,
        patient: &mut RegisteredPatient,
        now: DateTime<Utc>,
    ) -> Result<(), BurdenError> {
        let visit = patient.visit_at(now, &self.config);
        let result = compute_burden(&visit, &self.store, &self.config)?;
        patient.burden_index = Some(result.burden);
        patient.alert_level = Some(result.alert_status);
        Ok(())
    }
}
