use crate::agents::Municipality;

use super::types::{MunicipalityStep, StepRecord};

/// Time series collected during a run.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    system: Vec<StepRecord>,
    municipalities: Vec<MunicipalityStep>,
}

impl Recorder {
    pub fn with_capacity(ticks: usize, municipalities: usize) -> Self {
        Self {
            system: Vec::with_capacity(ticks),
            municipalities: Vec::with_capacity(ticks * municipalities),
        }
    }

    /// Appends one tick: the system record and a row per municipality.
    pub fn record(&mut self, record: StepRecord, municipalities: &[Municipality]) {
        let tick = record.tick;
        self.municipalities
            .extend(municipalities.iter().map(|m| MunicipalityStep {
                tick,
                code: m.code().to_string(),
                name: m.name().to_string(),
                number_evs: m.number_evs(),
                stats: *m.stats(),
            }));
        self.system.push(record);
    }

    /// One record per tick, in tick order.
    pub fn system(&self) -> &[StepRecord] {
        &self.system
    }

    /// Municipality rows, grouped by tick in territory order.
    pub fn municipalities(&self) -> &[MunicipalityStep] {
        &self.municipalities
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.system.last()
    }

    pub fn len(&self) -> usize {
        self.system.len()
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_empty()
    }
}
