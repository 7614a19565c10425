use crate::cascade::CascadeController;
use crate::error::EngineError;
use crate::fields::{self, FieldKind};
use crate::schema::{Attr, EntityKind};
use std::collections::BTreeMap;

/// Raw input strings keyed by attribute, exactly as the front end sent them.
pub type RawInputs = BTreeMap<Attr, String>;

/// Editable state of one entity's form, built from its descriptor list.
#[derive(Debug, Clone)]
pub struct FormState {
    kind: EntityKind,
    values: RawInputs,
    selected: Option<i64>,
    cascade: Option<CascadeController>,
}

impl FormState {
    pub fn new(kind: EntityKind) -> Self {
        let values = fields::descriptors(kind)
            .iter()
            .map(|d| (d.attr, String::new()))
            .collect();
        let cascade = fields::has_discipline_filter(kind).then(CascadeController::default);
        FormState {
            kind,
            values,
            selected: None,
            cascade,
        }
    }

    pub fn values(&self) -> &RawInputs {
        &self.values
    }

    pub fn raw(&self, attr: Attr) -> &str {
        self.values.get(&attr).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn set(&mut self, attr: Attr, raw: &str) -> Result<(), EngineError> {
        match self.values.get_mut(&attr) {
            Some(slot) => {
                *slot = raw.to_string();
                Ok(())
            }
            None => Err(EngineError::UnknownField {
                entity: self.kind,
                field: attr.as_str().to_string(),
            }),
        }
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    pub fn select(&mut self, id: i64) {
        self.selected = Some(id);
    }

    pub fn cascade(&self) -> Option<&CascadeController> {
        self.cascade.as_ref()
    }

    pub fn cascade_mut(&mut self) -> Option<&mut CascadeController> {
        self.cascade.as_mut()
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.cascade.as_ref().and_then(|c| c.active_filter())
    }

    /// Clears record inputs and the selection; the discipline filter is kept.
    pub fn clear_record(&mut self) {
        for d in fields::descriptors(self.kind) {
            if matches!(d.kind, FieldKind::DisciplineFilter) {
                continue;
            }
            if let Some(slot) = self.values.get_mut(&d.attr) {
                slot.clear();
            }
        }
        self.selected = None;
    }

    /// Fresh-open state: everything cleared and the cascade unfiltered.
    pub fn reset(&mut self) {
        for slot in self.values.values_mut() {
            slot.clear();
        }
        self.selected = None;
        if let Some(c) = self.cascade.as_mut() {
            c.reset();
        }
    }
}
