//! Turns a foreign entity's live rows into labelled, selectable choices.
//!
//! Each option carries an opaque token that embeds the row id, so rows with
//! identical display labels stay independently selectable. Resolved sets are
//! cached per `(entity kind, discipline filter)`.

use crate::catalog::Catalog;
use crate::error::EngineError;
use crate::fields::LabelSource;
use crate::schema::{Attr, EntityKind, Record};
use crate::store::{RecordFilter, Store};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub token: String,
    pub label: String,
    #[serde(skip)]
    pub id: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceSet {
    options: Vec<ChoiceOption>,
}

impl ChoiceSet {
    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    #[cfg(test)]
    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.label.as_str()).collect()
    }

    #[cfg(test)]
    pub fn ids(&self) -> Vec<i64> {
        self.options.iter().map(|o| o.id).collect()
    }

    pub fn resolve(&self, token: &str) -> Option<i64> {
        self.options.iter().find(|o| o.token == token).map(|o| o.id)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.resolve(token).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChoiceKey {
    pub kind: EntityKind,
    pub filter: Option<String>,
}

impl ChoiceKey {
    pub fn new(kind: EntityKind, filter: Option<&str>) -> Self {
        ChoiceKey {
            kind,
            filter: filter.map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChoiceCache {
    sets: HashMap<ChoiceKey, ChoiceSet>,
}

impl ChoiceCache {
    pub fn get(&self, kind: EntityKind, filter: Option<&str>) -> Option<&ChoiceSet> {
        self.sets.get(&ChoiceKey::new(kind, filter))
    }

    pub fn put(&mut self, kind: EntityKind, filter: Option<&str>, set: ChoiceSet) {
        self.sets.insert(ChoiceKey::new(kind, filter), set);
    }

    /// Drops every cached set for `kind`, whatever its filter.
    pub fn invalidate(&mut self, kind: EntityKind) {
        self.sets.retain(|k, _| k.kind != kind);
    }

    pub fn clear(&mut self) {
        self.sets.clear();
    }
}

pub fn choice_token(kind: EntityKind, id: i64) -> String {
    format!("{}#{}", kind.as_str(), id)
}

/// Resolves the choices for `target`, narrowed by `discipline` unless it is the
/// catalog's "other" value.
pub fn resolve_choices(
    store: &Store<'_>,
    catalog: &Catalog,
    target: EntityKind,
    label: LabelSource,
    discipline: Option<&str>,
) -> Result<ChoiceSet, EngineError> {
    let filter = match discipline {
        Some(d) if !catalog.is_other(d) => Some(RecordFilter::Discipline(d.to_string())),
        _ => None,
    };
    let records = store.fetch_all(target, filter.as_ref())?;
    let labeler = Labeler::load(store, catalog, label)?;

    let mut options: Vec<ChoiceOption> = records
        .iter()
        .map(|r| ChoiceOption {
            token: choice_token(target, r.id),
            label: labeler.label(r),
            id: r.id,
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));

    log::debug!(
        "resolved {} {:?} choices (filter {:?})",
        options.len(),
        target,
        discipline
    );
    Ok(ChoiceSet { options })
}

/// Name lookups needed to render labels, loaded once per resolution.
pub struct Labeler<'c> {
    source: LabelSource,
    unknown: &'c str,
    instructor_names: HashMap<i64, String>,
    course_names: HashMap<i64, String>,
}

impl<'c> Labeler<'c> {
    pub fn load(
        store: &Store<'_>,
        catalog: &'c Catalog,
        source: LabelSource,
    ) -> Result<Self, EngineError> {
        let (instructor_names, course_names) = match source {
            LabelSource::Attr(_) => (HashMap::new(), HashMap::new()),
            LabelSource::OfferingComposite => (
                name_map(store, EntityKind::Instructor)?,
                name_map(store, EntityKind::Course)?,
            ),
        };
        Ok(Labeler {
            source,
            unknown: &catalog.unknown_label,
            instructor_names,
            course_names,
        })
    }

    pub fn label(&self, record: &Record) -> String {
        match self.source {
            LabelSource::Attr(attr) => record.get(attr).to_raw(),
            LabelSource::OfferingComposite => format!(
                "{} ({}, {})",
                self.course_name(record),
                self.instructor_name(record),
                record.text(Attr::Day).unwrap_or("")
            ),
        }
    }

    /// Shorter offering label used by the selection list view.
    pub fn short_label(&self, record: &Record) -> String {
        format!(
            "{} ({})",
            self.course_name(record),
            self.instructor_name(record)
        )
    }

    fn course_name(&self, offering: &Record) -> &str {
        offering
            .integer(Attr::CourseId)
            .and_then(|id| self.course_names.get(&id))
            .map(|s| s.as_str())
            .unwrap_or(self.unknown)
    }

    fn instructor_name(&self, offering: &Record) -> &str {
        offering
            .integer(Attr::InstructorId)
            .and_then(|id| self.instructor_names.get(&id))
            .map(|s| s.as_str())
            .unwrap_or(self.unknown)
    }
}

fn name_map(store: &Store<'_>, kind: EntityKind) -> Result<HashMap<i64, String>, EngineError> {
    Ok(store
        .fetch_all(kind, None)?
        .into_iter()
        .map(|r| {
            let name = r.text(Attr::Name).unwrap_or_default().to_string();
            (r.id, name)
        })
        .collect())
}
