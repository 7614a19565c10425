//! The open workspace: storage handle, catalog, choice caches and form state.
//!
//! Every form operation goes through a `Session`; there is no other shared
//! state. A session is created by `Session::open` and ended by `close`.

use crate::catalog::{self, Catalog};
use crate::choices::{choice_token, resolve_choices, ChoiceCache, ChoiceSet, Labeler};
use crate::db;
use crate::engine;
use crate::error::EngineError;
use crate::fields::{self, FieldKind, LabelSource};
use crate::forms::{FormState, RawInputs};
use crate::schema::{Attr, ColumnKey, EntityKind, Payload, Record};
use crate::store::Store;
use rusqlite::Connection;
use serde_json::{json, Map};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Result of a successful create, update or delete.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub id: i64,
    pub rows: Vec<serde_json::Value>,
    pub refreshed: Vec<EntityKind>,
}

pub struct Session {
    workspace: PathBuf,
    conn: Connection,
    catalog: Catalog,
    choices: ChoiceCache,
    forms: [FormState; 5],
}

impl Session {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace)?;
        let session = Self::from_connection(workspace, conn)?;
        log::info!("workspace opened: {}", workspace.to_string_lossy());
        Ok(session)
    }

    /// Builds a session over an already initialized connection.
    pub fn from_connection(workspace: &Path, conn: Connection) -> anyhow::Result<Self> {
        let catalog = catalog::load(&conn)?;
        let mut session = Session {
            workspace: workspace.to_path_buf(),
            conn,
            catalog,
            choices: ChoiceCache::default(),
            forms: EntityKind::ALL.map(FormState::new),
        };
        for kind in EntityKind::ALL {
            session.refresh_form_choices(kind)?;
        }
        Ok(session)
    }

    pub fn close(self) -> anyhow::Result<()> {
        let workspace = self.workspace;
        self.conn.close().map_err(|(_, e)| e)?;
        log::info!("workspace closed: {}", workspace.to_string_lossy());
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn store(&self) -> Store<'_> {
        Store::new(&self.conn)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Persists new catalog settings and re-resolves every form's choices.
    pub fn set_catalog(&mut self, catalog: Catalog) -> anyhow::Result<()> {
        catalog::save(&self.conn, &catalog)?;
        self.catalog = catalog;
        self.choices.clear();
        for kind in EntityKind::ALL {
            self.refresh_form_choices(kind)?;
        }
        Ok(())
    }

    pub fn form(&self, kind: EntityKind) -> &FormState {
        &self.forms[kind.index()]
    }

    fn form_mut(&mut self, kind: EntityKind) -> &mut FormState {
        &mut self.forms[kind.index()]
    }

    /// Current options of a foreign-key field under its form's active filter.
    pub fn field_choices(&self, kind: EntityKind, attr: Attr) -> Option<&ChoiceSet> {
        let d = fields::descriptor(kind, attr)?;
        match d.kind {
            FieldKind::ForeignKey { target, .. } => self.choices.get(target, None),
            FieldKind::FilteredForeignKey { target, .. } => {
                self.choices.get(target, self.form(kind).active_filter())
            }
            _ => None,
        }
    }

    /// Fresh-open (or tab focus) state: inputs cleared, cascade unfiltered,
    /// choices re-resolved.
    pub fn open_form(&mut self, kind: EntityKind) -> Result<(), EngineError> {
        self.form_mut(kind).reset();
        self.refresh_form_choices(kind)
    }

    pub fn set_field(&mut self, kind: EntityKind, attr: Attr, raw: &str) -> Result<(), EngineError> {
        let Some(d) = fields::descriptor(kind, attr) else {
            return Err(EngineError::UnknownField {
                entity: kind,
                field: attr.as_str().to_string(),
            });
        };
        if matches!(d.kind, FieldKind::DisciplineFilter) {
            return self.select_discipline(kind, raw);
        }
        self.form_mut(kind).set(attr, raw)
    }

    /// Cascade transition: narrows every filtered foreign-key field of the form
    /// and clears whatever was chosen in them.
    fn select_discipline(&mut self, kind: EntityKind, raw: &str) -> Result<(), EngineError> {
        let discipline = raw.trim();
        if !discipline.is_empty() && !self.catalog.is_discipline(discipline) {
            return Err(EngineError::InvalidSelection {
                field: Attr::DisciplineFilter.as_str().to_string(),
            });
        }

        let form = self.form_mut(kind);
        let Some(cascade) = form.cascade_mut() else {
            return Err(EngineError::UnknownField {
                entity: kind,
                field: Attr::DisciplineFilter.as_str().to_string(),
            });
        };
        let state = cascade.select(discipline).clone();
        form.set(Attr::DisciplineFilter, discipline)?;
        for d in fields::descriptors(kind) {
            if matches!(d.kind, FieldKind::FilteredForeignKey { .. }) {
                form.set(d.attr, "")?;
            }
        }
        log::debug!("{:?} form filter -> {:?}", kind, state);
        self.refresh_form_choices(kind)
    }

    /// Loads a stored record into the form and makes it the current selection.
    pub fn select_row(&mut self, kind: EntityKind, id: i64) -> Result<(), EngineError> {
        let record = self
            .store()
            .fetch_by_id(kind, id)?
            .ok_or(EngineError::NotFound { entity: kind, id })?;

        if self.form(kind).cascade().is_some() {
            let discipline = self.record_discipline(kind, &record)?;
            self.select_discipline(kind, discipline.as_deref().unwrap_or(""))?;
        }

        let form = self.form_mut(kind);
        form.clear_record();
        for d in fields::descriptors(kind) {
            let raw = match d.kind {
                FieldKind::DisciplineFilter => continue,
                FieldKind::ForeignKey { target, .. } | FieldKind::FilteredForeignKey { target, .. } => {
                    match record.integer(d.attr) {
                        Some(ref_id) => choice_token(target, ref_id),
                        None => String::new(),
                    }
                }
                _ => record.get(d.attr).to_raw(),
            };
            form.set(d.attr, &raw)?;
        }
        form.select(id);
        Ok(())
    }

    /// The discipline shared by every filtered reference of the record, or
    /// `None` when they disagree or one has no catalog discipline. A record
    /// created while unfiltered can then still be reloaded and saved as is.
    fn record_discipline(
        &self,
        kind: EntityKind,
        record: &Record,
    ) -> Result<Option<String>, EngineError> {
        let mut shared: Option<String> = None;
        for d in fields::descriptors(kind) {
            let FieldKind::FilteredForeignKey { target, .. } = d.kind else {
                continue;
            };
            let Some(ref_id) = record.integer(d.attr) else {
                return Ok(None);
            };
            let Some(discipline) = self.reference_discipline(target, ref_id)? else {
                return Ok(None);
            };
            if !self.catalog.is_discipline(&discipline) {
                return Ok(None);
            }
            match &shared {
                Some(seen) if *seen != discipline => return Ok(None),
                Some(_) => {}
                None => shared = Some(discipline),
            }
        }
        Ok(shared)
    }

    /// Discipline a filtered reference is matched on: its own, or for an
    /// offering the discipline of its course.
    fn reference_discipline(
        &self,
        target: EntityKind,
        id: i64,
    ) -> Result<Option<String>, EngineError> {
        let store = self.store();
        let Some(referenced) = store.fetch_by_id(target, id)? else {
            return Ok(None);
        };
        if target == EntityKind::Offering {
            let Some(course_id) = referenced.integer(Attr::CourseId) else {
                return Ok(None);
            };
            return Ok(store
                .fetch_by_id(EntityKind::Course, course_id)?
                .and_then(|c| c.text(Attr::Discipline).map(|s| s.to_string())));
        }
        Ok(referenced.text(Attr::Discipline).map(|s| s.to_string()))
    }

    /// Copies request inputs into the form. A changed discipline filter is
    /// applied first so it cannot clear choices sent alongside it.
    pub fn apply_inputs(&mut self, kind: EntityKind, inputs: &RawInputs) -> Result<(), EngineError> {
        if let Some(filter) = inputs.get(&Attr::DisciplineFilter) {
            if filter.trim() != self.form(kind).raw(Attr::DisciplineFilter) {
                self.set_field(kind, Attr::DisciplineFilter, filter)?;
            }
        }
        for (attr, raw) in inputs {
            if *attr == Attr::DisciplineFilter {
                continue;
            }
            self.set_field(kind, *attr, raw)?;
        }
        Ok(())
    }

    pub fn validate(&self, kind: EntityKind) -> Result<Payload, EngineError> {
        let form = self.form(kind);
        engine::validate(
            kind,
            form.values(),
            form.active_filter(),
            &self.catalog,
            &self.choices,
        )
    }

    pub fn create(&mut self, kind: EntityKind) -> Result<MutationOutcome, EngineError> {
        let payload = self.validate(kind)?;
        let id = self.store().insert(kind, &payload)?;
        log::info!("created {:?} {}", kind, id);
        self.after_mutation(kind, id)
    }

    /// Whole-record overwrite of the selected row.
    pub fn update(&mut self, kind: EntityKind) -> Result<MutationOutcome, EngineError> {
        let id = self
            .form(kind)
            .selected()
            .ok_or(EngineError::NoSelection { entity: kind })?;
        let payload = self.validate(kind)?;
        self.store().update(kind, id, &payload)?;
        log::info!("updated {:?} {}", kind, id);
        self.after_mutation(kind, id)
    }

    pub fn delete(&mut self, kind: EntityKind) -> Result<MutationOutcome, EngineError> {
        let id = self
            .form(kind)
            .selected()
            .ok_or(EngineError::NoSelection { entity: kind })?;
        self.store().delete(kind, id)?;
        log::info!("deleted {:?} {}", kind, id);
        self.after_mutation(kind, id)
    }

    fn after_mutation(&mut self, kind: EntityKind, id: i64) -> Result<MutationOutcome, EngineError> {
        self.form_mut(kind).clear_record();
        let refreshed = self.refresh_downstream(kind)?;
        let rows = self.list_rows(kind)?;
        Ok(MutationOutcome { id, rows, refreshed })
    }

    /// Re-resolves the choices of every form fed, directly or through another
    /// form, by `kind`. Returns the forms touched.
    ///
    /// Cached sets of `kind` and of every kind whose labels embed it are
    /// dropped first, whatever filter they were resolved under.
    pub fn refresh_downstream(&mut self, kind: EntityKind) -> Result<Vec<EntityKind>, EngineError> {
        let mut pending: Vec<EntityKind> = kind.downstream().to_vec();
        let mut refreshed: Vec<EntityKind> = Vec::new();
        while let Some(next) = pending.pop() {
            if refreshed.contains(&next) {
                continue;
            }
            refreshed.push(next);
            pending.extend_from_slice(next.downstream());
        }
        refreshed.sort();

        self.choices.invalidate(kind);
        for next in &refreshed {
            self.choices.invalidate(*next);
        }
        for next in &refreshed {
            self.refresh_form_choices(*next)?;
        }
        Ok(refreshed)
    }

    /// Re-reads one form's choices and everything downstream of `kind`.
    /// Returns the forms touched, `kind` included.
    pub fn refresh(&mut self, kind: EntityKind) -> Result<Vec<EntityKind>, EngineError> {
        for d in fields::descriptors(kind) {
            if let Some((target, _)) = d.kind.reference() {
                self.choices.invalidate(target);
            }
        }
        self.refresh_form_choices(kind)?;
        let mut refreshed = self.refresh_downstream(kind)?;
        refreshed.push(kind);
        refreshed.sort();
        refreshed.dedup();
        Ok(refreshed)
    }

    /// Resolves every foreign-key field of one form under its active filter.
    /// A chosen token that no longer exists is cleared.
    fn refresh_form_choices(&mut self, kind: EntityKind) -> Result<(), EngineError> {
        for d in fields::descriptors(kind) {
            let (target, label, filter) = match d.kind {
                FieldKind::ForeignKey { target, label } => (target, label, None),
                FieldKind::FilteredForeignKey { target, label } => (
                    target,
                    label,
                    self.form(kind).active_filter().map(|s| s.to_string()),
                ),
                _ => continue,
            };
            let set = resolve_choices(
                &self.store(),
                &self.catalog,
                target,
                label,
                filter.as_deref(),
            )?;

            let chosen = self.form(kind).raw(d.attr).to_string();
            if !chosen.is_empty() && !set.contains(&chosen) {
                self.form_mut(kind).set(d.attr, "")?;
            }
            self.choices.put(target, filter.as_deref(), set);
        }
        Ok(())
    }

    /// Full re-read of one entity's list view, references rendered as labels.
    pub fn list_rows(&self, kind: EntityKind) -> Result<Vec<serde_json::Value>, EngineError> {
        let store = self.store();
        let mut ref_labels: HashMap<Attr, HashMap<i64, String>> = HashMap::new();
        for col in kind.columns() {
            let ColumnKey::Attr(attr) = col.key else {
                continue;
            };
            let Some((target, source)) = fields::descriptor(kind, attr).and_then(|d| d.kind.reference())
            else {
                continue;
            };
            let labeler = Labeler::load(&store, &self.catalog, source)?;
            let labels = store
                .fetch_all(target, None)?
                .iter()
                .map(|r| {
                    let text = match source {
                        LabelSource::OfferingComposite => labeler.short_label(r),
                        LabelSource::Attr(_) => labeler.label(r),
                    };
                    (r.id, text)
                })
                .collect();
            ref_labels.insert(attr, labels);
        }

        let records = store.fetch_all(kind, None)?;
        let rows = records
            .iter()
            .map(|r| {
                let mut row = Map::new();
                for col in kind.columns() {
                    let value = match col.key {
                        ColumnKey::Id => json!(r.id),
                        ColumnKey::Attr(attr) => match ref_labels.get(&attr) {
                            Some(labels) => {
                                let label = r
                                    .integer(attr)
                                    .and_then(|id| labels.get(&id))
                                    .map(|s| s.as_str())
                                    .unwrap_or(self.catalog.unknown_label.as_str());
                                json!(label)
                            }
                            None => r.get(attr).to_json(),
                        },
                    };
                    row.insert(col.key_str().to_string(), value);
                }
                serde_json::Value::Object(row)
            })
            .collect();
        Ok(rows)
    }

    pub fn record_json(&self, kind: EntityKind, id: i64) -> Result<serde_json::Value, EngineError> {
        let record = self
            .store()
            .fetch_by_id(kind, id)?
            .ok_or(EngineError::NotFound { entity: kind, id })?;
        let mut obj = Map::new();
        obj.insert("entity".to_string(), json!(record.kind.as_str()));
        obj.insert("id".to_string(), json!(record.id));
        for (attr, value) in &record.values {
            obj.insert(attr.as_str().to_string(), value.to_json());
        }
        Ok(serde_json::Value::Object(obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::FilterState;
    use crate::schema::FieldValue;

    fn session() -> Session {
        let conn = Connection::open_in_memory().expect("open");
        db::init_schema(&conn).expect("schema");
        Session::from_connection(Path::new(":memory:"), conn).expect("session")
    }

    fn fill(s: &mut Session, kind: EntityKind, pairs: &[(Attr, &str)]) {
        let inputs: RawInputs = pairs.iter().map(|(a, v)| (*a, v.to_string())).collect();
        s.apply_inputs(kind, &inputs).expect("apply inputs");
    }

    fn add_instructor(s: &mut Session, name: &str) -> i64 {
        fill(
            s,
            EntityKind::Instructor,
            &[
                (Attr::Name, name),
                (Attr::Credential, "PhD"),
                (Attr::Phone, "0912"),
            ],
        );
        s.create(EntityKind::Instructor).expect("create instructor").id
    }

    fn add_course(s: &mut Session, name: &str, credits: &str, discipline: &str) -> i64 {
        fill(
            s,
            EntityKind::Course,
            &[
                (Attr::Name, name),
                (Attr::Credits, credits),
                (Attr::Discipline, discipline),
            ],
        );
        s.create(EntityKind::Course).expect("create course").id
    }

    fn add_student(s: &mut Session, name: &str, discipline: &str) -> i64 {
        fill(
            s,
            EntityKind::Student,
            &[
                (Attr::Name, name),
                (Attr::EntryTerm, "012"),
                (Attr::EducationLevel, "BSc"),
                (Attr::Phone, "0912"),
                (Attr::Discipline, discipline),
            ],
        );
        s.create(EntityKind::Student).expect("create student").id
    }

    fn add_offering(s: &mut Session, instructor: i64, course: i64) -> i64 {
        let i = choice_token(EntityKind::Instructor, instructor);
        let c = choice_token(EntityKind::Course, course);
        fill(
            s,
            EntityKind::Offering,
            &[
                (Attr::InstructorId, i.as_str()),
                (Attr::CourseId, c.as_str()),
                (Attr::Day, "Monday"),
            ],
        );
        s.create(EntityKind::Offering).expect("create offering").id
    }

    #[test]
    fn create_round_trips_and_delete_restores_count() {
        let mut s = session();
        let before = s.store().count(EntityKind::Course).expect("count");
        let id = add_course(&mut s, "Algorithms", "3", "Computer");

        let rec = s
            .store()
            .fetch_by_id(EntityKind::Course, id)
            .expect("fetch")
            .expect("present");
        assert_eq!(rec.text(Attr::Name), Some("Algorithms"));
        assert_eq!(rec.integer(Attr::Credits), Some(3));
        assert_eq!(rec.text(Attr::Discipline), Some("Computer"));

        s.select_row(EntityKind::Course, id).expect("select");
        let out = s.delete(EntityKind::Course).expect("delete");
        assert!(out.rows.is_empty());
        assert_eq!(s.store().count(EntityKind::Course).expect("count"), before);
    }

    #[test]
    fn new_upstream_rows_show_up_in_dependent_choices() {
        let mut s = session();
        let iid = add_instructor(&mut s, "Dr. Rahimi");
        let choices = s
            .field_choices(EntityKind::Offering, Attr::InstructorId)
            .expect("instructor choices");
        assert_eq!(choices.ids(), vec![iid]);
    }

    #[test]
    fn update_and_delete_need_a_selection() {
        let mut s = session();
        let err = s.update(EntityKind::Instructor).expect_err("nothing selected");
        assert_eq!(err.code(), "no_selection");
        let err = s.delete(EntityKind::Instructor).expect_err("nothing selected");
        assert_eq!(err.code(), "no_selection");
    }

    #[test]
    fn referenced_rows_cannot_be_deleted() {
        let mut s = session();
        let iid = add_instructor(&mut s, "Dr. Rahimi");
        let cid = add_course(&mut s, "Algorithms", "3", "Computer");
        let oid = add_offering(&mut s, iid, cid);
        let sid = add_student(&mut s, "Sara", "Computer");

        s.set_field(EntityKind::Selection, Attr::DisciplineFilter, "Computer")
            .expect("filter");
        let st = choice_token(EntityKind::Student, sid);
        let of = choice_token(EntityKind::Offering, oid);
        fill(
            &mut s,
            EntityKind::Selection,
            &[(Attr::StudentId, st.as_str()), (Attr::OfferingId, of.as_str()), (Attr::Score, "17")],
        );
        s.create(EntityKind::Selection).expect("selection");

        for (kind, id) in [
            (EntityKind::Instructor, iid),
            (EntityKind::Course, cid),
            (EntityKind::Offering, oid),
            (EntityKind::Student, sid),
        ] {
            s.select_row(kind, id).expect("select");
            let err = s.delete(kind).expect_err("referenced");
            assert_eq!(err.code(), "dependency_error", "{:?}", kind);
            assert!(s.store().fetch_by_id(kind, id).expect("fetch").is_some());
        }
    }

    #[test]
    fn discipline_transition_narrows_and_clears_choices() {
        let mut s = session();
        let iid = add_instructor(&mut s, "Dr. Rahimi");
        let c1 = add_course(&mut s, "Algorithms", "3", "Computer");
        let c2 = add_course(&mut s, "Statics", "2", "Civil");
        let o1 = add_offering(&mut s, iid, c1);
        add_offering(&mut s, iid, c2);
        let sara = add_student(&mut s, "Sara", "Computer");
        add_student(&mut s, "Ali", "Civil");

        s.open_form(EntityKind::Selection).expect("open");
        let all = s
            .field_choices(EntityKind::Selection, Attr::StudentId)
            .expect("students")
            .clone();
        assert_eq!(all.options().len(), 2);

        s.set_field(EntityKind::Selection, Attr::DisciplineFilter, "Other")
            .expect("other");
        let other = s
            .field_choices(EntityKind::Selection, Attr::StudentId)
            .expect("students");
        assert_eq!(other.options(), all.options());

        let token = choice_token(EntityKind::Student, sara);
        s.set_field(EntityKind::Selection, Attr::StudentId, &token)
            .expect("choose sara");
        s.set_field(EntityKind::Selection, Attr::DisciplineFilter, "Civil")
            .expect("civil");
        assert_eq!(s.form(EntityKind::Selection).raw(Attr::StudentId), "");
        assert_eq!(
            s.form(EntityKind::Selection).cascade().map(|c| c.state().clone()),
            Some(FilterState::Filtered("Civil".to_string()))
        );
        let civil = s
            .field_choices(EntityKind::Selection, Attr::StudentId)
            .expect("students");
        assert_eq!(civil.labels(), vec!["Ali"]);
        let offerings = s
            .field_choices(EntityKind::Selection, Attr::OfferingId)
            .expect("offerings");
        assert_eq!(offerings.labels(), vec!["Statics (Dr. Rahimi, Monday)"]);

        // The old token is stale under the new filter.
        s.set_field(EntityKind::Selection, Attr::StudentId, &token)
            .expect("set raw");
        let of = choice_token(EntityKind::Offering, o1);
        s.set_field(EntityKind::Selection, Attr::OfferingId, &of)
            .expect("set raw");
        let err = s.validate(EntityKind::Selection).expect_err("stale");
        assert_eq!(err.code(), "invalid_selection");

        let err = s
            .set_field(EntityKind::Selection, Attr::DisciplineFilter, "Astrology")
            .expect_err("unknown discipline");
        assert_eq!(err.code(), "invalid_selection");
    }

    #[test]
    fn selecting_a_selection_row_restores_its_filter() {
        let mut s = session();
        let iid = add_instructor(&mut s, "Dr. Rahimi");
        let cid = add_course(&mut s, "Statics", "2", "Civil");
        let oid = add_offering(&mut s, iid, cid);
        let sid = add_student(&mut s, "Ali", "Civil");

        s.set_field(EntityKind::Selection, Attr::DisciplineFilter, "Civil")
            .expect("filter");
        let st = choice_token(EntityKind::Student, sid);
        let of = choice_token(EntityKind::Offering, oid);
        fill(
            &mut s,
            EntityKind::Selection,
            &[(Attr::StudentId, st.as_str()), (Attr::OfferingId, of.as_str()), (Attr::Score, "14.5")],
        );
        let created = s.create(EntityKind::Selection).expect("create");

        s.open_form(EntityKind::Selection).expect("reopen");
        assert_eq!(s.form(EntityKind::Selection).active_filter(), None);

        s.select_row(EntityKind::Selection, created.id).expect("select");
        let form = s.form(EntityKind::Selection);
        assert_eq!(form.active_filter(), Some("Civil"));
        assert_eq!(form.raw(Attr::StudentId), st);
        assert_eq!(form.raw(Attr::Score), "14.5");

        fill(&mut s, EntityKind::Selection, &[(Attr::Score, "16")]);
        s.update(EntityKind::Selection).expect("update");
        let rec = s
            .store()
            .fetch_by_id(EntityKind::Selection, created.id)
            .expect("fetch")
            .expect("present");
        assert_eq!(rec.get(Attr::Score), &FieldValue::Real(16.0));
    }

    #[test]
    fn cross_discipline_selection_reloads_unfiltered_and_updates() {
        let mut s = session();
        let iid = add_instructor(&mut s, "Dr. Rahimi");
        let cid = add_course(&mut s, "Algorithms", "3", "Computer");
        let oid = add_offering(&mut s, iid, cid);
        let sid = add_student(&mut s, "Ali", "Civil");

        let st = choice_token(EntityKind::Student, sid);
        let of = choice_token(EntityKind::Offering, oid);
        fill(
            &mut s,
            EntityKind::Selection,
            &[(Attr::StudentId, st.as_str()), (Attr::OfferingId, of.as_str())],
        );
        let created = s.create(EntityKind::Selection).expect("create unfiltered");

        s.select_row(EntityKind::Selection, created.id).expect("select");
        let form = s.form(EntityKind::Selection);
        assert_eq!(form.active_filter(), None);
        assert_eq!(form.raw(Attr::OfferingId), of);

        fill(&mut s, EntityKind::Selection, &[(Attr::Score, "12")]);
        s.update(EntityKind::Selection).expect("update");
        let rec = s
            .store()
            .fetch_by_id(EntityKind::Selection, created.id)
            .expect("fetch")
            .expect("present");
        assert_eq!(rec.get(Attr::Score), &FieldValue::Real(12.0));
        assert_eq!(rec.integer(Attr::OfferingId), Some(oid));
    }

    #[test]
    fn course_rename_reaches_selection_offering_labels() {
        let mut s = session();
        let iid = add_instructor(&mut s, "Dr. Rahimi");
        let cid = add_course(&mut s, "Statics", "2", "Civil");
        add_offering(&mut s, iid, cid);

        s.select_row(EntityKind::Course, cid).expect("select");
        fill(&mut s, EntityKind::Course, &[(Attr::Name, "Dynamics")]);
        let out = s.update(EntityKind::Course).expect("update");
        assert_eq!(out.refreshed, vec![EntityKind::Offering, EntityKind::Selection]);

        let labels = s
            .field_choices(EntityKind::Selection, Attr::OfferingId)
            .expect("offerings")
            .labels()
            .join("|");
        assert_eq!(labels, "Dynamics (Dr. Rahimi, Monday)");
    }

    #[test]
    fn list_rows_render_references_as_labels() {
        let mut s = session();
        let iid = add_instructor(&mut s, "Dr. Rahimi");
        let cid = add_course(&mut s, "Statics", "2", "Civil");
        add_offering(&mut s, iid, cid);

        let rows = s.list_rows(EntityKind::Offering).expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["instructorId"], json!("Dr. Rahimi"));
        assert_eq!(rows[0]["courseId"], json!("Statics"));
        assert_eq!(rows[0]["day"], json!("Monday"));
    }
}
