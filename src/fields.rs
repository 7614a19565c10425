//! Declarative field descriptors: the single place an editable attribute is described.
//!
//! Every form, validation rule and choice list is derived from these tables.

use crate::catalog::OptionList;
use crate::schema::{Attr, EntityKind};

/// Where a foreign-key choice takes its display text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Attr(Attr),
    /// `"<course name> (<instructor name>, <day>)"`
    OfferingComposite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    OptionalText,
    Integer {
        min: Option<i64>,
    },
    OptionalInteger,
    #[allow(dead_code)]
    Real {
        range: Option<(f64, f64)>,
    },
    OptionalReal {
        range: Option<(f64, f64)>,
    },
    DigitCode {
        len: usize,
    },
    Enumerated(OptionList),
    ForeignKey {
        target: EntityKind,
        label: LabelSource,
    },
    /// Foreign key whose choices narrow with the form's discipline filter.
    FilteredForeignKey {
        target: EntityKind,
        label: LabelSource,
    },
    /// Pseudo-field that drives the cascade; never validated or stored.
    DisciplineFilter,
}

impl FieldKind {
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::OptionalText => "optionalText",
            FieldKind::Integer { .. } => "integer",
            FieldKind::OptionalInteger => "optionalInteger",
            FieldKind::Real { .. } => "real",
            FieldKind::OptionalReal { .. } => "optionalReal",
            FieldKind::DigitCode { .. } => "digitCode",
            FieldKind::Enumerated(_) => "enumerated",
            FieldKind::ForeignKey { .. } => "foreignKey",
            FieldKind::FilteredForeignKey { .. } => "filteredForeignKey",
            FieldKind::DisciplineFilter => "disciplineFilter",
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            FieldKind::OptionalText | FieldKind::OptionalInteger | FieldKind::OptionalReal { .. }
        )
    }

    /// Referenced entity and label source for either foreign-key variant.
    pub fn reference(&self) -> Option<(EntityKind, LabelSource)> {
        match *self {
            FieldKind::ForeignKey { target, label }
            | FieldKind::FilteredForeignKey { target, label } => Some((target, label)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub label: &'static str,
    pub attr: Attr,
    pub kind: FieldKind,
}

const fn field(label: &'static str, attr: Attr, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor { label, attr, kind }
}

pub const SCORE_RANGE: (f64, f64) = (0.0, 20.0);
pub const ENTRY_TERM_DIGITS: usize = 3;

static INSTRUCTOR_FIELDS: [FieldDescriptor; 4] = [
    field("Instructor name", Attr::Name, FieldKind::Text),
    field("Credential", Attr::Credential, FieldKind::Text),
    field("Phone", Attr::Phone, FieldKind::Text),
    field("Email", Attr::Email, FieldKind::OptionalText),
];

static COURSE_FIELDS: [FieldDescriptor; 3] = [
    field("Course name", Attr::Name, FieldKind::Text),
    field("Credit units", Attr::Credits, FieldKind::Integer { min: Some(1) }),
    field(
        "Discipline",
        Attr::Discipline,
        FieldKind::Enumerated(OptionList::Disciplines),
    ),
];

static OFFERING_FIELDS: [FieldDescriptor; 5] = [
    field(
        "Instructor",
        Attr::InstructorId,
        FieldKind::ForeignKey {
            target: EntityKind::Instructor,
            label: LabelSource::Attr(Attr::Name),
        },
    ),
    field(
        "Course",
        Attr::CourseId,
        FieldKind::ForeignKey {
            target: EntityKind::Course,
            label: LabelSource::Attr(Attr::Name),
        },
    ),
    field("Day", Attr::Day, FieldKind::Enumerated(OptionList::Weekdays)),
    field("Start time", Attr::StartTime, FieldKind::OptionalInteger),
    field("End time", Attr::EndTime, FieldKind::OptionalInteger),
];

static STUDENT_FIELDS: [FieldDescriptor; 6] = [
    field("Student name", Attr::Name, FieldKind::Text),
    field(
        "Entry term",
        Attr::EntryTerm,
        FieldKind::DigitCode {
            len: ENTRY_TERM_DIGITS,
        },
    ),
    field("Education level", Attr::EducationLevel, FieldKind::Text),
    field("Phone", Attr::Phone, FieldKind::Text),
    field("Email", Attr::Email, FieldKind::OptionalText),
    field(
        "Discipline",
        Attr::Discipline,
        FieldKind::Enumerated(OptionList::Disciplines),
    ),
];

static SELECTION_FIELDS: [FieldDescriptor; 5] = [
    field(
        "Discipline",
        Attr::DisciplineFilter,
        FieldKind::DisciplineFilter,
    ),
    field(
        "Student",
        Attr::StudentId,
        FieldKind::FilteredForeignKey {
            target: EntityKind::Student,
            label: LabelSource::Attr(Attr::Name),
        },
    ),
    field(
        "Offering",
        Attr::OfferingId,
        FieldKind::FilteredForeignKey {
            target: EntityKind::Offering,
            label: LabelSource::OfferingComposite,
        },
    ),
    field("Academic year", Attr::AcademicYear, FieldKind::OptionalInteger),
    field(
        "Score",
        Attr::Score,
        FieldKind::OptionalReal {
            range: Some(SCORE_RANGE),
        },
    ),
];

pub fn descriptors(kind: EntityKind) -> &'static [FieldDescriptor] {
    match kind {
        EntityKind::Instructor => &INSTRUCTOR_FIELDS,
        EntityKind::Course => &COURSE_FIELDS,
        EntityKind::Offering => &OFFERING_FIELDS,
        EntityKind::Student => &STUDENT_FIELDS,
        EntityKind::Selection => &SELECTION_FIELDS,
    }
}

pub fn descriptor(kind: EntityKind, attr: Attr) -> Option<&'static FieldDescriptor> {
    descriptors(kind).iter().find(|d| d.attr == attr)
}

pub fn has_discipline_filter(kind: EntityKind) -> bool {
    descriptors(kind)
        .iter()
        .any(|d| matches!(d.kind, FieldKind::DisciplineFilter))
}
