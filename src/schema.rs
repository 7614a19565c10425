use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Instructor,
    Course,
    Offering,
    Student,
    Selection,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Instructor,
        EntityKind::Course,
        EntityKind::Offering,
        EntityKind::Student,
        EntityKind::Selection,
    ];

    /// Position in `ALL`, for per-kind arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Instructor => 0,
            Self::Course => 1,
            Self::Offering => 2,
            Self::Student => 3,
            Self::Selection => 4,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "instructor" => Some(Self::Instructor),
            "course" => Some(Self::Course),
            "offering" => Some(Self::Offering),
            "student" => Some(Self::Student),
            "selection" => Some(Self::Selection),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instructor => "instructor",
            Self::Course => "course",
            Self::Offering => "offering",
            Self::Student => "student",
            Self::Selection => "selection",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Instructor => "Instructor",
            Self::Course => "Course",
            Self::Offering => "Offering",
            Self::Student => "Student",
            Self::Selection => "Course selection",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Self::Instructor => "instructors",
            Self::Course => "courses",
            Self::Offering => "offerings",
            Self::Student => "students",
            Self::Selection => "selections",
        }
    }

    /// Forms whose foreign-key choices are fed by this kind's records.
    pub fn downstream(self) -> &'static [EntityKind] {
        match self {
            Self::Instructor | Self::Course => &[EntityKind::Offering],
            Self::Student | Self::Offering => &[EntityKind::Selection],
            Self::Selection => &[],
        }
    }

    /// Stored attributes, in column order.
    pub fn attrs(self) -> &'static [Attr] {
        match self {
            Self::Instructor => &[Attr::Name, Attr::Credential, Attr::Phone, Attr::Email],
            Self::Course => &[Attr::Name, Attr::Credits, Attr::Discipline],
            Self::Offering => &[
                Attr::InstructorId,
                Attr::CourseId,
                Attr::Day,
                Attr::StartTime,
                Attr::EndTime,
            ],
            Self::Student => &[
                Attr::Name,
                Attr::EntryTerm,
                Attr::EducationLevel,
                Attr::Phone,
                Attr::Email,
                Attr::Discipline,
            ],
            Self::Selection => &[
                Attr::StudentId,
                Attr::OfferingId,
                Attr::Score,
                Attr::AcademicYear,
            ],
        }
    }

    /// Read-only list view columns handed to the front end.
    pub fn columns(self) -> &'static [ListColumn] {
        match self {
            Self::Instructor => INSTRUCTOR_COLUMNS,
            Self::Course => COURSE_COLUMNS,
            Self::Offering => OFFERING_COLUMNS,
            Self::Student => STUDENT_COLUMNS,
            Self::Selection => SELECTION_COLUMNS,
        }
    }
}

const INSTRUCTOR_COLUMNS: &[ListColumn] = &[
    ListColumn::id(),
    ListColumn::attr("Instructor", Attr::Name),
    ListColumn::attr("Credential", Attr::Credential),
    ListColumn::attr("Phone", Attr::Phone),
    ListColumn::attr("Email", Attr::Email),
];

const COURSE_COLUMNS: &[ListColumn] = &[
    ListColumn::id(),
    ListColumn::attr("Course", Attr::Name),
    ListColumn::attr("Credit units", Attr::Credits),
    ListColumn::attr("Discipline", Attr::Discipline),
];

const OFFERING_COLUMNS: &[ListColumn] = &[
    ListColumn::id(),
    ListColumn::attr("Instructor", Attr::InstructorId),
    ListColumn::attr("Course", Attr::CourseId),
    ListColumn::attr("Day", Attr::Day),
    ListColumn::attr("Start", Attr::StartTime),
    ListColumn::attr("End", Attr::EndTime),
];

const STUDENT_COLUMNS: &[ListColumn] = &[
    ListColumn::id(),
    ListColumn::attr("Student", Attr::Name),
    ListColumn::attr("Entry term", Attr::EntryTerm),
    ListColumn::attr("Level", Attr::EducationLevel),
    ListColumn::attr("Phone", Attr::Phone),
    ListColumn::attr("Email", Attr::Email),
    ListColumn::attr("Discipline", Attr::Discipline),
];

const SELECTION_COLUMNS: &[ListColumn] = &[
    ListColumn::id(),
    ListColumn::attr("Student", Attr::StudentId),
    ListColumn::attr("Offering", Attr::OfferingId),
    ListColumn::attr("Score", Attr::Score),
    ListColumn::attr("Year", Attr::AcademicYear),
];

/// Typed attribute key shared by descriptors, form state and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Attr {
    Name,
    Credential,
    Phone,
    Email,
    Credits,
    Discipline,
    InstructorId,
    CourseId,
    Day,
    StartTime,
    EndTime,
    EntryTerm,
    EducationLevel,
    StudentId,
    OfferingId,
    Score,
    AcademicYear,
    DisciplineFilter,
}

impl Attr {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "credential" => Some(Self::Credential),
            "phone" => Some(Self::Phone),
            "email" => Some(Self::Email),
            "credits" => Some(Self::Credits),
            "discipline" => Some(Self::Discipline),
            "instructorId" => Some(Self::InstructorId),
            "courseId" => Some(Self::CourseId),
            "day" => Some(Self::Day),
            "startTime" => Some(Self::StartTime),
            "endTime" => Some(Self::EndTime),
            "entryTerm" => Some(Self::EntryTerm),
            "educationLevel" => Some(Self::EducationLevel),
            "studentId" => Some(Self::StudentId),
            "offeringId" => Some(Self::OfferingId),
            "score" => Some(Self::Score),
            "academicYear" => Some(Self::AcademicYear),
            "disciplineFilter" => Some(Self::DisciplineFilter),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Credential => "credential",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Credits => "credits",
            Self::Discipline => "discipline",
            Self::InstructorId => "instructorId",
            Self::CourseId => "courseId",
            Self::Day => "day",
            Self::StartTime => "startTime",
            Self::EndTime => "endTime",
            Self::EntryTerm => "entryTerm",
            Self::EducationLevel => "educationLevel",
            Self::StudentId => "studentId",
            Self::OfferingId => "offeringId",
            Self::Score => "score",
            Self::AcademicYear => "academicYear",
            Self::DisciplineFilter => "disciplineFilter",
        }
    }

    /// Storage column. The discipline filter only drives choice narrowing and is never stored.
    pub fn column(self) -> Option<&'static str> {
        match self {
            Self::Name => Some("name"),
            Self::Credential => Some("credential"),
            Self::Phone => Some("phone"),
            Self::Email => Some("email"),
            Self::Credits => Some("credits"),
            Self::Discipline => Some("discipline"),
            Self::InstructorId => Some("instructor_id"),
            Self::CourseId => Some("course_id"),
            Self::Day => Some("day"),
            Self::StartTime => Some("start_time"),
            Self::EndTime => Some("end_time"),
            Self::EntryTerm => Some("entry_term"),
            Self::EducationLevel => Some("education_level"),
            Self::StudentId => Some("student_id"),
            Self::OfferingId => Some("offering_id"),
            Self::Score => Some("score"),
            Self::AcademicYear => Some("academic_year"),
            Self::DisciplineFilter => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey {
    Id,
    Attr(Attr),
}

#[derive(Debug, Clone, Copy)]
pub struct ListColumn {
    pub label: &'static str,
    pub key: ColumnKey,
}

impl ListColumn {
    const fn id() -> Self {
        ListColumn {
            label: "ID",
            key: ColumnKey::Id,
        }
    }

    const fn attr(label: &'static str, attr: Attr) -> Self {
        ListColumn {
            label,
            key: ColumnKey::Attr(attr),
        }
    }

    pub fn key_str(&self) -> &'static str {
        match self.key {
            ColumnKey::Id => "id",
            ColumnKey::Attr(a) => a.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::Text(s.clone()),
            FieldValue::Integer(v) => Value::Integer(*v),
            FieldValue::Real(v) => Value::Real(*v),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Text(s) => serde_json::Value::from(s.as_str()),
            FieldValue::Integer(v) => serde_json::Value::from(*v),
            FieldValue::Real(v) => serde_json::Value::from(*v),
        }
    }

    /// Text shown in an input box when a stored record is loaded into a form.
    pub fn to_raw(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Real(v) => v.to_string(),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => FieldValue::Null,
            Value::Integer(i) => FieldValue::Integer(i),
            Value::Real(f) => FieldValue::Real(f),
            Value::Text(s) => FieldValue::Text(s),
            Value::Blob(b) => FieldValue::Text(String::from_utf8_lossy(&b).into_owned()),
        }
    }
}

/// Typed attribute values produced by validation and consumed by storage.
pub type Payload = BTreeMap<Attr, FieldValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: EntityKind,
    pub id: i64,
    pub values: Payload,
}

impl Record {
    pub fn get(&self, attr: Attr) -> &FieldValue {
        static NULL: FieldValue = FieldValue::Null;
        self.values.get(&attr).unwrap_or(&NULL)
    }

    pub fn text(&self, attr: Attr) -> Option<&str> {
        self.get(attr).as_text()
    }

    pub fn integer(&self, attr: Attr) -> Option<i64> {
        self.get(attr).as_integer()
    }
}
