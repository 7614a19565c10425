//! Workspace catalog settings: the fixed option lists behind enumerated fields.

use crate::db;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CATALOG_KEY: &str = "setup.catalog";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub disciplines: Vec<String>,
    pub weekdays: Vec<String>,
    /// Discipline value that bypasses choice filtering.
    pub other_discipline: String,
    /// Placeholder used in composite labels when a referenced row is missing.
    pub unknown_label: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            disciplines: [
                "Computer",
                "Electrical",
                "Civil",
                "Mechanical",
                "Architecture",
                "Other",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            weekdays: ["Saturday", "Sunday", "Monday", "Tuesday", "Wednesday"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            other_discipline: "Other".to_string(),
            unknown_label: "Unknown".to_string(),
        }
    }
}

/// Which catalog list backs an enumerated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionList {
    Disciplines,
    Weekdays,
}

impl Catalog {
    pub fn options(&self, list: OptionList) -> &[String] {
        match list {
            OptionList::Disciplines => &self.disciplines,
            OptionList::Weekdays => &self.weekdays,
        }
    }

    pub fn is_discipline(&self, value: &str) -> bool {
        self.disciplines.iter().any(|d| d == value)
    }

    pub fn is_other(&self, value: &str) -> bool {
        self.other_discipline == value
    }

    fn check(&self) -> Result<(), String> {
        if self.disciplines.is_empty() {
            return Err("disciplines must not be empty".to_string());
        }
        if self.weekdays.is_empty() {
            return Err("weekdays must not be empty".to_string());
        }
        if !self.is_discipline(&self.other_discipline) {
            return Err("otherDiscipline must be one of disciplines".to_string());
        }
        if self.unknown_label.trim().is_empty() {
            return Err("unknownLabel must not be empty".to_string());
        }
        Ok(())
    }

    /// Applies a partial update; unknown keys and malformed values are rejected.
    pub fn merge_patch(&mut self, patch: &Map<String, Value>) -> Result<(), String> {
        let mut next = self.clone();
        for (k, v) in patch {
            match k.as_str() {
                "disciplines" => next.disciplines = parse_string_list(v, k)?,
                "weekdays" => next.weekdays = parse_string_list(v, k)?,
                "otherDiscipline" => next.other_discipline = parse_string(v, k)?,
                "unknownLabel" => next.unknown_label = parse_string(v, k)?,
                _ => return Err(format!("unknown catalog field: {}", k)),
            }
        }
        next.check()?;
        *self = next;
        Ok(())
    }
}

fn parse_string(v: &Value, key: &str) -> Result<String, String> {
    v.as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| format!("{} must be a string", key))
}

fn parse_string_list(v: &Value, key: &str) -> Result<Vec<String>, String> {
    let Some(items) = v.as_array() else {
        return Err(format!("{} must be an array of strings", key));
    };
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let s = parse_string(item, key)?;
        if s.is_empty() {
            return Err(format!("{} entries must not be empty", key));
        }
        if out.contains(&s) {
            return Err(format!("{} contains duplicate entry {}", key, s));
        }
        out.push(s);
    }
    Ok(out)
}

pub fn load(conn: &Connection) -> anyhow::Result<Catalog> {
    let mut current = Catalog::default();
    if let Some(saved) = db::settings_get_json(conn, CATALOG_KEY)? {
        if let Some(saved_obj) = saved.as_object() {
            // A malformed saved value falls back to the defaults.
            if let Err(msg) = current.merge_patch(saved_obj) {
                log::warn!("ignoring saved catalog settings: {}", msg);
            }
        }
    }
    Ok(current)
}

pub fn save(conn: &Connection, catalog: &Catalog) -> anyhow::Result<()> {
    db::settings_set_json(conn, CATALOG_KEY, &serde_json::to_value(catalog)?)
}
