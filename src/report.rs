//! Credit-weighted score average for one student.

use crate::error::EngineError;
use crate::schema::EntityKind;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// Band thresholds on the 0..=20 scale: below 9 weak, below 15 average.
pub const WEAK_BELOW: f64 = 9.0;
pub const AVERAGE_BELOW: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Band {
    Weak,
    Average,
    Excellent,
}

/// `None` for a value outside the score scale.
pub fn classify(average: f64) -> Option<Band> {
    if !(0.0..=20.0).contains(&average) {
        return None;
    }
    Some(if average < WEAK_BELOW {
        Band::Weak
    } else if average < AVERAGE_BELOW {
        Band::Average
    } else {
        Band::Excellent
    })
}

/// `sum(score * credits) / sum(credits)` over `(score, credits)` pairs.
/// Returns `None` when no credits are counted.
pub fn credit_weighted_average(pairs: &[(f64, i64)]) -> Option<f64> {
    let (weighted, credits) = pairs
        .iter()
        .filter(|(_, c)| *c > 0)
        .fold((0.0_f64, 0_i64), |(w, c), (score, credits)| {
            (w + score * (*credits as f64), c + credits)
        });
    if credits == 0 {
        None
    } else {
        Some(weighted / credits as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
pub enum StudentAverage {
    /// The student has no scored selections.
    NoData {
        student_id: i64,
        student_name: String,
    },
    Scored {
        student_id: i64,
        student_name: String,
        average: f64,
        band: Option<Band>,
        credits: i64,
        selections: usize,
    },
}

/// Parses a raw student id the way form integers are parsed.
pub fn parse_student_id(raw: &str) -> Result<i64, EngineError> {
    raw.trim().parse::<i64>().map_err(|_| EngineError::TypeError {
        field: "studentId".to_string(),
        expected: "an integer",
    })
}

/// Averages every scored selection of the student, weighted by the credit
/// units of the offering's course. Unscored selections are skipped.
pub fn student_average(conn: &Connection, student_id: i64) -> Result<StudentAverage, EngineError> {
    let student_name: String = conn
        .query_row(
            "SELECT name FROM students WHERE id = ?",
            [student_id],
            |r| r.get(0),
        )
        .optional()?
        .ok_or(EngineError::NotFound {
            entity: EntityKind::Student,
            id: student_id,
        })?;

    let mut stmt = conn.prepare(
        "SELECT s.score, c.credits
         FROM selections s
         JOIN offerings o ON o.id = s.offering_id
         JOIN courses c ON c.id = o.course_id
         WHERE s.student_id = ? AND s.score IS NOT NULL
         ORDER BY s.id",
    )?;
    let pairs = stmt
        .query_map(params![student_id], |r| {
            Ok((r.get::<_, f64>(0)?, r.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let Some(average) = credit_weighted_average(&pairs) else {
        return Ok(StudentAverage::NoData {
            student_id,
            student_name,
        });
    };
    log::debug!("student {} average {:.3} over {} selections", student_id, average, pairs.len());
    Ok(StudentAverage::Scored {
        student_id,
        student_name,
        average,
        band: classify(average),
        credits: pairs.iter().map(|(_, c)| c).sum(),
        selections: pairs.len(),
    })
}
