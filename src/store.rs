use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

pub const DATE_FMT: &str = "%d-%m-%Y";

/// Attendance mark for a single student on a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    Present,
    Absent,
    Excused,
}

impl Status {
    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "Present" => Some(Status::Present),
            "Absent" => Some(Status::Absent),
            "Excused" => Some(Status::Excused),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
            Status::Excused => "Excused",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub name: String,
    pub matric: String,
    pub date: String,
    pub status: Status,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid date '{value}': expected DD-MM-YYYY")]
    BadDate { value: String },
    #[error("matric {matric} already recorded for {course} on {date}")]
    Duplicate {
        course: String,
        matric: String,
        date: String,
    },
    #[error("no entry at index {index} in course '{course}'")]
    NotFound { course: String, index: usize },
}

pub fn parse_date(value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, DATE_FMT).map_err(|_| StoreError::BadDate {
        value: value.to_string(),
    })
}

pub fn today() -> String {
    chrono::Local::now().date_naive().format(DATE_FMT).to_string()
}

#[derive(Debug, Clone)]
struct Course {
    name: String,
    entries: Vec<AttendanceEntry>,
}

/// Insertion-ordered mapping of course name to attendance entries.
///
/// Invariant: within a course, at most one entry per (matric, date); a course
/// with no entries does not exist in the store.
#[derive(Debug, Clone, Default)]
pub struct AttendanceStore {
    courses: Vec<Course>,
}

impl AttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from the persisted JSON blob. Anything malformed is
    /// dropped rather than surfaced: a corrupt value loads as an empty store,
    /// a corrupt entry is skipped.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let mut store = Self::new();
        let Some(map) = value.as_object() else {
            return store;
        };
        for (course, raw_entries) in map {
            let Some(arr) = raw_entries.as_array() else {
                continue;
            };
            if course.trim().is_empty() {
                continue;
            }
            for raw in arr {
                if let Ok(entry) = serde_json::from_value::<AttendanceEntry>(raw.clone()) {
                    // Re-apply the store invariants on the way in.
                    let _ =
                        store.add_entry(course, &entry.name, &entry.matric, &entry.date, entry.status);
                }
            }
        }
        store
    }

    /// Serialize to the persisted shape: course -> array of entries, courses
    /// in insertion order (serde_json preserve_order keeps it on disk).
    pub fn to_value(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for course in &self.courses {
            map.insert(course.name.clone(), json!(course.entries));
        }
        serde_json::Value::Object(map)
    }

    pub fn add_entry(
        &mut self,
        course: &str,
        name: &str,
        matric: &str,
        date: &str,
        status: Status,
    ) -> Result<(), StoreError> {
        let course = require(course, "course")?;
        let name = require(name, "name")?;
        let matric = require(matric, "matric")?;
        parse_date(date)?;

        if let Some(c) = self.find(&course) {
            if c.entries.iter().any(|e| e.matric == matric && e.date == date) {
                return Err(StoreError::Duplicate {
                    course,
                    matric,
                    date: date.to_string(),
                });
            }
        }
        let entry = AttendanceEntry {
            name,
            matric,
            date: date.to_string(),
            status,
        };
        self.find_or_create(&course).entries.push(entry);
        Ok(())
    }

    pub fn edit_entry(
        &mut self,
        course: &str,
        index: usize,
        updated: AttendanceEntry,
    ) -> Result<(), StoreError> {
        require(&updated.name, "name")?;
        require(&updated.matric, "matric")?;
        parse_date(&updated.date)?;

        let Some(c) = self.find_mut(course) else {
            return Err(StoreError::NotFound {
                course: course.to_string(),
                index,
            });
        };
        if index >= c.entries.len() {
            return Err(StoreError::NotFound {
                course: course.to_string(),
                index,
            });
        }
        // The entry being edited never collides with itself.
        let collision = c
            .entries
            .iter()
            .enumerate()
            .any(|(i, e)| i != index && e.matric == updated.matric && e.date == updated.date);
        if collision {
            return Err(StoreError::Duplicate {
                course: course.to_string(),
                matric: updated.matric,
                date: updated.date,
            });
        }
        c.entries[index] = updated;
        Ok(())
    }

    pub fn delete_entry(&mut self, course: &str, index: usize) -> Result<AttendanceEntry, StoreError> {
        let pos = self.courses.iter().position(|c| c.name == course);
        let Some(pos) = pos else {
            return Err(StoreError::NotFound {
                course: course.to_string(),
                index,
            });
        };
        if index >= self.courses[pos].entries.len() {
            return Err(StoreError::NotFound {
                course: course.to_string(),
                index,
            });
        }
        let removed = self.courses[pos].entries.remove(index);
        if self.courses[pos].entries.is_empty() {
            self.courses.remove(pos);
        }
        Ok(removed)
    }

    /// Courses in insertion order, entries within each course sorted by
    /// matric (numeric-aware, so "S10" lands after "S2"). Stored order is
    /// left untouched.
    pub fn grouped(&self, filter: Option<&str>) -> Vec<(&str, Vec<&AttendanceEntry>)> {
        self.courses
            .iter()
            .filter(|c| filter.map(|f| f == c.name).unwrap_or(true))
            .map(|c| {
                let mut entries: Vec<&AttendanceEntry> = c.entries.iter().collect();
                entries.sort_by(|a, b| matric_cmp(&a.matric, &b.matric));
                (c.name.as_str(), entries)
            })
            .collect()
    }

    pub fn courses(&self) -> Vec<&str> {
        self.courses.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_course(&self, course: &str) -> bool {
        self.find(course).is_some()
    }

    pub fn entry(&self, course: &str, index: usize) -> Option<&AttendanceEntry> {
        self.find(course).and_then(|c| c.entries.get(index))
    }

    /// Entries for one course in stored (insertion) order.
    pub fn course_entries(&self, course: &str) -> Option<&[AttendanceEntry]> {
        self.find(course).map(|c| c.entries.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    fn find(&self, course: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.name == course)
    }

    fn find_mut(&mut self, course: &str) -> Option<&mut Course> {
        self.courses.iter_mut().find(|c| c.name == course)
    }

    fn find_or_create(&mut self, course: &str) -> &mut Course {
        if let Some(pos) = self.courses.iter().position(|c| c.name == course) {
            return &mut self.courses[pos];
        }
        self.courses.push(Course {
            name: course.to_string(),
            entries: Vec::new(),
        });
        self.courses.last_mut().unwrap()
    }
}

fn require(value: &str, field: &'static str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Numeric-aware, case-insensitive ordering on matric numbers, mirroring a
/// locale compare with the numeric option: digit runs compare as numbers,
/// everything else character by character.
pub fn matric_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = digit_run(&mut ai);
                let nb = digit_run(&mut bi);
                match compare_digit_runs(&na, &nb) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            (Some(x), Some(y)) => {
                let xl = x.to_ascii_lowercase();
                let yl = y.to_ascii_lowercase();
                match xl.cmp(&yl) {
                    Ordering::Equal => {
                        ai.next();
                        bi.next();
                    }
                    other => return other,
                }
            }
        }
    }
}

fn digit_run(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = it.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        it.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
