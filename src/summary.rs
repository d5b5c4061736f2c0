use crate::store::{AttendanceStore, Status};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub present: u32,
    pub absent: u32,
    pub excused: u32,
}

impl StatusCounts {
    fn bump(&mut self, status: Status) {
        match status {
            Status::Present => self.present += 1,
            Status::Absent => self.absent += 1,
            Status::Excused => self.excused += 1,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.present == 0 && self.absent == 0 && self.excused == 0
    }
}

/// Per-course status counts for one day. `None` means no entry matched the
/// date anywhere in the filtered set — callers surface that as "no records"
/// instead of a zero-filled table.
pub fn summarize(
    store: &AttendanceStore,
    date: &str,
    course_filter: Option<&str>,
) -> Option<Vec<(String, StatusCounts)>> {
    let mut rows: Vec<(String, StatusCounts)> = Vec::new();
    for (course, entries) in store.grouped(course_filter) {
        let mut counts = StatusCounts::default();
        for entry in entries {
            if entry.date == date {
                counts.bump(entry.status);
            }
        }
        rows.push((course.to_string(), counts));
    }
    if rows.is_empty() || rows.iter().all(|(_, c)| c.is_zero()) {
        return None;
    }
    Some(rows)
}
