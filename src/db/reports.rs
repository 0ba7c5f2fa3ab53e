//! Read-only projections over the record tables. The reverse directions of
//! the student ↔ course and instructor ↔ course relationships live here as
//! queries, never as stored back-references.

use rusqlite::{Connection, Row};
use tracing::debug;

use super::courses::course_from_row;
use super::{like_pattern, LOG_TARGET};
use crate::error::Result;
use crate::models::{Course, JoinedRegistration, Person, Student, Summary};

/// Registrations joined with students and courses, and courses left-joined
/// with instructors. Foreign keys cascade on delete, so a registration always
/// has both its student and its course.
const JOINED_SELECT: &str = "
    SELECT r.id, s.id, s.name, c.id, c.name, i.id, i.name
    FROM registrations r
    JOIN students s ON s.id = r.student_id
    JOIN courses c ON c.id = r.course_id
    LEFT JOIN instructors i ON i.id = c.instructor_id";

fn joined_from_row(row: &Row<'_>) -> rusqlite::Result<JoinedRegistration> {
    Ok(JoinedRegistration {
        registration_id: row.get(0)?,
        student_id: row.get(1)?,
        student_name: row.get(2)?,
        course_id: row.get(3)?,
        course_name: row.get(4)?,
        instructor_id: row.get(5)?,
        instructor_name: row.get(6)?,
    })
}

fn count(conn: &Connection, table: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let total: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(usize::try_from(total).unwrap_or_default())
}

impl super::RecordStore {
    /// One row per registration with names taken from the current tables.
    pub fn list_registrations_joined(&self) -> Result<Vec<JoinedRegistration>> {
        let sql = format!("{JOINED_SELECT} ORDER BY r.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], joined_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(target: LOG_TARGET, rows = rows.len(), "joined registrations listed");
        Ok(rows)
    }

    /// Joined rows whose student id/name or course id/name contains `query`.
    pub fn search_registrations(&self, query: &str) -> Result<Vec<JoinedRegistration>> {
        if query.trim().is_empty() {
            return self.list_registrations_joined();
        }

        let sql = format!(
            "{JOINED_SELECT}
             WHERE LOWER(s.id) LIKE ?1 ESCAPE '\\'
                OR LOWER(s.name) LIKE ?1 ESCAPE '\\'
                OR LOWER(c.id) LIKE ?1 ESCAPE '\\'
                OR LOWER(c.name) LIKE ?1 ESCAPE '\\'
             ORDER BY r.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([like_pattern(query)], joined_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Courses a student is registered for, in registration order.
    pub fn courses_for_student(&self, student_id: &str) -> Result<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.instructor_id
             FROM courses c
             JOIN registrations r ON r.course_id = c.id
             WHERE r.student_id = ?1
             ORDER BY r.id",
        )?;
        let courses = stmt
            .query_map([student_id], course_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(courses)
    }

    /// Courses currently assigned to an instructor.
    pub fn courses_for_instructor(&self, instructor_id: &str) -> Result<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, instructor_id FROM courses
             WHERE instructor_id = ?1
             ORDER BY rowid",
        )?;
        let courses = stmt
            .query_map([instructor_id], course_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(courses)
    }

    /// Students enrolled in a course, in registration order.
    pub fn students_in_course(&self, course_id: &str) -> Result<Vec<Student>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name, s.age, s.email
             FROM students s
             JOIN registrations r ON r.student_id = s.id
             WHERE r.course_id = ?1
             ORDER BY r.id",
        )?;
        let students = stmt
            .query_map([course_id], |row| {
                Ok(Student {
                    person: Person {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        age: row.get(2)?,
                        email: row.get(3)?,
                    },
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    /// Row counts of the four collections.
    pub fn summary(&self) -> Result<Summary> {
        Ok(Summary {
            students: count(&self.conn, "students")?,
            instructors: count(&self.conn, "instructors")?,
            courses: count(&self.conn, "courses")?,
            registrations: count(&self.conn, "registrations")?,
        })
    }
}
