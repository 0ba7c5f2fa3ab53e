//! Full dump and bulk reload of the four collections. The record types keep
//! ages signed so a negative age in an imported document is reported by the
//! validators instead of failing to parse.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::people::{self, INSTRUCTORS, STUDENTS};
use super::{courses, registrations, LOG_TARGET};
use crate::error::Result;
use crate::models::{Course, Person, Registration, Summary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub instructor_id: Option<String>,
}

/// Registrations are exported as bare pairs; ids are reassigned on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub student_id: String,
    pub course_id: String,
}

/// Document form of a whole store. All four arrays are required, even when
/// empty, and unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub students: Vec<PersonRecord>,
    pub instructors: Vec<PersonRecord>,
    pub courses: Vec<CourseRecord>,
    pub registrations: Vec<RegistrationRecord>,
}

impl From<Person> for PersonRecord {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            name: person.name,
            age: i64::from(person.age),
            email: person.email,
        }
    }
}

impl From<Course> for CourseRecord {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            name: course.name,
            instructor_id: course.instructor_id,
        }
    }
}

impl From<Registration> for RegistrationRecord {
    fn from(registration: Registration) -> Self {
        Self {
            student_id: registration.student_id,
            course_id: registration.course_id,
        }
    }
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
            && self.instructors.is_empty()
            && self.courses.is_empty()
            && self.registrations.is_empty()
    }
}

impl super::RecordStore {
    /// Dump every collection in insertion order.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            students: people::fetch_all(&self.conn, STUDENTS)?
                .into_iter()
                .map(PersonRecord::from)
                .collect(),
            instructors: people::fetch_all(&self.conn, INSTRUCTORS)?
                .into_iter()
                .map(PersonRecord::from)
                .collect(),
            courses: courses::fetch_all(&self.conn)?
                .into_iter()
                .map(CourseRecord::from)
                .collect(),
            registrations: registrations::fetch_all(&self.conn)?
                .into_iter()
                .map(RegistrationRecord::from)
                .collect(),
        })
    }

    /// Replay a snapshot through the regular insert paths: instructors, then
    /// courses (which may reference them), then students, then registrations.
    /// Runs in one transaction, so the first failing record rolls back
    /// everything imported before it.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let tx = self.conn.transaction()?;

        for record in &snapshot.instructors {
            let person = people::validated(&record.id, &record.name, record.age, &record.email)?;
            people::insert(&tx, INSTRUCTORS, &person)?;
        }
        for record in &snapshot.courses {
            courses::insert(&tx, &record.id, &record.name, record.instructor_id.as_deref())?;
        }
        for record in &snapshot.students {
            let person = people::validated(&record.id, &record.name, record.age, &record.email)?;
            people::insert(&tx, STUDENTS, &person)?;
        }
        for record in &snapshot.registrations {
            registrations::insert(&tx, &record.student_id, &record.course_id)?;
        }

        tx.commit()?;
        info!(
            target: LOG_TARGET,
            students = snapshot.students.len(),
            instructors = snapshot.instructors.len(),
            courses = snapshot.courses.len(),
            registrations = snapshot.registrations.len(),
            "snapshot restored"
        );
        Ok(())
    }

    /// Delete every record in one transaction and return how many rows each
    /// collection lost.
    pub fn clear(&mut self) -> Result<Summary> {
        let tx = self.conn.transaction()?;
        let removed = Summary {
            registrations: tx.execute("DELETE FROM registrations", [])?,
            courses: tx.execute("DELETE FROM courses", [])?,
            instructors: tx.execute("DELETE FROM instructors", [])?,
            students: tx.execute("DELETE FROM students", [])?,
        };
        tx.commit()?;
        info!(
            target: LOG_TARGET,
            students = removed.students,
            instructors = removed.instructors,
            courses = removed.courses,
            registrations = removed.registrations,
            "store cleared"
        );
        Ok(removed)
    }
}
