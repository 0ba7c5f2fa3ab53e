//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These types stay light-weight data holders; relationships are stored
//! once (course → instructor, registration → student/course) and the reverse
//! direction is always derived by a query.

use std::fmt;

/// Fields shared by students and instructors. Both roles embed a `Person`
/// instead of inheriting from it, so validation lives in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Primary key. Immutable once the row exists.
    pub id: String,
    pub name: String,
    pub age: u32,
    pub email: String,
}

impl Person {
    /// `Name (ID)` label used by list views and confirmation dialogs.
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub person: Person,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructor {
    pub person: Person,
}

impl Student {
    pub fn id(&self) -> &str {
        &self.person.id
    }
}

impl Instructor {
    pub fn id(&self) -> &str {
        &self.person.id
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.person.display_label())
    }
}

impl fmt::Display for Instructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.person.display_label())
    }
}

/// A course row. `instructor_id` is the single source of truth for the
/// instructor ↔ course relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub instructor_id: Option<String>,
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Join row linking one student to one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Auto-incremented by SQLite.
    pub id: i64,
    pub student_id: String,
    pub course_id: String,
}

/// A registration with the names resolved from the current student, course
/// and instructor tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRegistration {
    pub registration_id: i64,
    pub student_id: String,
    pub student_name: String,
    pub course_id: String,
    pub course_name: String,
    pub instructor_id: Option<String>,
    pub instructor_name: Option<String>,
}

impl JoinedRegistration {
    /// Instructor name or a dash when the course has nobody assigned.
    pub fn instructor_label(&self) -> &str {
        self.instructor_name.as_deref().unwrap_or("-")
    }
}

/// Row counts for the four collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub students: usize,
    pub instructors: usize,
    pub courses: usize,
    pub registrations: usize,
}
