use std::path::Path;

use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Course, Instructor, Person, Student};

/// What a popup form does when it is submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FormKind {
    AddStudent,
    EditStudent,
    AddInstructor,
    EditInstructor,
    AddCourse,
    EditCourse,
    Register,
    Assign,
    Export,
    Import,
    Backup,
}

impl FormKind {
    pub(crate) fn title(&self) -> &'static str {
        match self {
            FormKind::AddStudent => "Add Student",
            FormKind::EditStudent => "Edit Student",
            FormKind::AddInstructor => "Add Instructor",
            FormKind::EditInstructor => "Edit Instructor",
            FormKind::AddCourse => "Add Course",
            FormKind::EditCourse => "Edit Course",
            FormKind::Register => "Register Student for Course",
            FormKind::Assign => "Assign Instructor to Course",
            FormKind::Export => "Export Records",
            FormKind::Import => "Import Records",
            FormKind::Backup => "Back Up Database",
        }
    }
}

/// One labelled text input. Locked fields are shown but never focused; the
/// id of a record being edited is locked because ids are immutable.
#[derive(Clone, Debug)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    pub(crate) required: bool,
    pub(crate) locked: bool,
}

impl FormField {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            required: true,
            locked: false,
        }
    }

    fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

/// Popup form state shared by every add/edit/link/path dialog.
#[derive(Clone, Debug)]
pub(crate) struct Form {
    pub(crate) kind: FormKind,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl Form {
    fn new(kind: FormKind, fields: Vec<FormField>) -> Self {
        let active = fields.iter().position(|f| !f.locked).unwrap_or(0);
        Self {
            kind,
            fields,
            active,
            error: None,
        }
    }

    fn person(kind: FormKind, person: Option<&Person>) -> Self {
        let fields = match person {
            Some(person) => vec![
                FormField::new("ID", person.id.clone()).locked(),
                FormField::new("Name", person.name.clone()),
                FormField::new("Age", person.age.to_string()),
                FormField::new("Email", person.email.clone()),
            ],
            None => vec![
                FormField::new("ID", ""),
                FormField::new("Name", ""),
                FormField::new("Age", ""),
                FormField::new("Email", ""),
            ],
        };
        Self::new(kind, fields)
    }

    pub(crate) fn add_student() -> Self {
        Self::person(FormKind::AddStudent, None)
    }

    pub(crate) fn edit_student(student: &Student) -> Self {
        Self::person(FormKind::EditStudent, Some(&student.person))
    }

    pub(crate) fn add_instructor() -> Self {
        Self::person(FormKind::AddInstructor, None)
    }

    pub(crate) fn edit_instructor(instructor: &Instructor) -> Self {
        Self::person(FormKind::EditInstructor, Some(&instructor.person))
    }

    pub(crate) fn add_course() -> Self {
        Self::new(
            FormKind::AddCourse,
            vec![
                FormField::new("Course ID", ""),
                FormField::new("Name", ""),
                FormField::new("Instructor ID", "").optional(),
            ],
        )
    }

    pub(crate) fn edit_course(course: &Course) -> Self {
        Self::new(
            FormKind::EditCourse,
            vec![
                FormField::new("Course ID", course.id.clone()).locked(),
                FormField::new("Name", course.name.clone()),
                FormField::new(
                    "Instructor ID",
                    course.instructor_id.clone().unwrap_or_default(),
                )
                .optional(),
            ],
        )
    }

    /// Registration form. A side given up front is locked in place.
    pub(crate) fn register(student_id: Option<&str>, course_id: Option<&str>) -> Self {
        Self::new(
            FormKind::Register,
            vec![
                prefilled("Student ID", student_id),
                prefilled("Course ID", course_id),
            ],
        )
    }

    pub(crate) fn assign(instructor_id: Option<&str>, course_id: Option<&str>) -> Self {
        Self::new(
            FormKind::Assign,
            vec![
                prefilled("Instructor ID", instructor_id),
                prefilled("Course ID", course_id),
            ],
        )
    }

    /// Path prompt for export, import and backup.
    pub(crate) fn path(kind: FormKind, default: &Path) -> Self {
        Self::new(
            kind,
            vec![FormField::new("Path", default.display().to_string())],
        )
    }

    pub(crate) fn title(&self) -> &'static str {
        self.kind.title()
    }

    /// Move focus to the next unlocked field, wrapping around.
    pub(crate) fn next_field(&mut self) {
        self.step(1);
    }

    pub(crate) fn prev_field(&mut self) {
        self.step(self.fields.len().saturating_sub(1));
    }

    fn step(&mut self, offset: usize) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        let mut next = self.active;
        for _ in 0..len {
            next = (next + offset) % len;
            if !self.fields[next].locked {
                self.active = next;
                return;
            }
        }
    }

    /// Append a printable character to the focused field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.fields.get_mut(self.active) {
            Some(field) if !field.locked => {
                field.value.push(ch);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active) {
            if !field.locked {
                field.value.pop();
            }
        }
    }

    /// Trimmed value of the field at `index`.
    pub(crate) fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.value.trim())
            .unwrap_or_default()
    }

    /// Value of an optional field, `None` when left blank.
    pub(crate) fn optional_value(&self, index: usize) -> Option<&str> {
        Some(self.value(index)).filter(|value| !value.is_empty())
    }

    /// Reject empty required fields before anything reaches the store.
    pub(crate) fn check_required(&self) -> Result<()> {
        if self
            .fields
            .iter()
            .any(|field| field.required && field.value.trim().is_empty())
        {
            Err(anyhow!("All fields are required!"))
        } else {
            Ok(())
        }
    }

    /// Parse a person form into `(id, name, age, email)`. Negative ages pass
    /// through so the record store reports them.
    pub(crate) fn person_inputs(&self) -> Result<(&str, &str, i64, &str)> {
        self.check_required()?;
        let age = self
            .value(2)
            .parse::<i64>()
            .map_err(|_| anyhow!("Age must be an integer."))?;
        Ok((self.value(0), self.value(1), age, self.value(3)))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let Some(field) = self.fields.get(index) else {
            return Line::from("");
        };
        let is_active = index == self.active && !field.locked;

        let display = if field.value.is_empty() {
            if field.required {
                "<required>".to_string()
            } else {
                "<optional>".to_string()
            }
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.locked || field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label)),
            Span::styled(display, style),
        ])
    }

    /// Column where the cursor sits inside the active line.
    pub(crate) fn cursor_offset(&self) -> u16 {
        self.fields
            .get(self.active)
            .map(|field| field.label.chars().count() + 2 + field.value.chars().count())
            .map(|width| u16::try_from(width).unwrap_or(u16::MAX))
            .unwrap_or(0)
    }
}

fn prefilled(label: &'static str, value: Option<&str>) -> FormField {
    match value {
        Some(value) => FormField::new(label, value).locked(),
        None => FormField::new(label, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(form: &mut Form, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn person_form_parses_inputs() {
        let mut form = Form::add_student();
        type_str(&mut form, "S1");
        form.next_field();
        type_str(&mut form, " Ana ");
        form.next_field();
        type_str(&mut form, "-4");
        form.next_field();
        type_str(&mut form, "ana@x.com");

        let (id, name, age, email) = form.person_inputs().unwrap();
        assert_eq!((id, name, age, email), ("S1", "Ana", -4, "ana@x.com"));
    }

    #[test]
    fn non_numeric_age_is_rejected() {
        let mut form = Form::add_instructor();
        for value in ["I1", "Grace", "forty", "g@x.com"] {
            type_str(&mut form, value);
            form.next_field();
        }
        let err = form.person_inputs().unwrap_err();
        assert_eq!(err.to_string(), "Age must be an integer.");
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let form = Form::add_student();
        assert_eq!(
            form.person_inputs().unwrap_err().to_string(),
            "All fields are required!"
        );

        let mut course = Form::add_course();
        type_str(&mut course, "C1");
        course.next_field();
        type_str(&mut course, "Algebra");
        assert!(course.check_required().is_ok());
        assert_eq!(course.optional_value(2), None);
    }

    #[test]
    fn locked_fields_are_skipped_and_immutable() {
        let student = Student {
            person: Person {
                id: "S1".into(),
                name: "Ana".into(),
                age: 20,
                email: "ana@x.com".into(),
            },
        };
        let mut form = Form::edit_student(&student);
        assert_eq!(form.active, 1);

        form.next_field();
        form.next_field();
        form.next_field();
        assert_eq!(form.active, 1, "focus wraps past the locked id");

        form.prev_field();
        assert_eq!(form.active, 3);
        assert_eq!(form.value(0), "S1");
    }

    #[test]
    fn register_form_locks_prefilled_side() {
        let mut form = Form::register(Some("S1"), None);
        assert_eq!(form.active, 1);
        type_str(&mut form, "C1");
        assert_eq!((form.value(0), form.value(1)), ("S1", "C1"));
    }

    #[test]
    fn cursor_follows_label_and_value() {
        let mut form = Form::path(FormKind::Export, Path::new("out.json"));
        assert_eq!(form.cursor_offset(), ("Path: ".len() + "out.json".len()) as u16);
        form.backspace();
        assert_eq!(form.cursor_offset(), ("Path: ".len() + "out.jso".len()) as u16);
    }
}
