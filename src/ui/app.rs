use std::mem;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use tracing::debug;

use crate::db::RecordStore;
use crate::error::RecordError;
use crate::models::{Course, Instructor, JoinedRegistration, Student, Summary};
use crate::transfer::{self, Format};

use super::forms::{Form, FormKind};
use super::helpers::{
    centered_rect, course_row, instructor_row, registration_row, student_row, surface_error,
};
use super::screens::{ListScreen, Tab};

const LOG_TARGET: &str = "school_records::ui";
/// Tab bar height including its border.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 10;

/// Fine-grained modes layered over the current tab.
enum Mode {
    Normal,
    Editing(Form),
    ConfirmDelete(DeleteTarget),
    Searching(String),
}

/// Record awaiting delete confirmation, with the number of rows the delete
/// will touch through cascades.
enum DeleteTarget {
    Student {
        id: String,
        label: String,
        registrations: usize,
    },
    Instructor {
        id: String,
        label: String,
        courses: usize,
    },
    Course {
        id: String,
        label: String,
        registrations: usize,
    },
    Registration {
        id: i64,
        label: String,
    },
    Everything {
        counts: Summary,
    },
}

impl DeleteTarget {
    fn prompt(&self) -> String {
        match self {
            DeleteTarget::Student { label, .. } => format!("Delete student {label}?"),
            DeleteTarget::Instructor { label, .. } => format!("Delete instructor {label}?"),
            DeleteTarget::Course { label, .. } => format!("Delete course {label}?"),
            DeleteTarget::Registration { label, .. } => format!("Remove registration {label}?"),
            DeleteTarget::Everything { .. } => "Delete every record?".to_string(),
        }
    }

    fn consequence(&self) -> Option<String> {
        match self {
            DeleteTarget::Student { registrations, .. }
            | DeleteTarget::Course { registrations, .. }
                if *registrations > 0 =>
            {
                Some(format!(
                    "{registrations} registration(s) will be removed as well."
                ))
            }
            DeleteTarget::Instructor { courses, .. } if *courses > 0 => Some(format!(
                "{courses} course(s) will be left without an instructor."
            )),
            DeleteTarget::Everything { counts } => Some(format!(
                "{} students, {} instructors, {} courses and {} registrations will be removed.",
                counts.students, counts.instructors, counts.courses, counts.registrations
            )),
            _ => None,
        }
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: RecordStore,
    export_path: PathBuf,
    backup_path: PathBuf,
    tab: Tab,
    students: ListScreen<Student>,
    instructors: ListScreen<Instructor>,
    courses: ListScreen<Course>,
    registrations: ListScreen<JoinedRegistration>,
    summary: Summary,
    detail_title: String,
    detail: Vec<String>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Build the UI state over an open store. `export_path` seeds the
    /// export/import prompts.
    pub fn new(store: RecordStore, export_path: PathBuf) -> Result<Self> {
        let backup_path = store
            .path()
            .map(|path| path.with_extension("backup.sqlite"))
            .unwrap_or_else(|| PathBuf::from("school-backup.sqlite"));

        let mut app = Self {
            store,
            export_path,
            backup_path,
            tab: Tab::Students,
            students: ListScreen::new(Vec::new()),
            instructors: ListScreen::new(Vec::new()),
            courses: ListScreen::new(Vec::new()),
            registrations: ListScreen::new(Vec::new()),
            summary: Summary::default(),
            detail_title: String::new(),
            detail: Vec::new(),
            mode: Mode::Normal,
            status: None,
        };
        app.reload()?;
        Ok(app)
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Editing(form) => self.handle_form(code, form)?,
            Mode::ConfirmDelete(target) => self.handle_confirm_delete(code, target)?,
            Mode::Searching(query) => self.handle_search(code, query)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.current_filter().is_some() {
                    self.apply_filter(None)?;
                    self.set_status("Filter cleared.", StatusKind::Info);
                } else {
                    *exit = true;
                }
            }
            KeyCode::Tab => self.switch_tab(self.tab.next())?,
            KeyCode::BackTab => self.switch_tab(self.tab.prev())?,
            KeyCode::Char(ch @ '1'..='4') => {
                if let Some(tab) = Tab::from_digit(ch) {
                    self.switch_tab(tab)?;
                }
            }
            KeyCode::Up => self.move_selection(-1)?,
            KeyCode::Down => self.move_selection(1)?,
            KeyCode::PageUp => self.move_selection(-PAGE_STEP)?,
            KeyCode::PageDown => self.move_selection(PAGE_STEP)?,
            KeyCode::Home => {
                self.with_screen(|screen| screen.select_first());
                self.refresh_detail()?;
            }
            KeyCode::End => {
                self.with_screen(|screen| screen.select_last());
                self.refresh_detail()?;
            }
            KeyCode::Char('+') => return Ok(Mode::Editing(self.add_form())),
            KeyCode::Char('e') => return Ok(self.edit_mode()),
            KeyCode::Char('-') => return self.delete_mode(),
            KeyCode::Char('C') => {
                if self.summary == Summary::default() {
                    self.set_status("Nothing to clear.", StatusKind::Info);
                } else {
                    let counts = self.summary;
                    return Ok(Mode::ConfirmDelete(DeleteTarget::Everything { counts }));
                }
            }
            KeyCode::Char('r') => return Ok(Mode::Editing(self.register_form())),
            KeyCode::Char('a') => return Ok(self.assign_mode()),
            KeyCode::Char('f') => {
                let query = self.current_filter().unwrap_or_default().to_string();
                return Ok(Mode::Searching(query));
            }
            KeyCode::Char('x') => {
                return Ok(Mode::Editing(Form::path(FormKind::Export, &self.export_path)))
            }
            KeyCode::Char('i') => {
                return Ok(Mode::Editing(Form::path(FormKind::Import, &self.export_path)))
            }
            KeyCode::Char('b') => {
                return Ok(Mode::Editing(Form::path(FormKind::Backup, &self.backup_path)))
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_form(&mut self, code: KeyCode, mut form: Form) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", form.title()), StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.submit(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    let environmental = err
                        .downcast_ref::<RecordError>()
                        .is_some_and(|err| !err.is_user_error());
                    if environmental {
                        keep_open = false;
                    } else {
                        form.error = Some(message.clone());
                    }
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::Editing(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, target: DeleteTarget) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&target) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmDelete(target))
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(target)),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut query: String) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Filter unchanged.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter => {
                let query = query.trim().to_string();
                if query.is_empty() {
                    self.apply_filter(None)?;
                    self.set_status("Filter cleared.", StatusKind::Info);
                } else {
                    self.apply_filter(Some(query.clone()))?;
                    let count = self.current_len();
                    self.set_status(
                        format!("{count} {} matching '{query}'.", self.tab.title()),
                        StatusKind::Info,
                    );
                }
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                query.pop();
                Ok(Mode::Searching(query))
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    query.push(ch);
                }
                Ok(Mode::Searching(query))
            }
            _ => Ok(Mode::Searching(query)),
        }
    }

    fn add_form(&self) -> Form {
        match self.tab {
            Tab::Students => Form::add_student(),
            Tab::Instructors => Form::add_instructor(),
            Tab::Courses => Form::add_course(),
            Tab::Registrations => Form::register(None, None),
        }
    }

    fn edit_mode(&mut self) -> Mode {
        let form = match self.tab {
            Tab::Students => self.students.current().map(Form::edit_student),
            Tab::Instructors => self.instructors.current().map(Form::edit_instructor),
            Tab::Courses => self.courses.current().map(Form::edit_course),
            Tab::Registrations => {
                self.set_status(
                    "Registrations cannot be edited. Remove it and register again.",
                    StatusKind::Error,
                );
                return Mode::Normal;
            }
        };
        match form {
            Some(form) => Mode::Editing(form),
            None => {
                self.set_status("Nothing selected to edit.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn delete_mode(&mut self) -> Result<Mode> {
        let target = match self.tab {
            Tab::Students => match self.students.current() {
                Some(student) => Some(DeleteTarget::Student {
                    id: student.id().to_string(),
                    label: student.to_string(),
                    registrations: self.store.courses_for_student(student.id())?.len(),
                }),
                None => None,
            },
            Tab::Instructors => match self.instructors.current() {
                Some(instructor) => Some(DeleteTarget::Instructor {
                    id: instructor.id().to_string(),
                    label: instructor.to_string(),
                    courses: self.store.courses_for_instructor(instructor.id())?.len(),
                }),
                None => None,
            },
            Tab::Courses => match self.courses.current() {
                Some(course) => Some(DeleteTarget::Course {
                    id: course.id.clone(),
                    label: course.to_string(),
                    registrations: self.store.students_in_course(&course.id)?.len(),
                }),
                None => None,
            },
            Tab::Registrations => {
                self.registrations
                    .current()
                    .map(|row| DeleteTarget::Registration {
                        id: row.registration_id,
                        label: format!("{} in {}", row.student_name, row.course_name),
                    })
            }
        };

        match target {
            Some(target) => Ok(Mode::ConfirmDelete(target)),
            None => {
                self.set_status("Nothing selected to delete.", StatusKind::Error);
                Ok(Mode::Normal)
            }
        }
    }

    /// Registration form with the selected student or course filled in.
    fn register_form(&self) -> Form {
        match self.tab {
            Tab::Students => Form::register(self.students.current().map(Student::id), None),
            Tab::Courses => {
                Form::register(None, self.courses.current().map(|c| c.id.as_str()))
            }
            Tab::Instructors | Tab::Registrations => Form::register(None, None),
        }
    }

    fn assign_mode(&mut self) -> Mode {
        match self.tab {
            Tab::Courses => Mode::Editing(Form::assign(
                None,
                self.courses.current().map(|c| c.id.as_str()),
            )),
            Tab::Instructors => Mode::Editing(Form::assign(
                self.instructors.current().map(Instructor::id),
                None,
            )),
            Tab::Students | Tab::Registrations => {
                self.set_status(
                    "Select a course or an instructor to assign.",
                    StatusKind::Error,
                );
                Mode::Normal
            }
        }
    }

    fn submit(&mut self, form: &Form) -> Result<()> {
        match form.kind {
            FormKind::AddStudent => {
                let (id, name, age, email) = form.person_inputs()?;
                let student = self.store.add_student(id, name, age, email)?;
                self.finish(Tab::Students, student.id(), format!("Added student {student}."))
            }
            FormKind::EditStudent => {
                let (id, name, age, email) = form.person_inputs()?;
                let student = self.store.update_student(id, name, age, email)?;
                self.finish(Tab::Students, student.id(), format!("Updated student {student}."))
            }
            FormKind::AddInstructor => {
                let (id, name, age, email) = form.person_inputs()?;
                let instructor = self.store.add_instructor(id, name, age, email)?;
                let message = format!("Added instructor {instructor}.");
                self.finish(Tab::Instructors, instructor.id(), message)
            }
            FormKind::EditInstructor => {
                let (id, name, age, email) = form.person_inputs()?;
                let instructor = self.store.update_instructor(id, name, age, email)?;
                let message = format!("Updated instructor {instructor}.");
                self.finish(Tab::Instructors, instructor.id(), message)
            }
            FormKind::AddCourse => {
                form.check_required()?;
                let course =
                    self.store
                        .add_course(form.value(0), form.value(1), form.optional_value(2))?;
                self.finish(Tab::Courses, &course.id, format!("Added course {course}."))
            }
            FormKind::EditCourse => {
                form.check_required()?;
                let course = self.store.update_course(
                    form.value(0),
                    form.value(1),
                    form.optional_value(2),
                )?;
                self.finish(Tab::Courses, &course.id, format!("Updated course {course}."))
            }
            FormKind::Register => {
                form.check_required()?;
                let registration = self.store.register(form.value(0), form.value(1))?;
                self.reload()?;
                self.registrations
                    .select_where(|row| row.registration_id == registration.id);
                self.refresh_detail()?;
                self.set_status(
                    format!(
                        "Registered {} for {}.",
                        registration.student_id, registration.course_id
                    ),
                    StatusKind::Info,
                );
                Ok(())
            }
            FormKind::Assign => {
                form.check_required()?;
                let (instructor_id, course_id) = (form.value(0), form.value(1));
                self.store.assign_instructor(instructor_id, course_id)?;
                self.reload()?;
                self.set_status(
                    format!("Assigned {instructor_id} to course {course_id}."),
                    StatusKind::Info,
                );
                Ok(())
            }
            FormKind::Export => {
                form.check_required()?;
                let path = PathBuf::from(form.value(0));
                let format = transfer::export(&self.store, &path)?;
                let kind = match format {
                    Format::Json => "JSON document",
                    Format::CsvDir => "CSV directory",
                };
                self.set_status(
                    format!("Exported records to {} ({kind}).", path.display()),
                    StatusKind::Info,
                );
                self.export_path = path;
                Ok(())
            }
            FormKind::Import => {
                form.check_required()?;
                let path = PathBuf::from(form.value(0));
                let snapshot = transfer::import(&mut self.store, &path)?;
                self.reload()?;
                self.set_status(
                    format!(
                        "Imported {} students, {} instructors, {} courses and {} registrations.",
                        snapshot.students.len(),
                        snapshot.instructors.len(),
                        snapshot.courses.len(),
                        snapshot.registrations.len()
                    ),
                    StatusKind::Info,
                );
                self.export_path = path;
                Ok(())
            }
            FormKind::Backup => {
                form.check_required()?;
                let path = PathBuf::from(form.value(0));
                self.store.backup_to(&path)?;
                self.set_status(
                    format!("Database backed up to {}.", path.display()),
                    StatusKind::Info,
                );
                self.backup_path = path;
                Ok(())
            }
        }
    }

    /// Reload after a save, focus the saved row and report it.
    fn finish(&mut self, tab: Tab, id: &str, message: String) -> Result<()> {
        self.tab = tab;
        self.reload()?;
        let found = match tab {
            Tab::Students => self.students.select_where(|s| s.id() == id),
            Tab::Instructors => self.instructors.select_where(|i| i.id() == id),
            Tab::Courses => self.courses.select_where(|c| c.id == id),
            Tab::Registrations => false,
        };
        if found {
            self.refresh_detail()?;
        }
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn perform_delete(&mut self, target: &DeleteTarget) -> Result<()> {
        match target {
            DeleteTarget::Student { id, .. } => self.store.delete_student(id)?,
            DeleteTarget::Instructor { id, .. } => self.store.delete_instructor(id)?,
            DeleteTarget::Course { id, .. } => self.store.delete_course(id)?,
            DeleteTarget::Registration { id, .. } => self.store.unregister(*id)?,
            DeleteTarget::Everything { .. } => {
                self.store.clear()?;
            }
        }
        self.reload()?;
        let message = match target {
            DeleteTarget::Student { label, .. } => format!("Deleted student {label}."),
            DeleteTarget::Instructor { label, .. } => format!("Deleted instructor {label}."),
            DeleteTarget::Course { label, .. } => format!("Deleted course {label}."),
            DeleteTarget::Registration { label, .. } => format!("Removed registration {label}."),
            DeleteTarget::Everything { counts } => format!(
                "Cleared {} students, {} instructors, {} courses and {} registrations.",
                counts.students, counts.instructors, counts.courses, counts.registrations
            ),
        };
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    /// Re-read every tab from the store, honoring each tab's filter.
    fn reload(&mut self) -> Result<()> {
        let students = match self.students.filter.as_deref() {
            Some(query) => self.store.search_students(query)?,
            None => self.store.list_students()?,
        };
        let instructors = match self.instructors.filter.as_deref() {
            Some(query) => self.store.search_instructors(query)?,
            None => self.store.list_instructors()?,
        };
        let courses = match self.courses.filter.as_deref() {
            Some(query) => self.store.search_courses(query)?,
            None => self.store.list_courses()?,
        };
        let registrations = match self.registrations.filter.as_deref() {
            Some(query) => self.store.search_registrations(query)?,
            None => self.store.list_registrations_joined()?,
        };

        self.students.set_items(students);
        self.instructors.set_items(instructors);
        self.courses.set_items(courses);
        self.registrations.set_items(registrations);
        self.summary = self.store.summary()?;
        debug!(target: LOG_TARGET, summary = ?self.summary, "views reloaded");
        self.refresh_detail()
    }

    /// Rebuild the detail pane from the reverse views of the selected row.
    fn refresh_detail(&mut self) -> Result<()> {
        let (title, lines) = match self.tab {
            Tab::Students => match self.students.current() {
                Some(student) => {
                    let courses = self.store.courses_for_student(student.id())?;
                    let lines = if courses.is_empty() {
                        vec!["Not registered for any course.".to_string()]
                    } else {
                        courses.iter().map(|course| format!("• {course}")).collect()
                    };
                    (format!("Courses for {}", student.person.name), lines)
                }
                None => (String::from("Details"), Vec::new()),
            },
            Tab::Instructors => match self.instructors.current() {
                Some(instructor) => {
                    let courses = self.store.courses_for_instructor(instructor.id())?;
                    let lines = if courses.is_empty() {
                        vec!["Not teaching any course.".to_string()]
                    } else {
                        courses.iter().map(|course| format!("• {course}")).collect()
                    };
                    (format!("Courses taught by {}", instructor.person.name), lines)
                }
                None => (String::from("Details"), Vec::new()),
            },
            Tab::Courses => match self.courses.current() {
                Some(course) => {
                    let instructor = match course.instructor_id.as_deref() {
                        Some(id) => self.store.get_instructor(id)?,
                        None => None,
                    };
                    let mut lines = vec![match instructor {
                        Some(instructor) => format!("Instructor: {instructor}"),
                        None => "Instructor: unassigned".to_string(),
                    }];
                    lines.push(String::new());
                    let students = self.store.students_in_course(&course.id)?;
                    if students.is_empty() {
                        lines.push("No students registered.".to_string());
                    } else {
                        lines.push(format!("{} student(s):", students.len()));
                        lines.extend(students.iter().map(|student| format!("• {student}")));
                    }
                    (format!("Course {}", course.name), lines)
                }
                None => (String::from("Details"), Vec::new()),
            },
            Tab::Registrations => match self.registrations.current() {
                Some(row) => (
                    format!("Registration #{}", row.registration_id),
                    vec![
                        format!("Student: {} ({})", row.student_name, row.student_id),
                        format!("Course: {} ({})", row.course_name, row.course_id),
                        format!("Instructor: {}", row.instructor_label()),
                    ],
                ),
                None => (String::from("Details"), Vec::new()),
            },
        };
        self.detail_title = title;
        self.detail = lines;
        Ok(())
    }

    fn switch_tab(&mut self, tab: Tab) -> Result<()> {
        if self.tab != tab {
            self.tab = tab;
            self.clear_status();
            self.refresh_detail()?;
        }
        Ok(())
    }

    fn move_selection(&mut self, offset: isize) -> Result<()> {
        self.with_screen(|screen| screen.move_selection(offset));
        self.refresh_detail()
    }

    fn apply_filter(&mut self, filter: Option<String>) -> Result<()> {
        self.with_screen(|screen| {
            screen.set_filter(filter.clone());
            screen.select_first();
        });
        self.reload()
    }

    /// Run a selection/filter operation on the active tab's list.
    fn with_screen(&mut self, op: impl Fn(&mut dyn ScreenOps)) {
        match self.tab {
            Tab::Students => op(&mut self.students),
            Tab::Instructors => op(&mut self.instructors),
            Tab::Courses => op(&mut self.courses),
            Tab::Registrations => op(&mut self.registrations),
        }
    }

    fn current_filter(&self) -> Option<&str> {
        match self.tab {
            Tab::Students => self.students.filter.as_deref(),
            Tab::Instructors => self.instructors.filter.as_deref(),
            Tab::Courses => self.courses.filter.as_deref(),
            Tab::Registrations => self.registrations.filter.as_deref(),
        }
    }

    fn current_len(&self) -> usize {
        match self.tab {
            Tab::Students => self.students.items.len(),
            Tab::Instructors => self.instructors.items.len(),
            Tab::Courses => self.courses.items.len(),
            Tab::Registrations => self.registrations.items.len(),
        }
    }

    fn current_rows(&self) -> (Vec<String>, usize) {
        match self.tab {
            Tab::Students => (
                self.students.items.iter().map(student_row).collect(),
                self.students.selected,
            ),
            Tab::Instructors => (
                self.instructors.items.iter().map(instructor_row).collect(),
                self.instructors.selected,
            ),
            Tab::Courses => (
                self.courses.items.iter().map(course_row).collect(),
                self.courses.selected,
            ),
            Tab::Registrations => (
                self.registrations.items.iter().map(registration_row).collect(),
                self.registrations.selected,
            ),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(chunks[1]);
        self.draw_list(frame, body[0]);
        self.draw_detail(frame, body[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Editing(form) => self.draw_form(frame, area, form),
            Mode::ConfirmDelete(target) => self.draw_confirm_delete(frame, area, target),
            Mode::Searching(query) => self.draw_search_bar(frame, area, query),
            Mode::Normal => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<String> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(index, tab)| format!("{} {}", index + 1, tab.title()))
            .collect();
        let summary = self.summary;
        let title = format!(
            "School Records: {} students, {} instructors, {} courses, {} registrations",
            summary.students, summary.instructors, summary.courses, summary.registrations
        );
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title(title))
            .select(self.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_list(&self, frame: &mut Frame, area: Rect) {
        let title = match self.current_filter() {
            Some(filter) => format!("{} (filter: {filter})", self.tab.title()),
            None => self.tab.title().to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let (rows, selected) = self.current_rows();

        if rows.is_empty() {
            let message = if self.current_filter().is_some() {
                "No matches. Press f to change the filter or Esc to clear it.".to_string()
            } else {
                format!("No {} yet. Press + to add one.", self.tab.title().to_lowercase())
            };
            let paragraph = Paragraph::new(Span::styled(message, Style::default().fg(Color::Gray)))
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = rows.into_iter().map(ListItem::new).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.detail_title.clone());
        let lines: Vec<Line> = self
            .detail
            .iter()
            .map(|line| Line::from(line.clone()))
            .collect();
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let hints: &[(&str, &str)] = match &self.mode {
            Mode::Editing(_) => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[Y]", " Confirm   "), ("[N/Esc]", " Cancel")],
            Mode::Searching(_) => &[("[Enter]", " Apply   "), ("[Esc]", " Cancel")],
            Mode::Normal => match self.tab {
                Tab::Students => &[
                    ("[1-4]", " Tabs  "),
                    ("[+]", " Add  "),
                    ("[e]", " Edit  "),
                    ("[-]", " Delete  "),
                    ("[r]", " Register  "),
                    ("[f]", " Filter  "),
                    ("[x/i/b]", " Export/Import/Backup  "),
                    ("[C]", " Clear  "),
                    ("[q]", " Quit"),
                ],
                Tab::Instructors | Tab::Courses => &[
                    ("[1-4]", " Tabs  "),
                    ("[+]", " Add  "),
                    ("[e]", " Edit  "),
                    ("[-]", " Delete  "),
                    ("[a]", " Assign  "),
                    ("[f]", " Filter  "),
                    ("[x/i/b]", " Export/Import/Backup  "),
                    ("[C]", " Clear  "),
                    ("[q]", " Quit"),
                ],
                Tab::Registrations => &[
                    ("[1-4]", " Tabs  "),
                    ("[+]", " Register  "),
                    ("[-]", " Remove  "),
                    ("[f]", " Filter  "),
                    ("[x/i/b]", " Export/Import/Backup  "),
                    ("[C]", " Clear  "),
                    ("[q]", " Quit"),
                ],
            },
        };

        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let spans: Vec<Span<'static>> = hints
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &Form) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(form.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len())
            .map(|index| form.build_line(index))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x.saturating_add(form.cursor_offset());
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, target: &DeleteTarget) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm Delete").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![Line::from(target.prompt())];
        if let Some(consequence) = target.consequence() {
            lines.push(Line::from(consequence));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, query: &str) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let title = format!("Filter {}", self.tab.title());
        let block = Block::default().borders(Borders::ALL).title(title);
        let paragraph = Paragraph::new(Span::raw(format!("Filter: {query}")))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Filter: ".len() as u16 + query.chars().count() as u16;
        let cursor_y = inner.y;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Selection and filter operations shared by every tab's list, independent of
/// the row type.
trait ScreenOps {
    fn move_selection(&mut self, offset: isize);
    fn select_first(&mut self);
    fn select_last(&mut self);
    fn set_filter(&mut self, filter: Option<String>);
}

impl<T> ScreenOps for ListScreen<T> {
    fn move_selection(&mut self, offset: isize) {
        ListScreen::move_selection(self, offset);
    }

    fn select_first(&mut self) {
        ListScreen::select_first(self);
    }

    fn select_last(&mut self) {
        ListScreen::select_last(self);
    }

    fn set_filter(&mut self, filter: Option<String>) {
        ListScreen::set_filter(self, filter);
    }
}
