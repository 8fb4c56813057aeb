use crate::session::{Console, JobAction};
use crate::ui::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Devices,
    Form,
}

/// Rows of the job form, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Image,
    Filesystem,
    Scheme,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Image => FormField::Filesystem,
            FormField::Filesystem => FormField::Scheme,
            FormField::Scheme => FormField::Image,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormField::Image => FormField::Scheme,
            FormField::Filesystem => FormField::Image,
            FormField::Scheme => FormField::Filesystem,
        }
    }
}

/// What the keyboard is currently talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing the image path.
    EditingImage,
    /// Waiting for y/n on a job.
    Confirm(JobAction),
    Help,
}

pub struct App {
    pub console: Console,
    pub endpoint: String,
    pub theme: Theme,
    pub focus: FocusPane,
    pub form_field: FormField,
    pub mode: InputMode,
    pub image_input: String,
    pub input_error: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(console: Console, endpoint: String, theme: Theme) -> Self {
        Self {
            console,
            endpoint,
            theme,
            focus: FocusPane::Devices,
            form_field: FormField::Image,
            mode: InputMode::Normal,
            image_input: String::new(),
            input_error: None,
            should_quit: false,
        }
    }

    /// Route one key press according to the current mode.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.mode {
            InputMode::Help => self.mode = InputMode::Normal,
            InputMode::Confirm(action) => self.handle_confirm_key(action, key.code),
            InputMode::EditingImage => self.handle_image_key(key.code),
            InputMode::Normal => self.handle_normal_key(key.code),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.mode = InputMode::Help,
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Enter if self.focus == FocusPane::Form => self.activate_field(),
            KeyCode::Char('f') => self.console.cycle_filesystem(),
            KeyCode::Char('s') => self.console.cycle_scheme(),
            KeyCode::Char('i') => self.start_image_input(),
            KeyCode::Char('c') => self.request_job(JobAction::Create),
            KeyCode::Char('r') => self.request_job(JobAction::Restore),
            KeyCode::Char('R') => self.console.connect(),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, action: JobAction, code: KeyCode) {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.mode = InputMode::Normal;
                // Failures are already on the status line and in the activity log.
                let _ = self.console.submit(action);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    fn handle_image_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.accept_image_input(),
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.input_error = None;
            }
            KeyCode::Backspace => {
                self.image_input.pop();
                self.input_error = None;
            }
            KeyCode::Char(c) => {
                self.image_input.push(c);
                self.input_error = None;
            }
            _ => {}
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Devices => FocusPane::Form,
            FocusPane::Form => FocusPane::Devices,
        };
    }

    pub fn next(&mut self) {
        match self.focus {
            FocusPane::Devices => self.console.select_next_device(),
            FocusPane::Form => self.form_field = self.form_field.next(),
        }
    }

    pub fn previous(&mut self) {
        match self.focus {
            FocusPane::Devices => self.console.select_previous_device(),
            FocusPane::Form => self.form_field = self.form_field.previous(),
        }
    }

    fn activate_field(&mut self) {
        match self.form_field {
            FormField::Image => self.start_image_input(),
            FormField::Filesystem => self.console.cycle_filesystem(),
            FormField::Scheme => self.console.cycle_scheme(),
        }
    }

    pub fn start_image_input(&mut self) {
        self.image_input = self.console.form().image().unwrap_or_default().to_string();
        self.input_error = None;
        self.mode = InputMode::EditingImage;
    }

    /// Commit the typed path. Empty input clears the image; anything else
    /// must name an `.iso` file.
    pub fn accept_image_input(&mut self) {
        let path = self.image_input.trim();
        if path.is_empty() {
            self.console.set_image(None);
        } else if is_iso_path(path) {
            self.console.set_image(Some(path.to_string()));
        } else {
            self.input_error = Some("Only .iso images are supported".to_string());
            return;
        }
        self.input_error = None;
        self.mode = InputMode::Normal;
    }

    /// Open the confirmation modal if the job would currently be accepted.
    pub fn request_job(&mut self, action: JobAction) {
        if self.console.preflight(action).is_ok() {
            self.mode = InputMode::Confirm(action);
        }
    }

    pub fn pending_confirmation(&self) -> Option<JobAction> {
        match self.mode {
            InputMode::Confirm(action) => Some(action),
            _ => None,
        }
    }
}

pub fn is_iso_path(path: &str) -> bool {
    let path = path.trim();
    path.len() > ".iso".len()
        && path
            .get(path.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".iso"))
}
