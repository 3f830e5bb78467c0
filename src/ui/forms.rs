use ratatui::text::Line;
use thiserror::Error;

use crate::models::{non_blank, MusicalKey, Repertoire, Song, SongFields};

use super::helpers::field_line;

/// Problems caught before anything is sent to a service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required.")]
    Required(&'static str),
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Password must be at least {0} characters.")]
    PasswordTooShort(usize),
}

/// Shared text editing helpers. Control characters never land in a field.
fn push_printable(target: &mut String, ch: char) -> bool {
    if ch.is_control() {
        return false;
    }
    target.push(ch);
    true
}

fn required(value: &str, name: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(name));
    }
    Ok(trimmed.to_string())
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum LoginField {
    #[default]
    Email,
    Password,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct LoginForm {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) active: LoginField,
    pub(crate) error: Option<String>,
}

impl LoginForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    fn active_value(&mut self) -> &mut String {
        match self.active {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        push_printable(self.active_value(), ch)
    }

    pub(crate) fn backspace(&mut self) {
        self.active_value().pop();
    }

    pub(crate) fn validate(&self) -> Result<(String, String), ValidationError> {
        let email = required(&self.email, "Email")?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("Password"));
        }
        Ok((email, self.password.clone()))
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line(
                "Email",
                &self.email,
                "<required>",
                self.active == LoginField::Email,
                false,
            ),
            field_line(
                "Password",
                &self.password,
                "<required>",
                self.active == LoginField::Password,
                true,
            ),
        ]
    }

    /// Row and column of the text cursor inside the form body.
    pub(crate) fn cursor(&self) -> (u16, u16) {
        match self.active {
            LoginField::Email => (0, ("Email: ".len() + self.email.chars().count()) as u16),
            LoginField::Password => (
                1,
                ("Password: ".len() + self.password.chars().count()) as u16,
            ),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum RegisterField {
    #[default]
    Name,
    Email,
    Password,
    Confirm,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct RegisterForm {
    pub(crate) display_name: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) confirm: String,
    pub(crate) active: RegisterField,
    pub(crate) error: Option<String>,
}

/// Values from a valid registration form.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Registration {
    pub(crate) display_name: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl RegisterForm {
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            RegisterField::Name => RegisterField::Email,
            RegisterField::Email => RegisterField::Password,
            RegisterField::Password => RegisterField::Confirm,
            RegisterField::Confirm => RegisterField::Name,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            RegisterField::Name => RegisterField::Confirm,
            RegisterField::Email => RegisterField::Name,
            RegisterField::Password => RegisterField::Email,
            RegisterField::Confirm => RegisterField::Password,
        };
    }

    fn active_value(&mut self) -> &mut String {
        match self.active {
            RegisterField::Name => &mut self.display_name,
            RegisterField::Email => &mut self.email,
            RegisterField::Password => &mut self.password,
            RegisterField::Confirm => &mut self.confirm,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        push_printable(self.active_value(), ch)
    }

    pub(crate) fn backspace(&mut self) {
        self.active_value().pop();
    }

    pub(crate) fn validate(
        &self,
        min_password_len: usize,
    ) -> Result<Registration, ValidationError> {
        let display_name = required(&self.display_name, "Name")?;
        let email = required(&self.email, "Email")?;
        if self.password != self.confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < min_password_len {
            return Err(ValidationError::PasswordTooShort(min_password_len));
        }
        Ok(Registration {
            display_name,
            email,
            password: self.password.clone(),
        })
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line(
                "Name",
                &self.display_name,
                "<required>",
                self.active == RegisterField::Name,
                false,
            ),
            field_line(
                "Email",
                &self.email,
                "<required>",
                self.active == RegisterField::Email,
                false,
            ),
            field_line(
                "Password",
                &self.password,
                "<required>",
                self.active == RegisterField::Password,
                true,
            ),
            field_line(
                "Confirm",
                &self.confirm,
                "<required>",
                self.active == RegisterField::Confirm,
                true,
            ),
        ]
    }

    pub(crate) fn cursor(&self) -> (u16, u16) {
        let (row, label, value) = match self.active {
            RegisterField::Name => (0, "Name: ", &self.display_name),
            RegisterField::Email => (1, "Email: ", &self.email),
            RegisterField::Password => (2, "Password: ", &self.password),
            RegisterField::Confirm => (3, "Confirm: ", &self.confirm),
        };
        (row, (label.len() + value.chars().count()) as u16)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum RepertoireField {
    #[default]
    Name,
    Description,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct RepertoireForm {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) active: RepertoireField,
    pub(crate) error: Option<String>,
}

impl RepertoireForm {
    pub(crate) fn from_repertoire(repertoire: &Repertoire) -> Self {
        Self {
            name: repertoire.name.clone(),
            description: repertoire.description.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            RepertoireField::Name => RepertoireField::Description,
            RepertoireField::Description => RepertoireField::Name,
        };
    }

    fn active_value(&mut self) -> &mut String {
        match self.active {
            RepertoireField::Name => &mut self.name,
            RepertoireField::Description => &mut self.description,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        push_printable(self.active_value(), ch)
    }

    pub(crate) fn backspace(&mut self) {
        self.active_value().pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<(String, Option<String>), ValidationError> {
        let name = required(&self.name, "Repertoire name")?;
        Ok((name, non_blank(Some(&self.description))))
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line(
                "Name",
                &self.name,
                "<required>",
                self.active == RepertoireField::Name,
                false,
            ),
            field_line(
                "Description",
                &self.description,
                "<optional>",
                self.active == RepertoireField::Description,
                false,
            ),
        ]
    }

    pub(crate) fn cursor(&self) -> (u16, u16) {
        match self.active {
            RepertoireField::Name => (0, ("Name: ".len() + self.name.chars().count()) as u16),
            RepertoireField::Description => (
                1,
                ("Description: ".len() + self.description.chars().count()) as u16,
            ),
        }
    }
}

/// Song form fields in focus order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum SongField {
    #[default]
    Title,
    Artist,
    Key,
    Notes,
    ChordText,
}

impl SongField {
    fn next(self) -> Self {
        match self {
            SongField::Title => SongField::Artist,
            SongField::Artist => SongField::Key,
            SongField::Key => SongField::Notes,
            SongField::Notes => SongField::ChordText,
            SongField::ChordText => SongField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            SongField::Title => SongField::ChordText,
            SongField::Artist => SongField::Title,
            SongField::Key => SongField::Artist,
            SongField::Notes => SongField::Key,
            SongField::ChordText => SongField::Notes,
        }
    }
}

/// Song create/edit form. The key is picked from the fixed list rather than
/// typed; chord text accepts newlines.
#[derive(Clone, Debug, Default)]
pub(crate) struct SongForm {
    pub(crate) title: String,
    pub(crate) artist: String,
    pub(crate) key: Option<MusicalKey>,
    pub(crate) notes: String,
    pub(crate) chord_text: String,
    pub(crate) active: SongField,
    pub(crate) error: Option<String>,
}

impl SongForm {
    pub(crate) fn from_song(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            artist: song.artist.clone().unwrap_or_default(),
            key: song.key,
            notes: song.notes.clone().unwrap_or_default(),
            chord_text: song.chord_text.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    pub(crate) fn editing_chords(&self) -> bool {
        self.active == SongField::ChordText
    }

    fn active_value(&mut self) -> Option<&mut String> {
        match self.active {
            SongField::Title => Some(&mut self.title),
            SongField::Artist => Some(&mut self.artist),
            SongField::Key => None,
            SongField::Notes => Some(&mut self.notes),
            SongField::ChordText => Some(&mut self.chord_text),
        }
    }

    /// Step through the key list while the key field has focus.
    pub(crate) fn cycle_key(&mut self, forward: bool) -> bool {
        if self.active != SongField::Key {
            return false;
        }
        self.key = MusicalKey::cycle(self.key, forward);
        true
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active_value() {
            Some(value) => push_printable(value, ch),
            None => false,
        }
    }

    pub(crate) fn push_newline(&mut self) -> bool {
        if self.active != SongField::ChordText {
            return false;
        }
        self.chord_text.push('\n');
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active_value() {
            Some(value) => {
                value.pop();
            }
            None => self.key = None,
        }
    }

    pub(crate) fn to_fields(&self) -> Result<SongFields, ValidationError> {
        let title = required(&self.title, "Song title")?;
        Ok(SongFields {
            title,
            artist: Some(self.artist.clone()),
            key: self.key,
            chord_text: Some(self.chord_text.clone()),
            notes: Some(self.notes.clone()),
        }
        .normalized())
    }

    /// Field rows followed by the chord text, one row per line.
    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        let key_label = self.key.map(|key| key.label().to_string()).unwrap_or_default();
        let mut lines = vec![
            field_line(
                "Title",
                &self.title,
                "<required>",
                self.active == SongField::Title,
                false,
            ),
            field_line(
                "Artist",
                &self.artist,
                "<optional>",
                self.active == SongField::Artist,
                false,
            ),
            field_line(
                "Key",
                &key_label,
                "<none> (←/→ to choose)",
                self.active == SongField::Key,
                false,
            ),
            field_line(
                "Notes",
                &self.notes,
                "<optional>",
                self.active == SongField::Notes,
                false,
            ),
            field_line(
                "Chords",
                "",
                if self.chord_text.is_empty() {
                    "<optional, Enter for new line>"
                } else {
                    ""
                },
                self.active == SongField::ChordText,
                false,
            ),
        ];
        lines.extend(
            self.chord_text
                .split('\n')
                .map(|row| Line::from(format!("  {row}"))),
        );
        lines
    }

    pub(crate) fn cursor(&self) -> (u16, u16) {
        match self.active {
            SongField::Title => (0, ("Title: ".len() + self.title.chars().count()) as u16),
            SongField::Artist => (1, ("Artist: ".len() + self.artist.chars().count()) as u16),
            SongField::Key => (2, "Key: ".len() as u16),
            SongField::Notes => (3, ("Notes: ".len() + self.notes.chars().count()) as u16),
            SongField::ChordText => {
                let rows: Vec<&str> = self.chord_text.split('\n').collect();
                let last = rows.last().map(|row| row.chars().count()).unwrap_or(0);
                (4 + rows.len() as u16, (2 + last) as u16)
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct BandForm {
    pub(crate) name: String,
    pub(crate) error: Option<String>,
}

impl BandForm {
    pub(crate) fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        push_printable(&mut self.name, ch)
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<String, ValidationError> {
        required(&self.name, "Band name")
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![field_line("Name", &self.name, "<required>", true, false)]
    }

    pub(crate) fn cursor(&self) -> (u16, u16) {
        (0, ("Name: ".len() + self.name.chars().count()) as u16)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum MemberField {
    #[default]
    Name,
    Instrument,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MemberForm {
    pub(crate) name: String,
    pub(crate) instrument: String,
    pub(crate) active: MemberField,
    pub(crate) error: Option<String>,
}

impl MemberForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            MemberField::Name => MemberField::Instrument,
            MemberField::Instrument => MemberField::Name,
        };
    }

    fn active_value(&mut self) -> &mut String {
        match self.active {
            MemberField::Name => &mut self.name,
            MemberField::Instrument => &mut self.instrument,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        push_printable(self.active_value(), ch)
    }

    pub(crate) fn backspace(&mut self) {
        self.active_value().pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<(String, String), ValidationError> {
        let name = required(&self.name, "Member name")?;
        let instrument = required(&self.instrument, "Instrument")?;
        Ok((name, instrument))
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line(
                "Name",
                &self.name,
                "<required>",
                self.active == MemberField::Name,
                false,
            ),
            field_line(
                "Instrument",
                &self.instrument,
                "<required>",
                self.active == MemberField::Instrument,
                false,
            ),
        ]
    }

    pub(crate) fn cursor(&self) -> (u16, u16) {
        match self.active {
            MemberField::Name => (0, ("Name: ".len() + self.name.chars().count()) as u16),
            MemberField::Instrument => (
                1,
                ("Instrument: ".len() + self.instrument.chars().count()) as u16,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            display_name: "Ana".into(),
            email: "ana@example.com".into(),
            password: password.into(),
            confirm: confirm.into(),
            ..RegisterForm::default()
        }
    }

    #[test]
    fn register_rejects_mismatched_passwords() {
        let form = register_form("secret1", "secret2");
        assert_eq!(form.validate(6), Err(ValidationError::PasswordMismatch));
    }

    #[test]
    fn register_rejects_short_passwords() {
        let form = register_form("abc", "abc");
        assert_eq!(form.validate(6), Err(ValidationError::PasswordTooShort(6)));
        assert_eq!(
            ValidationError::PasswordTooShort(6).to_string(),
            "Password must be at least 6 characters."
        );
    }

    #[test]
    fn register_requires_name_and_email() {
        let mut form = register_form("secret1", "secret1");
        form.display_name = "   ".into();
        assert_eq!(form.validate(6), Err(ValidationError::Required("Name")));

        let form = register_form("secret1", "secret1");
        let registration = form.validate(6).unwrap();
        assert_eq!(registration.email, "ana@example.com");
    }

    #[test]
    fn song_form_requires_title_and_normalizes_optionals() {
        let mut form = SongForm::default();
        assert_eq!(
            form.to_fields(),
            Err(ValidationError::Required("Song title"))
        );

        form.title = "  Wonderwall ".into();
        form.artist = "   ".into();
        form.chord_text = "Em7 G\nDsus4 A7sus4\n\n".into();
        let fields = form.to_fields().unwrap();
        assert_eq!(fields.title, "Wonderwall");
        assert_eq!(fields.artist, None);
        assert_eq!(fields.chord_text.as_deref(), Some("Em7 G\nDsus4 A7sus4"));
    }

    #[test]
    fn song_form_key_cycles_only_when_focused() {
        let mut form = SongForm::default();
        assert!(!form.cycle_key(true));

        form.next_field();
        form.next_field();
        assert_eq!(form.active, SongField::Key);
        assert!(form.cycle_key(true));
        assert_eq!(form.key, Some(MusicalKey::ALL[0]));
        assert!(!form.push_char('x'));

        form.backspace();
        assert_eq!(form.key, None);
    }

    #[test]
    fn newline_only_enters_chord_text() {
        let mut form = SongForm::default();
        assert!(!form.push_newline());
        form.previous_field();
        assert!(form.editing_chords());
        form.push_char('C');
        assert!(form.push_newline());
        form.push_char('G');
        assert_eq!(form.chord_text, "C\nG");
        assert_eq!(form.cursor(), (6, 3));
    }

    #[test]
    fn member_form_requires_both_fields() {
        let mut form = MemberForm::default();
        form.push_char('J');
        assert_eq!(
            form.parse_inputs(),
            Err(ValidationError::Required("Instrument"))
        );
        form.toggle_field();
        for ch in "Bass".chars() {
            form.push_char(ch);
        }
        assert_eq!(
            form.parse_inputs(),
            Ok(("J".to_string(), "Bass".to_string()))
        );
    }

    #[test]
    fn control_characters_are_ignored() {
        let mut form = LoginForm::default();
        assert!(!form.push_char('\u{7}'));
        assert!(form.email.is_empty());
    }
}
