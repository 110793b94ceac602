use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    EmptyArray,
    UnsupportedType,
    NotFound,
    NotUnique,
    Permission,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    title: Option<String>,
    tag: Option<String>,
    revision: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            title: None,
            tag: None,
            revision: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attaches the bulletin the failing call addressed. An unset tag stays unset.
    pub fn with_bulletin(mut self, title: impl Into<String>, tag: Option<&str>) -> Self {
        self.title = Some(title.into());
        if let Some(tag) = tag {
            self.tag = Some(tag.to_string());
        }
        self
    }

    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(title) = &self.title {
            match &self.tag {
                Some(tag) => write!(f, " (bulletin: {title}#{tag})")?,
                None => write!(f, " (bulletin: {title})")?,
            }
        }
        if let Some(revision) = self.revision {
            write!(f, " (revision: {revision})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::EmptyArray => 3,
        ErrorKind::UnsupportedType => 4,
        ErrorKind::NotFound => 5,
        ErrorKind::NotUnique => 6,
        ErrorKind::Permission => 7,
        ErrorKind::Io => 8,
    }
}

/// Parses the `Debug` spelling of a kind, as carried in JSON error envelopes.
pub fn parse_error_kind(kind: &str) -> ErrorKind {
    match kind {
        "Internal" => ErrorKind::Internal,
        "Usage" => ErrorKind::Usage,
        "EmptyArray" => ErrorKind::EmptyArray,
        "UnsupportedType" => ErrorKind::UnsupportedType,
        "NotFound" => ErrorKind::NotFound,
        "NotUnique" => ErrorKind::NotUnique,
        "Permission" => ErrorKind::Permission,
        "Io" => ErrorKind::Io,
        _ => ErrorKind::Internal,
    }
}
