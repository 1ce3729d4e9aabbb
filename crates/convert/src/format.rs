//! Document formats and the conversion rule for each of them.

use derive_more::Display;

/// A supported document format, named after its file extension.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Format {
    /// Legacy binary Word document
    #[display("doc")]
    Doc,
    /// Office Open XML document
    #[display("docx")]
    Docx,
    /// Legacy binary Excel workbook
    #[display("xls")]
    Xls,
    /// Office Open XML workbook
    #[display("xlsx")]
    Xlsx,
}

/// The subset of [`Format`]s that need converting.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Legacy {
    #[display("doc")]
    Doc,
    #[display("xls")]
    Xls,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Doc, Format::Docx, Format::Xls, Format::Xlsx];

    /// Case-insensitive, with or without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        Self::ALL.into_iter().find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
        }
    }

    /// The format a document ends up in once processed.
    pub fn target(&self) -> Format {
        match self {
            Self::Doc | Self::Docx => Self::Docx,
            Self::Xls | Self::Xlsx => Self::Xlsx,
        }
    }

    pub fn legacy(&self) -> Option<Legacy> {
        match self {
            Self::Doc => Some(Legacy::Doc),
            Self::Xls => Some(Legacy::Xls),
            Self::Docx | Self::Xlsx => None,
        }
    }
}

impl Legacy {
    pub fn format(&self) -> Format {
        match self {
            Self::Doc => Format::Doc,
            Self::Xls => Format::Xls,
        }
    }
}

/// What to do with a file of a given extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rule {
    pub source: Format,
    pub target: Format,
}
impl Rule {
    /// `Some` when the file has to go through the engine, `None` when a
    /// plain copy will do.
    pub fn legacy(&self) -> Option<Legacy> {
        match self.source == self.target {
            true => None,
            false => self.source.legacy(),
        }
    }
}

/// Returns the rule for a file extension, or `None` if unsupported.
pub fn classify(extension: &str) -> Option<Rule> {
    Format::from_extension(extension).map(|source| Rule { source, target: source.target() })
}
