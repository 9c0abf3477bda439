//! Domain inputs: inspection records, machine metadata and templates

use chrono::NaiveDateTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What kind of inspection a record describes
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum RecordKind {
    /// A photographed control check
    PlainCheck,
    /// A check that produced a work order
    WorkOrderCheck { details: String },
    /// A security check with its own status value
    SecurityCheck { status: String },
}

/// One inspection, control or work-order entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DomainRecord {
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub notes: String,
    /// Raw encoded photo, if one was taken
    #[cfg_attr(feature = "serde", serde(skip))]
    pub photo: Option<Vec<u8>>,
    pub timestamp: NaiveDateTime,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: String,
    /// Title of the owning machine
    #[cfg_attr(feature = "serde", serde(default))]
    pub machine: String,
    pub kind: RecordKind,
}

impl DomainRecord {
    /// A plain check with no notes, photo, status or machine
    pub fn new(title: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            notes: String::new(),
            photo: None,
            timestamp,
            status: String::new(),
            machine: String::new(),
            kind: RecordKind::PlainCheck,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_photo(mut self, photo: Vec<u8>) -> Self {
        self.photo = Some(photo);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = machine.into();
        self
    }

    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    /// Status shown in reports: security checks carry their own status
    pub fn display_status(&self) -> &str {
        match &self.kind {
            RecordKind::SecurityCheck { status } => status,
            RecordKind::PlainCheck | RecordKind::WorkOrderCheck { .. } => &self.status,
        }
    }

    /// Work-order details, if this record is a work-order check
    pub fn work_order_details(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::WorkOrderCheck { details } => Some(details),
            RecordKind::PlainCheck | RecordKind::SecurityCheck { .. } => None,
        }
    }
}

/// A machine and the operators assigned to it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Machine {
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub operators: Vec<String>,
}

impl Machine {
    pub fn new(title: impl Into<String>, operators: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            title: title.into(),
            operators: operators.into_iter().map(Into::into).collect(),
        }
    }
}

/// Report-level metadata
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportMetadata {
    /// Title row text
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub machines: Vec<Machine>,
}

impl ReportMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            machines: Vec::new(),
        }
    }

    pub fn with_machine(mut self, machine: Machine) -> Self {
        self.machines.push(machine);
        self
    }

    /// Look up a machine by title
    pub fn machine(&self, title: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.title == title)
    }
}

/// A column of a user-authored template
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemplateColumn {
    pub label: String,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TemplateRowKind {
    /// Section heading, drawn in the section banner style
    Header,
    /// Ordinary data row
    Data,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemplateRow {
    pub kind: TemplateRowKind,
    pub cells: Vec<String>,
}

impl TemplateRow {
    pub fn header(cells: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            kind: TemplateRowKind::Header,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    pub fn data(cells: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            kind: TemplateRowKind::Data,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
}

/// User-authored free-form report template
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportTemplate {
    pub title: String,
    pub sheet_name: String,
    pub columns: Vec<TemplateColumn>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rows: Vec<TemplateRow>,
}
