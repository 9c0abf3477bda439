//! Common imports
//!
//! ```rust
//! use fieldreport::prelude::*;
//! ```

pub use crate::{
    export_general_control,
    export_template,
    export_work_orders,
    CancelToken,
    DomainRecord,
    ExportError,
    ExportOptions,
    ExportOutcome,
    ImageSettings,
    Machine,
    RecordKind,
    ReportMetadata,
    ReportTemplate,
    TemplateColumn,
    TemplateRow,
};
