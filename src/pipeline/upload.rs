//! Upload gate: reject anything that is not an Excel workbook before parsing.
//!
//! Two cheap checks run ahead of calamine. The file name must end in `.xlsx`
//! or `.xls`, and the first bytes must be a ZIP local-file header (OOXML) or
//! an OLE2 compound-document header (BIFF). A renamed CSV or PDF therefore
//! gets a clear [`WorkOrderError::InvalidFormat`] instead of a zip error.

use crate::error::WorkOrderError;
use std::path::Path;
use tracing::debug;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE2_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// Container family of an accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookKind {
    /// Office Open XML (`.xlsx`).
    Xlsx,
    /// Legacy BIFF8 (`.xls`).
    Xls,
}

/// An upload that passed the gate and can be handed to the parser.
#[derive(Debug)]
pub struct Upload<'a> {
    pub file_name: &'a str,
    pub kind: WorkbookKind,
    pub bytes: &'a [u8],
}

/// Check the extension only. Case-insensitive.
pub fn check_extension(file_name: &str) -> Result<WorkbookKind, WorkOrderError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("xlsx") => Ok(WorkbookKind::Xlsx),
        Some("xls") => Ok(WorkbookKind::Xls),
        _ => Err(WorkOrderError::InvalidFormat {
            reason: format!("'{file_name}' does not have an .xlsx or .xls extension"),
        }),
    }
}

/// Validate an upload's name and leading bytes.
///
/// The magic check accepts either container regardless of which extension
/// was used; some exporters write BIFF files named `.xlsx` and calamine can
/// read both.
pub fn accept<'a>(file_name: &'a str, bytes: &'a [u8]) -> Result<Upload<'a>, WorkOrderError> {
    check_extension(file_name)?;

    let kind = match bytes.get(..4) {
        Some(m) if m == ZIP_MAGIC.as_slice() => WorkbookKind::Xlsx,
        Some(m) if m == OLE2_MAGIC.as_slice() => WorkbookKind::Xls,
        Some(m) => {
            return Err(WorkOrderError::InvalidFormat {
                reason: format!("'{file_name}' is not a workbook container (first bytes: {m:02X?})"),
            })
        }
        None => {
            return Err(WorkOrderError::InvalidFormat {
                reason: format!("'{file_name}' is too short to be a workbook ({} bytes)", bytes.len()),
            })
        }
    };

    debug!("Accepted upload '{}' as {:?} ({} bytes)", file_name, kind, bytes.len());
    Ok(Upload {
        file_name,
        kind,
        bytes,
    })
}
