//! Validation helpers shared by the cores.

use moneyflow_core::{check_id, FieldErrors, Validate};

use crate::error::BusinessError;

pub(crate) fn validate<T: Validate>(value: &T) -> Result<(), BusinessError> {
    let mut errors = FieldErrors::new();
    value.validate(&mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BusinessError::Validation(errors))
    }
}

pub(crate) fn parse_id(id: &str) -> Result<(), BusinessError> {
    check_id(id).map(|_| ()).map_err(|_| BusinessError::InvalidId)
}

/// Row offset of a 1-based page.
pub(crate) fn page_offset(page: usize, rows: usize) -> usize {
    page.saturating_sub(1).saturating_mul(rows)
}
