use crate::utils::error::{Result, SbError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| SbError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Labels are stored NUL-terminated in a 256 byte field.
pub fn validate_label(field_name: &str, label: &str) -> Result<()> {
    if label.len() >= crate::domain::model::BTRFS_LABEL_SIZE {
        return Err(SbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: label.to_string(),
            reason: format!(
                "Label is {} bytes, at most {} are allowed",
                label.len(),
                crate::domain::model::BTRFS_LABEL_SIZE - 1
            ),
        });
    }

    if label.contains('\0') {
        return Err(SbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: label.to_string(),
            reason: "Label contains null bytes".to_string(),
        });
    }

    Ok(())
}
