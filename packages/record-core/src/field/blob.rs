//! Blob and SpatialObj fields: raw payloads in a var-data slot.

use std::borrow::Cow;

use super::Field;
use crate::error::RecordError;
use crate::record::{get_var_data_value, set_var_data_value, Record, RecordData};
use crate::types::{FieldType, FieldVal};

const NULL_TEXT: &str = "[Null]";
/// Text for a spatial object when no codec is attached.
const SPATIAL_PLACEHOLDER: &str = "SpatialObject";

pub(super) fn get<'a>(field: &Field, data: RecordData<'a>) -> FieldVal<&'a [u8]> {
    match get_var_data_value(data, field.offset()) {
        Some(bytes) => FieldVal::new(bytes),
        None => FieldVal::null(),
    }
}

pub(super) fn get_null(field: &Field, data: RecordData<'_>) -> bool {
    get_var_data_value(data, field.offset()).is_none()
}

pub(super) fn set_null(field: &Field, record: &mut Record) -> Result<(), RecordError> {
    set_var_data_value(record, field.offset(), None)
}

/// Display text: the payload size for blobs, GeoJSON for spatial objects.
pub(super) fn get_as_text(field: &Field, data: RecordData<'_>) -> FieldVal<String> {
    let blob = get(field, data);
    if blob.is_null {
        return FieldVal::with_null(true, NULL_TEXT.to_string());
    }
    let text = if field.field_type() == FieldType::SpatialObj {
        match field.codec() {
            Some(codec) => codec
                .to_geojson(blob.value)
                .unwrap_or_else(|| NULL_TEXT.to_string()),
            None => SPATIAL_PLACEHOLDER.to_string(),
        }
    } else {
        format!("{} Bytes", blob.value.len())
    };
    FieldVal::new(text)
}

/// Returns the payload after checking it with the spatial codec, if any.
pub(super) fn get_as_spatial_blob<'a>(
    field: &Field,
    data: RecordData<'a>,
) -> Result<FieldVal<Cow<'a, [u8]>>, RecordError> {
    let blob = get(field, data);
    if blob.is_null {
        return Ok(FieldVal::null());
    }
    if let Some(codec) = field.codec() {
        if !codec.validate(blob.value) {
            return Err(RecordError::InvalidSpatialBlob {
                field: field.name().to_string(),
            });
        }
    }
    Ok(FieldVal::new(Cow::Borrowed(blob.value)))
}

pub(super) fn set(field: &Field, record: &mut Record, value: &[u8]) -> Result<(), RecordError> {
    set_var_data_value(record, field.offset(), Some(value))
}
