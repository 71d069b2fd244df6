//! Array exotic objects
//!
//! Arrays keep `length` as an ordinary own data property (writable,
//! non-enumerable, non-configurable). Only `[[DefineOwnProperty]]` is
//! special: index definitions grow `length`, and shrinking `length` deletes
//! trailing indices.

use crate::error::{ObjectError, ObjectResult};
use crate::object::{JsObject, ObjectRef, Rejection, Verdict};
use crate::property::{PartialDescriptor, PropertyAttributes, PropertyDescriptor, PropertyKey};
use crate::value::Value;

pub(crate) fn length_key() -> PropertyKey {
    PropertyKey::string("length")
}

/// Initial `length` property of a new array
pub(crate) fn length_descriptor(length: u32) -> PropertyDescriptor {
    PropertyDescriptor::data_with_attrs(Value::from_u32(length), PropertyAttributes::new(true, false, false))
}

/// Current `length` and whether it is writable, read from storage
pub(crate) fn array_length(array: &JsObject) -> (u32, bool) {
    match array.own_property_raw(&length_key()) {
        Some(PropertyDescriptor::Data { value, attributes }) => {
            let length = value.as_number().map(|n| n as u32).unwrap_or(0);
            (length, attributes.writable)
        }
        _ => (0, true),
    }
}

fn store_length(array: &JsObject, length: u32) {
    array.update_property(&length_key(), |desc| {
        if let PropertyDescriptor::Data { value, .. } = desc {
            *value = Value::from_u32(length);
        }
    });
}

fn freeze_length(array: &JsObject) {
    array.update_property(&length_key(), |desc| {
        if let PropertyDescriptor::Data { attributes, .. } = desc {
            attributes.writable = false;
        }
    });
}

/// ArraySetLength's ToUint32(v) == ToNumber(v) check
pub(crate) fn to_array_length(value: &Value) -> ObjectResult<u32> {
    let number = match value {
        Value::Int32(n) => *n as f64,
        Value::Number(n) => *n,
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::String(s) => {
            let trimmed = s.as_str().trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Object(obj) => match obj.kind() {
            crate::object::ObjectKind::Primitive(inner) => return to_array_length(inner),
            _ => f64::NAN,
        },
        _ => f64::NAN,
    };
    if number.fract() != 0.0 || !(0.0..=u32::MAX as f64).contains(&number) {
        return Err(ObjectError::range_error("Invalid array length"));
    }
    Ok(number as u32)
}

/// `[[DefineOwnProperty]]` for arrays
pub(crate) fn array_define_own_property(
    array: &ObjectRef,
    key: &PropertyKey,
    desc: PartialDescriptor,
) -> ObjectResult<Verdict> {
    if key.is_named("length") {
        return set_length(array, desc);
    }
    let Some(index) = key.as_index() else {
        return Ok(array.ordinary_define_own_property(key, desc));
    };

    let (length, length_writable) = array_length(array);
    if index >= length && !length_writable {
        return Ok(Err(Rejection::NotExtensible));
    }
    if let Err(rejection) = array.ordinary_define_own_property(key, desc) {
        return Ok(Err(rejection));
    }
    if index >= length {
        store_length(array, index + 1);
    }
    Ok(Ok(()))
}

/// ArraySetLength
fn set_length(array: &ObjectRef, mut desc: PartialDescriptor) -> ObjectResult<Verdict> {
    let key = length_key();
    let Some(value) = desc.value.as_ref() else {
        return Ok(array.ordinary_define_own_property(&key, desc));
    };
    let new_length = to_array_length(value)?;
    desc.value = Some(Value::from_u32(new_length));

    let (old_length, old_writable) = array_length(array);
    if new_length >= old_length {
        return Ok(array.ordinary_define_own_property(&key, desc));
    }
    if !old_writable {
        return Ok(Err(Rejection::ReadOnly));
    }

    let keep_writable = desc.writable != Some(false);
    if !keep_writable {
        // Deletions below may fail part-way; length stays writable until done.
        desc.writable = Some(true);
    }
    if let Err(rejection) = array.ordinary_define_own_property(&key, desc) {
        return Ok(Err(rejection));
    }

    for index in array.with_properties(|props| props.indices_from(new_length)) {
        if !array.remove_configurable(&PropertyKey::Index(index)) {
            store_length(array, index + 1);
            if !keep_writable {
                freeze_length(array);
            }
            return Ok(Err(Rejection::NonConfigurable));
        }
    }
    if !keep_writable {
        freeze_length(array);
    }
    Ok(Ok(()))
}
