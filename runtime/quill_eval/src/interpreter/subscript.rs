//! `[i]`, `[i:j]` and `.key` on values.

use quill_value::errors::{
    cannot_index_funcref, cannot_index_special, cannot_slice_dict, key_not_present,
    list_index_out_of_range, not_a_string,
};
use quill_value::{ContainerStore, EvalResult, ListRef, Value};

/// Index or slice `value`.
///
/// `first` and `last` are the bounds as written; `None` is an omitted bound
/// of a slice. Strings (and Numbers, through their decimal text) index by
/// byte and never fail on range; Lists fail on an out-of-range single index
/// but clamp slices.
pub fn index_value(
    store: &ContainerStore,
    value: &Value,
    first: Option<&Value>,
    last: Option<&Value>,
    is_slice: bool,
) -> EvalResult {
    match value {
        Value::FuncRef(_) | Value::Partial(_) => Err(cannot_index_funcref()),
        Value::Float(_) => Err(not_a_string(value.type_name())),
        Value::Special(_) => Err(cannot_index_special()),
        Value::Dict(dict) => {
            if is_slice {
                return Err(cannot_slice_dict());
            }
            let key = match first {
                Some(key) => key.to_text()?.into_owned(),
                None => String::new(),
            };
            dict.get(&key).ok_or_else(|| key_not_present(&key))
        }
        Value::List(list) => {
            let first = first.map(Value::to_number).transpose()?;
            let last = last.map(Value::to_number).transpose()?;
            if is_slice {
                Ok(Value::List(slice_list(store, list, first, last)))
            } else {
                let index = first.unwrap_or(0);
                let len = list.len() as i64;
                let resolved = if index < 0 { len + index } else { index };
                usize::try_from(resolved)
                    .ok()
                    .and_then(|i| list.get(i))
                    .ok_or_else(|| list_index_out_of_range(index))
            }
        }
        Value::Number(_) | Value::Str(_) => {
            let first = first.map(Value::to_number).transpose()?;
            let last = last.map(Value::to_number).transpose()?;
            let text = value.to_text()?;
            let bytes = text.as_bytes();
            let picked = if is_slice {
                slice_bounds(bytes.len(), first, last).map(|(start, end)| &bytes[start..end])
            } else {
                let index = first.unwrap_or(0);
                usize::try_from(index)
                    .ok()
                    .filter(|&i| i < bytes.len())
                    .map(|i| &bytes[i..=i])
            };
            Ok(match picked {
                Some(bytes) => Value::string(String::from_utf8_lossy(bytes).as_ref()),
                None => Value::empty_string(),
            })
        }
    }
}

/// Byte range selected by an inclusive slice of a string of `len` bytes.
///
/// Negative bounds count from the end; anything out of range gives `None`
/// (the empty string).
fn slice_bounds(len: usize, first: Option<i64>, last: Option<i64>) -> Option<(usize, usize)> {
    let len = len as i64;
    let mut start = first.unwrap_or(0);
    if start < 0 {
        start = (len + start).max(0);
    }
    let mut end = last.unwrap_or(-1);
    if end < 0 {
        end += len;
    } else if end >= len {
        end = len - 1;
    }
    if start >= len || end < 0 || start > end {
        return None;
    }
    Some((usize::try_from(start).ok()?, usize::try_from(end + 1).ok()?))
}

/// Copy the items of an inclusive list slice into a new list.
///
/// Out-of-range bounds give an empty list instead of failing.
fn slice_list(
    store: &ContainerStore,
    list: &ListRef,
    first: Option<i64>,
    last: Option<i64>,
) -> ListRef {
    let len = list.len() as i64;
    let mut start = first.unwrap_or(0);
    if start < 0 {
        start += len;
    }
    if first.is_some() && (start < 0 || start >= len) {
        start = len;
    }
    let mut end = last.unwrap_or(-1);
    if end < 0 {
        end += len;
    } else if end >= len {
        end = len - 1;
    }
    if last.is_some() && (end < 0 || end + 1 < start) {
        end = -1;
    }
    let items = list.to_vec();
    let picked = match (usize::try_from(start), usize::try_from(end)) {
        (Ok(start), Ok(end)) if start <= end && end < items.len() => items[start..=end].to_vec(),
        _ => Vec::new(),
    };
    store.list_from(picked)
}

#[cfg(test)]
mod tests;
