//! Conversions shared by the WASM entry points.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Decodes an optional JS settings object, falling back to the defaults for
/// `undefined`/`null` and for any field the object leaves out.
pub(crate) fn decode_or_default<T>(value: JsValue, what: &str) -> Result<T, JsValue>
where
    T: DeserializeOwned + Default,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid {what}: {e}")))
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Formats a core error with its context chain, prefixed by the failing stage.
pub(crate) fn stage_error(stage: &str, err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{stage} failed: {err:#}"))
}
