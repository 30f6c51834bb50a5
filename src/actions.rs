//! Domain-level operations: one named call per user intent, keeping call
//! sites decoupled from endpoint shape. Every function is fire-and-continue:
//! it returns a future whose `Result` carries success or the surfaced
//! failure; nothing is validated client-side and nothing is swallowed.

use crate::client::ApiClient;
use crate::models::{Capture, CellGrid, Message, NewMessage, Page, PcapLayer, Symbol};
use crate::transport::ApiError;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};

pub async fn create_capture(api: &ApiClient, name: &str) -> Result<Capture, ApiError> {
    log::debug!("[actions] create capture {name:?}");
    api.create(&api.ep.captures, &[], json!({ "name": name }))
        .await
}

pub async fn list_captures(api: &ApiClient, page: Page) -> Result<Vec<Capture>, ApiError> {
    api.read_all(&api.ep.captures, &[], page).await
}

pub async fn get_capture(api: &ApiClient, cid: &str) -> Result<Capture, ApiError> {
    api.read_one(&api.ep.captures, &[], cid).await
}

pub async fn capture_messages(
    api: &ApiClient,
    cid: &str,
    page: Page,
) -> Result<Vec<Message>, ApiError> {
    api.read_all(&api.ep.capture_messages, &[cid], page).await
}

pub async fn create_message(
    api: &ApiClient,
    cid: &str,
    message: &NewMessage,
) -> Result<Message, ApiError> {
    log::debug!("[actions] create message in capture {cid}");
    let mut body = serde_json::to_value(message).map_err(|e| ApiError::Decode {
        url: api.ep.messages.path(),
        reason: e.to_string(),
    })?;
    body["cid"] = json!(cid);
    api.create(&api.ep.messages, &[], body).await
}

pub async fn list_messages(api: &ApiClient, page: Page) -> Result<Vec<Message>, ApiError> {
    api.read_all(&api.ep.messages, &[], page).await
}

pub async fn get_message(api: &ApiClient, mid: &str) -> Result<Message, ApiError> {
    api.read_one(&api.ep.messages, &[], mid).await
}

pub async fn create_symbol(api: &ApiClient, name: &str) -> Result<Symbol, ApiError> {
    log::debug!("[actions] create symbol {name:?}");
    api.create(&api.ep.symbols, &[], json!({ "name": name }))
        .await
}

pub async fn list_symbols(api: &ApiClient, page: Page) -> Result<Vec<Symbol>, ApiError> {
    api.read_all(&api.ep.symbols, &[], page).await
}

pub async fn get_symbol(api: &ApiClient, sid: &str) -> Result<Symbol, ApiError> {
    api.read_one(&api.ep.symbols, &[], sid).await
}

/// Changes only `name`; a concurrent description update on the same symbol
/// is an independent patch and neither overwrites the other.
pub async fn rename_symbol(api: &ApiClient, sid: &str, name: &str) -> Result<Symbol, ApiError> {
    api.patch(&api.ep.symbols, &[], sid, json!({ "name": name }))
        .await
}

pub async fn describe_symbol(
    api: &ApiClient,
    sid: &str,
    description: &str,
) -> Result<Symbol, ApiError> {
    api.patch(&api.ep.symbols, &[], sid, json!({ "description": description }))
        .await
}

pub async fn delete_symbol(api: &ApiClient, sid: &str) -> Result<(), ApiError> {
    log::debug!("[actions] delete symbol {sid}");
    api.delete(&api.ep.symbols, &[], sid).await
}

/// Put a message into a symbol. The backend treats membership as a
/// single-membership move and rejects unknown ids.
pub async fn attach_message(api: &ApiClient, sid: &str, mid: &str) -> Result<(), ApiError> {
    log::debug!("[actions] attach message {mid} to symbol {sid}");
    api.update(&api.ep.symbol_messages, &[sid], mid).await
}

pub async fn detach_message(api: &ApiClient, sid: &str, mid: &str) -> Result<(), ApiError> {
    log::debug!("[actions] detach message {mid} from symbol {sid}");
    api.delete(&api.ep.symbol_messages, &[sid], mid).await
}

pub async fn symbol_messages(
    api: &ApiClient,
    sid: &str,
    page: Page,
) -> Result<Vec<Message>, ApiError> {
    api.read_all(&api.ep.symbol_messages, &[sid], page).await
}

/// Fetch the aligned cell matrix. Fails not-found for an unknown symbol and
/// server-side when alignment has not produced a result yet.
pub async fn symbol_cells(api: &ApiClient, sid: &str) -> Result<CellGrid, ApiError> {
    api.read_nested(&api.ep.symbol_cells, &[sid]).await
}

/// Trigger field split/alignment for a symbol. The backend returns no
/// stable body for the trigger, so the raw value is handed back and callers
/// re-read cells afterwards.
pub async fn split_align(api: &ApiClient, sid: &str) -> Result<Value, ApiError> {
    log::debug!("[actions] split/align symbol {sid}");
    api.read_nested(&api.ep.symbol_split_align, &[sid]).await
}

/// Generate one concrete message rendering from the symbol's format.
pub async fn specialize_symbol(api: &ApiClient, sid: &str) -> Result<String, ApiError> {
    api.read_nested(&api.ep.symbol_specialize, &[sid]).await
}

/// Submit a raw file for server-side splitting into messages on the given
/// delimiter. Returns the messages the parse created.
pub async fn parse_raw(
    api: &ApiClient,
    filename: &str,
    content: &str,
    delimiter: &str,
) -> Result<Vec<Message>, ApiError> {
    log::debug!("[actions] parse raw {filename:?} ({} bytes)", content.len());
    api.create(
        &api.ep.parse_raw,
        &[],
        json!({
            "filename": filename,
            "raw_content": content,
            "delimiter": delimiter,
        }),
    )
    .await
}

/// Submit a packet capture for server-side parsing at the given import
/// layer, optionally filtered by a BPF expression. Binary content travels
/// base64-encoded.
pub async fn parse_pcap(
    api: &ApiClient,
    filename: &str,
    content: &[u8],
    layer: PcapLayer,
    bpf_filter: Option<&str>,
) -> Result<Vec<Message>, ApiError> {
    log::debug!("[actions] parse pcap {filename:?} ({} bytes)", content.len());
    let mut body = json!({
        "filename": filename,
        "pcap_content": general_purpose::STANDARD.encode(content),
        "layer": layer.as_u8(),
    });
    if let Some(filter) = bpf_filter {
        body["bpf_filter"] = json!(filter);
    }
    api.create(&api.ep.parse_pcap, &[], body).await
}
