//! Flatten an engine completion record into output file descriptors.

use serde_json::Value;

use backend::CompletionRecord;
use storage::OutputFileDescriptor;

/// Walk `node → category → items` and emit one descriptor per item that
/// names a file.  Items without a `filename` are skipped; everything else
/// that is not shaped as expected is ignored rather than rejected.
///
/// Order follows the record: node order, then category order, then item
/// order.
pub fn extract(record: &CompletionRecord) -> Vec<OutputFileDescriptor> {
    record
        .outputs
        .values()
        .filter_map(Value::as_object)
        .flat_map(|categories| categories.values())
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(descriptor_from_item)
        .collect()
}

fn descriptor_from_item(item: &Value) -> Option<OutputFileDescriptor> {
    let item = item.as_object()?;
    let filename = match item.get("filename")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let mut descriptor = OutputFileDescriptor::output(filename);
    if let Some(subfolder) = item.get("subfolder").and_then(Value::as_str) {
        descriptor.subfolder = subfolder.to_string();
    }
    if let Some(kind) = item.get("type").and_then(Value::as_str) {
        descriptor.kind = kind.to_string();
    }
    Some(descriptor)
}
