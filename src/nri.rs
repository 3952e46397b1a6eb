//! Receiver capability document
//!
//! `NRIQSTN` is answered with an XML document describing the receiver:
//! zones, input selectors, presets, tuner bands, network services and so
//! on. The document is mapped onto a [`serde_json::Value`] tree:
//!
//! - attributes become plain keys of the element object
//! - repeated child elements become arrays
//! - an element with only text becomes a string (`null` when empty)
//! - text next to attributes or children is stored under `#text`
//!
//! [`Capabilities`] then projects the interesting lists into maps keyed
//! by each entry's identifying attribute.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{EiscpError, Result};

/// Key holding element text when the element also has attributes or children
pub const TEXT_KEY: &str = "#text";

/// Entries of a capability list keyed by their identifying attribute
pub type Listing = Map<String, Value>;

/// Convert an XML document into a JSON value
///
/// The result is an object with a single key, the root element's name.
pub fn xml_to_value(xml: &str) -> Result<Value> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| EiscpError::Document(format!("Invalid XML: {}", e)))?;
    let root = doc.root_element();

    let mut top = Map::new();
    top.insert(root.tag_name().name().to_string(), element_to_value(root));
    Ok(Value::Object(top))
}

fn element_to_value(node: roxmltree::Node) -> Value {
    let mut object = Map::new();

    for attr in node.attributes() {
        object.insert(attr.name().to_string(), Value::String(attr.value().to_string()));
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            let name = child.tag_name().name().to_string();
            let value = element_to_value(child);
            match object.get_mut(&name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    object.insert(name, value);
                }
            }
        } else if let Some(t) = child.text() {
            text.push_str(t);
        }
    }

    let text = text.trim();
    if object.is_empty() {
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        }
    } else {
        if !text.is_empty() {
            object.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        Value::Object(object)
    }
}

/// What a receiver can do, as reported by its capability document
#[derive(Debug, Clone, Default, Serialize)]
pub struct Capabilities {
    /// The `response.device` subtree
    pub device: Value,
    pub zones: Listing,
    pub selectors: Listing,
    pub presets: Listing,
    pub tuners: Listing,
    pub functions: Listing,
    pub controls: Listing,
    pub net_services: Listing,
}

impl Capabilities {
    /// Parse the XML text of an `NRI` reply (without the `NRI` prefix)
    pub fn parse(xml: &str) -> Result<Self> {
        Self::from_document(&xml_to_value(xml)?)
    }

    /// Project a converted document
    ///
    /// Lists the receiver does not report come out empty.
    pub fn from_document(document: &Value) -> Result<Self> {
        let device = document
            .pointer("/response/device")
            .filter(|d| d.is_object())
            .cloned()
            .ok_or_else(|| {
                EiscpError::Document("Capability document has no response/device".into())
            })?;

        let mut selectors = keyed_by(list_items(&device, "selectorlist", "selector"), "name");
        selectors.remove("Source");

        Ok(Self {
            zones: keyed_by(list_items(&device, "zonelist", "zone"), "name"),
            selectors,
            presets: keyed_by(list_items(&device, "presetlist", "preset"), "id"),
            tuners: keyed_by(list_items(&device, "tuners", "tuner"), "band"),
            functions: keyed_by(list_items(&device, "functionlist", "function"), "name"),
            controls: keyed_by(list_items(&device, "controllist", "control"), "name"),
            net_services: keyed_by(list_items(&device, "netservicelist", "netservice"), "name"),
            device,
        })
    }

    pub fn model(&self) -> Option<&str> {
        self.device.get("model").and_then(Value::as_str)
    }
}

/// The `item` entries under `device.list`, whether one or many
pub fn list_items(device: &Value, list: &str, item: &str) -> Vec<Map<String, Value>> {
    match device.get(list).and_then(|l| l.get(item)) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| i.as_object().cloned())
            .collect(),
        Some(Value::Object(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

/// Re-key entries by one of their attributes, dropping it from the entry
///
/// Entries without the attribute are skipped.
pub fn keyed_by(items: Vec<Map<String, Value>>, key: &str) -> Listing {
    let mut listing = Listing::new();
    for mut item in items {
        let Some(id) = item.remove(key) else {
            continue;
        };
        let id = match id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        listing.insert(id, Value::Object(item));
    }
    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<response status="ok">
  <device id="TX-NR686">
    <brand>ONKYO</brand>
    <category>AV Receiver</category>
    <year>2018</year>
    <model>TX-NR686</model>
    <destination>Dx</destination>
    <netservicelist count="2">
      <netservice id="0E" value="1" name="TuneIn" account="" />
      <netservice id="0A" value="1" name="Spotify" account="" />
    </netservicelist>
    <zonelist count="2">
      <zone id="1" value="1" name="Main" volmax="80" volstep="0" />
      <zone id="2" value="1" name="Zone2" volmax="80" volstep="0" />
    </zonelist>
    <selectorlist count="3">
      <selector id="10" value="1" name="BD/DVD" zone="03" iconid="10" />
      <selector id="01" value="1" name="CBL/SAT" zone="03" iconid="01" />
      <selector id="80" value="1" name="Source" zone="02" iconid="80" />
    </selectorlist>
    <presetlist count="1">
      <preset id="01" band="1" freq="87500" name="" />
    </presetlist>
    <controllist count="1">
      <control id="Bass" value="1" zone="1" min="-10" max="10" step="2" />
    </controllist>
    <functionlist count="1">
      <function id="UsbUpdate" value="1" name="USB Update" />
    </functionlist>
    <tuners count="2">
      <tuner band="FM" min="87500" max="108000" step="50" />
      <tuner band="AM" min="522" max="1611" step="9" />
    </tuners>
  </device>
</response>"#;

    #[test]
    fn test_xml_to_value_shapes() {
        let value = xml_to_value(r#"<a x="1"><b>one</b><b>two</b><c/><d k="v">t</d></a>"#).unwrap();
        assert_eq!(
            value,
            json!({
                "a": {
                    "x": "1",
                    "b": ["one", "two"],
                    "c": null,
                    "d": {"k": "v", "#text": "t"}
                }
            })
        );
    }

    #[test]
    fn test_xml_to_value_rejects_invalid() {
        assert!(matches!(
            xml_to_value("<open>"),
            Err(EiscpError::Document(_))
        ));
    }

    #[test]
    fn test_capabilities_projection() {
        let caps = Capabilities::parse(DOCUMENT).unwrap();

        assert_eq!(caps.model(), Some("TX-NR686"));
        assert_eq!(caps.zones.len(), 2);
        assert_eq!(caps.zones["Main"]["volmax"], "80");
        assert_eq!(caps.net_services.len(), 2);
        assert!(caps.net_services.contains_key("Spotify"));
        assert_eq!(caps.presets["01"]["freq"], "87500");
        assert_eq!(caps.tuners["AM"]["max"], "1611");
        assert!(caps.functions.contains_key("USB Update"));
    }

    #[test]
    fn test_selectors_drop_source() {
        let caps = Capabilities::parse(DOCUMENT).unwrap();
        assert_eq!(caps.selectors.len(), 2);
        assert!(caps.selectors.contains_key("BD/DVD"));
        assert!(!caps.selectors.contains_key("Source"));
    }

    #[test]
    fn test_unnamed_entries_are_skipped() {
        // controls carry no name attribute on this model
        let caps = Capabilities::parse(DOCUMENT).unwrap();
        assert!(caps.controls.is_empty());
    }

    #[test]
    fn test_single_entry_list() {
        let doc = r#"<response><device><zonelist><zone id="1" name="Main"/></zonelist></device></response>"#;
        let caps = Capabilities::parse(doc).unwrap();
        assert_eq!(caps.zones.len(), 1);
        assert_eq!(caps.zones["Main"]["id"], "1");
        assert!(caps.tuners.is_empty());
    }

    #[test]
    fn test_missing_device() {
        assert!(Capabilities::parse("<response status=\"ng\"/>").is_err());
    }
}
