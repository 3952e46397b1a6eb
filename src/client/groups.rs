//! Multiroom groups
//!
//! Receivers supporting multiroom audio (FlareConnect) are grouped with an
//! `MGS` message and report their membership in the `MDI` document:
//!
//! ```text
//! <mdi>
//!   <deviceid>0009B0123456</deviceid>
//!   <zonelist>
//!     <zone id="1" groupid="3" ch="ST" role="src" roomname="" groupname="" powerstate="1" iconid="1" color="0" delay="3000"/>
//!   </zonelist>
//! </mdi>
//! ```
//!
//! A zone takes part in a group when its `groupid` is not `0` and its
//! `role` is not `none`. One member of a group has role `src`, the others
//! `dst`.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use super::Client;
use crate::config::DiscoveryConfig;
use crate::discovery::{self, Device};
use crate::error::{EiscpError, Result};
use crate::nri::{list_items, xml_to_value};
use crate::protocol::PREFIX_LEN;

/// Largest delay the group may use to keep members in sync, in ms
pub const GROUP_MAX_DELAY_MS: u32 = 500;

/// One zone of a receiver that takes part in a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupZone {
    /// Zone id on the receiver (`1` for main)
    pub id: String,
    pub group_id: String,
    pub role: String,
    pub power_state: String,

    /// Remaining attributes (`roomname`, `delay`, ...)
    pub attributes: Map<String, Value>,
}

impl GroupZone {
    fn from_entry(mut entry: Map<String, Value>) -> Self {
        let mut take = |key: &str| match entry.remove(key) {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let id = take("id");
        let group_id = take("groupid");
        let role = take("role");
        let power_state = take("powerstate");
        Self {
            id,
            group_id,
            role,
            power_state,
            attributes: entry,
        }
    }

    pub fn is_grouped(&self) -> bool {
        self.group_id != "0" && self.role != "none"
    }
}

/// A receiver zone sharing a group with this client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    pub identifier: String,
    pub host: String,
    pub model_name: String,
    pub zone_id: String,
    pub group_id: String,
    pub role: String,
    pub power_state: String,
}

impl GroupMember {
    fn new(identifier: String, host: String, model_name: String, zone: GroupZone) -> Self {
        Self {
            identifier,
            host,
            model_name,
            zone_id: zone.id,
            group_id: zone.group_id,
            role: zone.role,
            power_state: zone.power_state,
        }
    }
}

/// Build the `MGS` message grouping `own_id` with `others`
///
/// No others means "leave the group".
pub fn group_message(own_id: &str, others: &[&str]) -> String {
    if others.is_empty() {
        return r#"MGS<mgs zone="1"><groupid>0</groupid></mgs>"#.to_string();
    }

    let devices: String = std::iter::once(own_id)
        .chain(others.iter().copied())
        .map(|id| format!(r#"<device id="{}" zoneid="1"/>"#, id))
        .collect();

    format!(
        r#"MGS<mgs zone="1"><groupid>1</groupid><maxdelay>{}</maxdelay><devices>{}</devices></mgs>"#,
        GROUP_MAX_DELAY_MS, devices
    )
}

/// Parse an `MDI` document into its grouped zones
pub fn parse_groups(xml: &str) -> Result<Vec<GroupZone>> {
    let document = xml_to_value(xml)?;
    let mdi = document
        .get("mdi")
        .filter(|m| m.is_object())
        .ok_or_else(|| EiscpError::Document("Group document has no mdi element".into()))?;

    Ok(list_items(mdi, "zonelist", "zone")
        .into_iter()
        .map(GroupZone::from_entry)
        .filter(GroupZone::is_grouped)
        .collect())
}

impl Client {
    /// Group this receiver's main zone with the given receivers
    ///
    /// An empty list dissolves the group. Repeating the same grouping gets
    /// no reply from the receiver and ends in a Timeout error.
    pub fn group_with(&mut self, identifiers: &[&str]) -> Result<String> {
        let own_id = self.identifier();
        let message = group_message(&own_id, identifiers);
        self.request(&message)
    }

    /// The zones of this receiver that currently take part in a group
    pub fn groups(&mut self) -> Result<Vec<GroupZone>> {
        let reply = self.request("MDIQSTN")?;
        match reply.get(PREFIX_LEN..) {
            Some(xml) if !xml.is_empty() => parse_groups(xml),
            _ => Ok(Vec::new()),
        }
    }

    /// Every receiver zone sharing a group with this receiver, this
    /// receiver's own zones first
    ///
    /// Ungrouped receivers get an empty list without a network scan.
    /// Otherwise peers are discovered with `timeout` and asked for their
    /// groups; peers that fail to answer are skipped.
    pub fn grouped_with(&mut self, timeout: Duration) -> Result<Vec<GroupMember>> {
        let own = self.groups()?;
        if own.is_empty() {
            return Ok(Vec::new());
        }

        let discovery_config = DiscoveryConfig::builder()
            .port(self.port())
            .timeout(timeout)
            .build();
        let peers = discovery::discover(&discovery_config)?;

        Ok(self.cross_reference(own, peers))
    }

    /// Like [`grouped_with`](Self::grouped_with), asking `peers` instead of
    /// discovering them
    pub fn grouped_with_devices(&mut self, peers: Vec<Device>) -> Result<Vec<GroupMember>> {
        let own = self.groups()?;
        if own.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.cross_reference(own, peers))
    }

    fn cross_reference(&mut self, own: Vec<GroupZone>, peers: Vec<Device>) -> Vec<GroupMember> {
        let identifier = self.identifier();
        let model_name = self.model_name();
        let group_ids: Vec<String> = own.iter().map(|zone| zone.group_id.clone()).collect();

        let mut members: Vec<GroupMember> = own
            .into_iter()
            .map(|zone| {
                GroupMember::new(identifier.clone(), self.host().to_string(), model_name.clone(), zone)
            })
            .collect();

        for device in peers {
            if device.identifier() == identifier {
                continue;
            }

            let peer_id = device.identifier().to_string();
            let peer_model = device.model_name().to_string();
            let peer_host = device.host.to_string();
            let mut peer = Client::from_device(device, self.config().clone());

            let zones = match peer.groups() {
                Ok(zones) => zones,
                Err(e) => {
                    tracing::debug!("Skipping {} ({}): {}", peer_id, peer_host, e);
                    continue;
                }
            };

            members.extend(
                zones
                    .into_iter()
                    .filter(|zone| group_ids.contains(&zone.group_id))
                    .map(|zone| {
                        GroupMember::new(peer_id.clone(), peer_host.clone(), peer_model.clone(), zone)
                    }),
            );
        }

        members
    }
}
