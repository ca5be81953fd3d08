// Consul agent API payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Registration, Weights};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct AgentWeights {
    #[serde(rename = "Passing")]
    pub passing: i32,
    #[serde(rename = "Warning")]
    pub warning: i32,
}

/// `GET /v1/agent/service/:id` response body. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct AgentService {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Service", default)]
    pub service: String,
    #[serde(rename = "Tags", default)]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "Meta", default)]
    pub meta: Option<BTreeMap<String, String>>,
    #[serde(rename = "Port", default)]
    pub port: u16,
    #[serde(rename = "Address", default)]
    pub address: String,
    #[serde(rename = "Weights", default)]
    pub weights: Option<AgentWeights>,
    #[serde(rename = "Kind", default)]
    pub kind: String,
}

/// `PUT /v1/agent/service/register` request body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct AgentServiceRegistration {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
    #[serde(rename = "Port", default, skip_serializing_if = "is_zero")]
    pub port: u16,
    #[serde(rename = "Address", default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(rename = "Kind", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "Meta", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
    #[serde(rename = "Weights", default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<AgentWeights>,
}

fn is_zero(port: &u16) -> bool {
    *port == 0
}

impl From<AgentService> for Registration {
    fn from(svc: AgentService) -> Self {
        Registration {
            id: svc.id,
            name: svc.service,
            address: svc.address,
            port: svc.port,
            kind: svc.kind,
            tags: svc.tags.unwrap_or_default(),
            meta: svc.meta.unwrap_or_default(),
            weights: svc.weights.map(|w| Weights {
                passing: w.passing,
                warning: w.warning,
            }),
        }
    }
}

impl From<&Registration> for AgentServiceRegistration {
    fn from(reg: &Registration) -> Self {
        AgentServiceRegistration {
            id: reg.id.clone(),
            name: reg.name.clone(),
            tags: reg.tags.clone(),
            port: reg.port,
            address: reg.address.clone(),
            kind: reg.kind.clone(),
            meta: reg.meta.clone(),
            weights: reg.weights.map(|w| AgentWeights {
                passing: w.passing,
                warning: w.warning,
            }),
        }
    }
}
