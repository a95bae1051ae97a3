use std::collections::BTreeMap;

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gloo Enum の既定値。kind が省略された destination はこれとして扱う
pub const DEFAULT_DESTINATION_KIND: &str = "SERVICE";

/// RouteTable declares the http routes of a Gloo Platform workspace.
///
/// Only the parts needed to shift traffic weight are modelled. Everything else is kept in the
/// flattened `extra` maps so that a full replace writes the object back without losing fields.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(
    group = "networking.gloo.solo.io",
    version = "v2",
    kind = "RouteTable",
    namespaced,
    schema = "disabled",
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http: Vec<HttpRoute>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpRoute {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_to: Option<ForwardToAction>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl HttpRoute {
    /// forwardTo を持たない route は空スライスを返す
    pub fn destinations(&self) -> &[DestinationReference] {
        self.forward_to
            .as_ref()
            .map(|fw| fw.destinations.as_slice())
            .unwrap_or_default()
    }

    pub fn destinations_mut(&mut self) -> Option<&mut Vec<DestinationReference>> {
        self.forward_to.as_mut().map(|fw| &mut fw.destinations)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForwardToAction {
    #[serde(default)]
    pub destinations: Vec<DestinationReference>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DestinationReference {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DestinationReference {
    /// Build the canary counterpart of a stable destination.
    ///
    /// Only `kind`, `port` and the namespace of the reference are taken over. The weight starts
    /// at 0 and nothing else from the stable entry (subsets, cluster, ...) is propagated.
    pub fn canary_of(stable: &DestinationReference, service_name: impl Into<String>) -> Self {
        Self {
            reference: Some(ObjectReference {
                name: service_name.into(),
                namespace: stable.namespace().map(ToString::to_string),
                cluster: None,
            }),
            kind: stable.kind.clone(),
            port: stable.port.clone(),
            weight: Some(0),
            extra: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_DESTINATION_KIND)
    }

    pub fn name(&self) -> Option<&str> {
        self.reference.as_ref().map(|r| r.name.as_str())
    }

    pub fn namespace(&self) -> Option<&str> {
        self.reference.as_ref().and_then(|r| r.namespace.as_deref())
    }

    pub fn weight(&self) -> u32 {
        self.weight.unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn route_table() -> RouteTable {
        serde_yaml::from_str(indoc! {
            r#"
            apiVersion: networking.gloo.solo.io/v2
            kind: RouteTable
            metadata:
              name: rt1
              namespace: gloo
            spec:
              hosts:
                - "*"
              virtualGateways:
                - name: north-south-gw
                  namespace: gloo
              http:
                - name: httpbin
                  matchers:
                    - uri:
                        prefix: /
                  forwardTo:
                    destinations:
                      - ref:
                          name: httpbin
                          namespace: httpbin
                          cluster: cluster-1
                        port:
                          number: 8000
                        weight: 100
                        subset:
                          version: v1
                - name: direct-response
                  directResponse:
                    status: 200
            status:
              globalStatus:
                state: ACCEPTED
            "#
        })
        .unwrap()
    }

    #[test]
    fn unknown_fields_are_kept_on_serialize() {
        let rt = route_table();

        let actual = serde_json::to_value(&rt).unwrap();

        assert_eq!(actual["spec"]["hosts"], json!(["*"]));
        assert_eq!(
            actual["spec"]["http"][0]["matchers"],
            json!([{"uri": {"prefix": "/"}}])
        );
        assert_eq!(
            actual["spec"]["http"][0]["forwardTo"]["destinations"][0]["subset"],
            json!({"version": "v1"})
        );
        assert_eq!(
            actual["spec"]["http"][1]["directResponse"],
            json!({"status": 200})
        );
    }

    #[test]
    fn missing_kind_defaults_to_service() {
        let rt = route_table();

        let dest = &rt.spec.http[0].destinations()[0];

        assert_eq!(dest.kind(), "SERVICE");
        assert_eq!(dest.name(), Some("httpbin"));
        assert_eq!(dest.namespace(), Some("httpbin"));
        assert_eq!(dest.weight(), 100);
    }

    #[test]
    fn route_without_forward_to_has_no_destinations() {
        let rt = route_table();

        assert!(rt.spec.http[1].destinations().is_empty());
    }

    #[test]
    fn canary_of_copies_only_kind_port_and_namespace() {
        let stable = DestinationReference {
            kind: Some("VIRTUAL_DESTINATION".into()),
            weight: Some(80),
            ..rt_dest()
        };

        let actual = DestinationReference::canary_of(&stable, "httpbin-canary");

        let expected = DestinationReference {
            reference: Some(ObjectReference {
                name: "httpbin-canary".into(),
                namespace: Some("httpbin".into()),
                cluster: None,
            }),
            kind: Some("VIRTUAL_DESTINATION".into()),
            port: Some(PortSelector {
                number: Some(8000),
                name: None,
            }),
            weight: Some(0),
            extra: BTreeMap::new(),
        };

        assert_eq!(actual, expected);
    }

    fn rt_dest() -> DestinationReference {
        route_table().spec.http[0].destinations()[0].clone()
    }
}
