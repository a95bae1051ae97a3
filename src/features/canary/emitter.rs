use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{error::Error, kube::apis::networking::gloo::v2::RouteTable};

use super::matcher::RouteMatch;

/// How a modified RouteTable is written back.
#[derive(Debug, Default, ValueEnum, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// JSON patch containing only what changed
    #[default]
    Patch,

    /// PUT of the whole object
    Replace,
}

impl std::fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value()
            .expect("no values are skipped")
            .get_name()
            .fmt(f)
    }
}

/// Result of comparing the fetched RouteTable with its modified copy.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Unchanged,
    Replace(Box<RouteTable>),
    Patch(json_patch::Patch),
}

/// The parts of a RouteTable that are compared: annotations, labels and spec.
fn tracked_fields(route_table: &RouteTable) -> Result<Value, Error> {
    Ok(json!({
        "metadata": {
            "annotations": route_table.metadata.annotations,
            "labels": route_table.metadata.labels,
        },
        "spec": serde_json::to_value(&route_table.spec)?,
    }))
}

/// RFC 6901 reference token
fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// RFC 6902 operations that turn `original` into `modified`, scoped to the leaves that differ.
///
/// Array elements are compared by index. Elements only present in `modified` are appended and
/// surplus elements of `original` are removed from the back.
pub fn diff(path: &str, original: &Value, modified: &Value) -> Vec<Value> {
    let mut ops = Vec::new();
    diff_into(path, original, modified, &mut ops);
    ops
}

fn diff_into(path: &str, original: &Value, modified: &Value, ops: &mut Vec<Value>) {
    if original == modified {
        return;
    }

    match (original, modified) {
        (Value::Object(original), Value::Object(modified)) => {
            for (key, value) in modified {
                let child = format!("{}/{}", path, escape(key));

                match original.get(key) {
                    Some(old) if !old.is_null() => {
                        if value.is_null() {
                            ops.push(json!({"op": "remove", "path": child}));
                        } else {
                            diff_into(&child, old, value, ops);
                        }
                    }
                    // serialize 時の null はキーが無いのと同じ扱い
                    _ => {
                        if !value.is_null() {
                            ops.push(json!({"op": "add", "path": child, "value": value}));
                        }
                    }
                }
            }

            for (key, old) in original {
                if !modified.contains_key(key) && !old.is_null() {
                    ops.push(json!({"op": "remove", "path": format!("{}/{}", path, escape(key))}));
                }
            }
        }
        (Value::Array(original), Value::Array(modified)) => {
            for (i, (old, value)) in original.iter().zip(modified).enumerate() {
                diff_into(&format!("{}/{}", path, i), old, value, ops);
            }

            for value in modified.iter().skip(original.len()) {
                ops.push(json!({"op": "add", "path": format!("{}/-", path), "value": value}));
            }

            for i in (modified.len()..original.len()).rev() {
                ops.push(json!({"op": "remove", "path": format!("{}/{}", path, i)}));
            }
        }
        _ => ops.push(json!({"op": "replace", "path": path, "value": modified})),
    }
}

/// `test` operations pinning the matched route and destinations to the names they were read
/// with, so a RouteTable whose routes moved in the meantime is rejected instead of patched at
/// stale indices.
fn guards(original: &Value, found: RouteMatch) -> Vec<Value> {
    let route = format!("/spec/http/{}", found.route);

    std::iter::once(format!("{}/name", route))
        .chain(
            std::iter::once(found.stable)
                .chain(found.canary)
                .map(|dest| format!("{}/forwardTo/destinations/{}/ref/name", route, dest)),
        )
        .filter_map(|path| {
            original
                .pointer(&path)
                .map(|name| json!({"op": "test", "path": path, "value": name}))
        })
        .collect()
}

/// Decide what, if anything, has to be written for `modified`.
pub fn compute_change(
    original: &RouteTable,
    modified: &RouteTable,
    found: RouteMatch,
    strategy: UpdateStrategy,
) -> Result<Change, Error> {
    let original_fields = tracked_fields(original)?;

    let ops = diff("", &original_fields, &tracked_fields(modified)?);

    if ops.is_empty() {
        return Ok(Change::Unchanged);
    }

    let change = match strategy {
        UpdateStrategy::Patch => {
            let mut patch = guards(&original_fields, found);
            patch.extend(ops);

            Change::Patch(serde_json::from_value(Value::Array(patch))?)
        }
        UpdateStrategy::Replace => Change::Replace(Box::new(modified.clone())),
    };

    Ok(change)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn route_table() -> RouteTable {
        serde_yaml::from_str(indoc! {
            r#"
            apiVersion: networking.gloo.solo.io/v2
            kind: RouteTable
            metadata:
              name: rt1
              namespace: gloo
              resourceVersion: "100"
              annotations:
                owner: platform-team
            spec:
              hosts:
                - example.com
              http:
                - name: main
                  forwardTo:
                    destinations:
                      - ref:
                          name: stable-svc
                          namespace: ns1
                        weight: 100
            "#
        })
        .unwrap()
    }

    fn stable_only() -> RouteMatch {
        RouteMatch {
            route: 0,
            stable: 0,
            canary: None,
        }
    }

    fn set_stable_weight(route_table: &mut RouteTable, weight: u32) {
        route_table.spec.http[0]
            .destinations_mut()
            .unwrap()
            .first_mut()
            .unwrap()
            .weight = Some(weight);
    }

    fn ops(change: Change) -> Value {
        match change {
            Change::Patch(patch) => serde_json::to_value(patch).unwrap(),
            other => panic!("expected a patch, got {:?}", other),
        }
    }

    #[rstest]
    #[case(json!({"a": 1}), json!({"a": 1}), json!([]))]
    #[case(json!({"a": 1}), json!({"a": 2}), json!([{"op": "replace", "path": "/a", "value": 2}]))]
    #[case(json!({"a": 1, "b": 1}), json!({"a": 1}), json!([{"op": "remove", "path": "/b"}]))]
    #[case(json!({"a": 1}), json!({"a": 1, "b": {"c": 1}}), json!([{"op": "add", "path": "/b", "value": {"c": 1}}]))]
    #[case(json!({"a": {"b": 1, "c": 1}}), json!({"a": {"b": 1, "c": 2}}), json!([{"op": "replace", "path": "/a/c", "value": 2}]))]
    #[case(json!({"a": [1, 2]}), json!({"a": [1, 3]}), json!([{"op": "replace", "path": "/a/1", "value": 3}]))]
    #[case(json!({"a": [1]}), json!({"a": [1, 2]}), json!([{"op": "add", "path": "/a/-", "value": 2}]))]
    #[case(json!({"a": [1, 2, 3]}), json!({"a": [1]}), json!([{"op": "remove", "path": "/a/2"}, {"op": "remove", "path": "/a/1"}]))]
    #[case(json!({"a": null}), json!({"a": {"b": 1}}), json!([{"op": "add", "path": "/a", "value": {"b": 1}}]))]
    #[case(json!({}), json!({"a": null}), json!([]))]
    #[case(json!({"a": {"b": 1}}), json!({"a": null}), json!([{"op": "remove", "path": "/a"}]))]
    #[case(json!({"a/b": 1}), json!({"a/b": 2}), json!([{"op": "replace", "path": "/a~1b", "value": 2}]))]
    fn diff_cases(#[case] original: Value, #[case] modified: Value, #[case] expected: Value) {
        assert_eq!(Value::Array(diff("", &original, &modified)), expected);
    }

    #[test]
    fn unchanged_route_table() {
        let original = route_table();
        let modified = original.clone();

        let actual =
            compute_change(&original, &modified, stable_only(), UpdateStrategy::Patch).unwrap();

        assert_eq!(actual, Change::Unchanged);
    }

    #[test]
    fn untracked_metadata_is_ignored() {
        let original = route_table();
        let mut modified = original.clone();
        modified.metadata.resource_version = Some("200".into());

        let actual =
            compute_change(&original, &modified, stable_only(), UpdateStrategy::Patch).unwrap();

        assert_eq!(actual, Change::Unchanged);
    }

    #[test]
    fn patch_only_contains_changed_paths() {
        let original = route_table();
        let mut modified = original.clone();
        set_stable_weight(&mut modified, 70);

        let actual =
            compute_change(&original, &modified, stable_only(), UpdateStrategy::Patch).unwrap();

        assert_eq!(
            ops(actual),
            json!([
                {
                    "op": "test",
                    "path": "/spec/http/0/name",
                    "value": "main"
                },
                {
                    "op": "test",
                    "path": "/spec/http/0/forwardTo/destinations/0/ref/name",
                    "value": "stable-svc"
                },
                {
                    "op": "replace",
                    "path": "/spec/http/0/forwardTo/destinations/0/weight",
                    "value": 70
                }
            ])
        );
    }

    #[test]
    fn unrelated_routes_are_not_in_patch() {
        let original: RouteTable = serde_yaml::from_str(indoc! {
            r#"
            apiVersion: networking.gloo.solo.io/v2
            kind: RouteTable
            metadata:
              name: rt1
              namespace: gloo
            spec:
              http:
                - name: unrelated
                  matchers:
                    - uri:
                        prefix: /other
                  forwardTo:
                    destinations:
                      - ref:
                          name: other-svc
                          namespace: ns1
                        weight: 100
                - name: main
                  forwardTo:
                    destinations:
                      - ref:
                          name: stable-svc
                          namespace: ns1
                        weight: 70
                      - ref:
                          name: canary-svc
                          namespace: ns1
                        weight: 30
            "#
        })
        .unwrap();

        let mut modified = original.clone();
        let destinations = modified.spec.http[1].destinations_mut().unwrap();
        destinations[0].weight = Some(40);
        destinations[1].weight = Some(60);

        let found = RouteMatch {
            route: 1,
            stable: 0,
            canary: Some(1),
        };

        let actual = compute_change(&original, &modified, found, UpdateStrategy::Patch).unwrap();

        assert_eq!(
            ops(actual),
            json!([
                {
                    "op": "test",
                    "path": "/spec/http/1/name",
                    "value": "main"
                },
                {
                    "op": "test",
                    "path": "/spec/http/1/forwardTo/destinations/0/ref/name",
                    "value": "stable-svc"
                },
                {
                    "op": "test",
                    "path": "/spec/http/1/forwardTo/destinations/1/ref/name",
                    "value": "canary-svc"
                },
                {
                    "op": "replace",
                    "path": "/spec/http/1/forwardTo/destinations/0/weight",
                    "value": 40
                },
                {
                    "op": "replace",
                    "path": "/spec/http/1/forwardTo/destinations/1/weight",
                    "value": 60
                }
            ])
        );
    }

    #[test]
    fn label_change_is_tracked() {
        let original = route_table();
        let mut modified = original.clone();
        modified.metadata.labels = Some(BTreeMap::from([("app".into(), "httpbin".into())]));

        let actual =
            compute_change(&original, &modified, stable_only(), UpdateStrategy::Patch).unwrap();

        assert_eq!(
            ops(actual),
            json!([
                {
                    "op": "test",
                    "path": "/spec/http/0/name",
                    "value": "main"
                },
                {
                    "op": "test",
                    "path": "/spec/http/0/forwardTo/destinations/0/ref/name",
                    "value": "stable-svc"
                },
                {
                    "op": "add",
                    "path": "/metadata/labels",
                    "value": {"app": "httpbin"}
                }
            ])
        );
    }

    #[test]
    fn replace_carries_the_whole_object() {
        let original = route_table();
        let mut modified = original.clone();
        set_stable_weight(&mut modified, 70);

        let actual =
            compute_change(&original, &modified, stable_only(), UpdateStrategy::Replace).unwrap();

        assert_eq!(actual, Change::Replace(Box::new(modified)));
    }
}
