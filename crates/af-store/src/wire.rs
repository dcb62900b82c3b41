//! Request and response bodies of the automation API.
//!
//! | Call | Body | Reply |
//! |------|------|-------|
//! | `POST /automations/save` | `{id, name, active, nodes, edges, user_email}` | `{status}` |
//! | `GET /automations?email=` | n/a | `Automation[]` |
//! | `POST /automations/toggle` | `{id, active}` | n/a |
//! | `POST /automations/delete` | `{id}` | n/a |

use af_core::model::Automation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SaveRequest<'a> {
    #[serde(flatten)]
    pub automation: &'a Automation,
    pub user_email: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleRequest<'a> {
    pub id: &'a str,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteRequest<'a> {
    pub id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::data::NodeType;
    use af_core::handle::HandleId;
    use af_core::model::{Edge, Point};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn save_request_shape() {
        let mut automation = Automation::new("Dip buyer");
        automation.id = "1718000000000".into();
        let a = automation.graph.add_node(NodeType::Price, Point::new(0.0, 0.0)).id;
        let b = automation.graph.add_node(NodeType::Tracking, Point::new(400.0, 0.0)).id;
        automation
            .graph
            .add_edge(Edge::new(a, HandleId::Right, b, HandleId::Left));

        let body = serde_json::to_value(SaveRequest {
            automation: &automation,
            user_email: "trader@example.com",
        })
        .unwrap();

        let mut keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["active", "edges", "id", "name", "nodes", "user_email"]);
        assert_eq!(body["active"], json!(false));
        assert_eq!(body["nodes"][1]["type"], json!("tracking"));
        assert_eq!(
            body["edges"][0],
            json!({
                "source": a.as_str(),
                "sourceHandle": "right",
                "target": b.as_str(),
                "targetHandle": "left"
            })
        );
    }

    #[test]
    fn toggle_and_delete_shapes() {
        assert_eq!(
            serde_json::to_value(ToggleRequest { id: "7", active: true }).unwrap(),
            json!({"id": "7", "active": true})
        );
        assert_eq!(
            serde_json::to_value(DeleteRequest { id: "7" }).unwrap(),
            json!({"id": "7"})
        );
    }
}
