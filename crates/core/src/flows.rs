use serde::{Deserialize, Serialize};

/// A reusable conversational procedure that commands can reference by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Flow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The flows available to a generator, in definition order.
///
/// Deserializes from either `{ "flows": [...] }` or a bare array of flows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FlowsListRepr")]
pub struct FlowsList {
    flows: Vec<Flow>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlowsListRepr {
    Wrapped { flows: Vec<Flow> },
    Bare(Vec<Flow>),
}

impl From<FlowsListRepr> for FlowsList {
    fn from(repr: FlowsListRepr) -> Self {
        match repr {
            FlowsListRepr::Wrapped { flows } | FlowsListRepr::Bare(flows) => Self { flows },
        }
    }
}

impl FlowsList {
    pub fn new(flows: Vec<Flow>) -> Self {
        Self { flows }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flow> {
        self.flows.iter()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Finds a flow by its id.
    pub fn flow_by_id(&self, id: &str) -> Option<&Flow> {
        self.flows.iter().find(|flow| flow.id == id)
    }

    pub fn flow_ids(&self) -> Vec<&str> {
        self.flows.iter().map(|flow| flow.id.as_str()).collect()
    }
}

impl FromIterator<Flow> for FlowsList {
    fn from_iter<I: IntoIterator<Item = Flow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_by_id() {
        let flows: FlowsList = ["order_flow", "check_balance"]
            .into_iter()
            .map(Flow::new)
            .collect();

        assert_eq!(flows.len(), 2);
        assert_eq!(
            flows.flow_by_id("check_balance").map(|f| f.id.as_str()),
            Some("check_balance")
        );
        assert!(flows.flow_by_id("missing").is_none());
    }

    #[test]
    fn test_flow_ids_keep_definition_order() {
        let flows = FlowsList::new(vec![Flow::new("b"), Flow::new("a"), Flow::new("c")]);
        assert_eq!(flows.flow_ids(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_deserialize_wrapped_and_bare() {
        let wrapped: FlowsList = serde_json::from_str(
            r#"{"flows": [{"id": "order_flow", "description": "Place or change an order"}]}"#,
        )
        .unwrap();
        let bare: FlowsList = serde_json::from_str(
            r#"[{"id": "order_flow", "description": "Place or change an order"}]"#,
        )
        .unwrap();

        assert_eq!(wrapped, bare);
        assert_eq!(
            wrapped.flow_by_id("order_flow").unwrap().description.as_deref(),
            Some("Place or change an order")
        );
    }

    #[test]
    fn test_empty_list() {
        let flows = FlowsList::default();
        assert!(flows.is_empty());
        assert_eq!(flows.iter().count(), 0);
    }
}
