//! Identity and assignment types.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifier of a GMA node (a ministry/team the user reports for).
pub type NodeId = u64;

// ============================================================================
// User Identity
// ============================================================================

/// The logged-in user as reported by the backend's "current user" service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Backend user id (`renId`).
    pub user_id: u64,
    /// Preferred display name.
    pub display_name: String,
    /// Global user identifier, when the backend supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

// ============================================================================
// Role
// ============================================================================

/// Role under which a user is assigned to a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular staff member.
    #[default]
    Staff,
    /// Node director.
    Director,
}

impl Role {
    /// Returns the path segment and payload key used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Director => "director",
        }
    }

    /// Returns all roles.
    pub fn all() -> &'static [Role] {
        &[Role::Staff, Role::Director]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "staff" => Ok(Self::Staff),
            "director" => Ok(Self::Director),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

// ============================================================================
// Assignments
// ============================================================================

/// A node the user is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentNode {
    /// Node id.
    pub id: NodeId,
    /// Short display name of the node.
    pub display_name: String,
    /// Role the user holds for this node.
    pub role: Role,
}

/// The set of nodes returned by one assignment fetch.
///
/// Keeps the nodes in server order and builds both lookup directions
/// (id → name and name → id). An empty set is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignments {
    nodes: Vec<AssignmentNode>,
    #[serde(skip)]
    by_id: BTreeMap<NodeId, String>,
    #[serde(skip)]
    by_name: HashMap<String, NodeId>,
}

impl Assignments {
    /// Builds the assignment set and its lookup tables.
    ///
    /// When the backend repeats an id or a name, the later entry wins in the
    /// lookup tables.
    pub fn new(nodes: Vec<AssignmentNode>) -> Self {
        let mut by_id = BTreeMap::new();
        let mut by_name = HashMap::new();
        for node in &nodes {
            by_id.insert(node.id, node.display_name.clone());
            by_name.insert(node.display_name.clone(), node.id);
        }
        Self {
            nodes,
            by_id,
            by_name,
        }
    }

    /// Returns the nodes in server order.
    pub fn nodes(&self) -> &[AssignmentNode] {
        &self.nodes
    }

    /// Returns true if the user has no assignments for the role.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up a node name by id.
    pub fn name_for(&self, id: NodeId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Looks up a node id by its display name.
    pub fn id_for(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// The id → name mapping.
    pub fn by_id(&self) -> &BTreeMap<NodeId, String> {
        &self.by_id
    }

    /// The name → id mapping.
    pub fn by_name(&self) -> &HashMap<String, NodeId> {
        &self.by_name
    }

    /// Resolves a user-supplied node reference, either a numeric id or a name.
    pub fn resolve(&self, reference: &str) -> Option<NodeId> {
        if let Some(id) = self.id_for(reference) {
            return Some(id);
        }
        reference
            .trim()
            .parse::<NodeId>()
            .ok()
            .filter(|id| self.by_id.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: NodeId, name: &str) -> AssignmentNode {
        AssignmentNode {
            id,
            display_name: name.to_string(),
            role: Role::Staff,
        }
    }

    #[test]
    fn test_inverse_mappings() {
        let assignments = Assignments::new(vec![node(101, "Assign1"), node(120, "Assign2")]);

        assert_eq!(assignments.name_for(101), Some("Assign1"));
        assert_eq!(assignments.id_for("Assign2"), Some(120));
        assert_eq!(assignments.name_for(999), None);
        assert_eq!(assignments.len(), 2);
    }

    #[test]
    fn test_empty_is_valid() {
        let assignments = Assignments::new(Vec::new());
        assert!(assignments.is_empty());
        assert!(assignments.by_id().is_empty());
    }

    #[test]
    fn test_resolve_by_name_or_id() {
        let assignments = Assignments::new(vec![node(7, "Campus Team")]);

        assert_eq!(assignments.resolve("Campus Team"), Some(7));
        assert_eq!(assignments.resolve("7"), Some(7));
        assert_eq!(assignments.resolve("8"), None);
        assert_eq!(assignments.resolve("Nobody"), None);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!("Director".parse::<Role>().unwrap(), Role::Director);
        assert!("boss".parse::<Role>().is_err());
        assert_eq!(Role::Director.to_string(), "director");
    }
}
