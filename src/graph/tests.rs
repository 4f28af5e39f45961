//! Serialization tests with import-document fixtures

use serde_json::{json, Value};

/// Node as it appears in an exported knowledge document
fn document_node_fixture() -> Value {
    json!({
        "id": "cpp_hello_world",
        "name": "Hello World program",
        "node_type": "concept",
        "description": "The first program most people write in C++",
        "category": "basics",
        "language": "cpp",
        "difficulty_level": "beginner",
        "properties": {
            "examples": ["#include <iostream>"],
            "learning_time": 15
        }
    })
}

/// Relationship as it appears in an exported knowledge document
fn document_relationship_fixture() -> Value {
    json!({
        "id": "rel:hello-to-iostream",
        "source_id": "cpp_hello_world",
        "target_id": "cpp_iostream",
        "relationship_type": "depends_on",
        "description": "Printing needs the stream library"
    })
}

#[cfg(test)]
mod serialization_tests {
    use super::*;
    use crate::graph::{
        DifficultyLevel, Node, NodeId, NodeType, PropertyValue, Relationship, RelationshipType,
    };

    #[test]
    fn node_id_serializes_as_string() {
        let id = NodeId::from_string("lang:cpp");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"lang:cpp\"");
    }

    #[test]
    fn node_type_serializes_lowercase() {
        let json = serde_json::to_string(&NodeType::Technology).unwrap();
        assert_eq!(json, "\"technology\"");

        let t: NodeType = serde_json::from_str("\"library\"").unwrap();
        assert_eq!(t, NodeType::Library);
    }

    #[test]
    fn unknown_node_type_fails_to_deserialize() {
        let mut fixture = document_node_fixture();
        fixture["node_type"] = json!("gadget");
        assert!(serde_json::from_value::<Node>(fixture).is_err());
    }

    #[test]
    fn unknown_difficulty_fails_to_deserialize() {
        let mut fixture = document_node_fixture();
        fixture["difficulty_level"] = json!("trivial");
        assert!(serde_json::from_value::<Node>(fixture).is_err());
    }

    #[test]
    fn relationship_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&RelationshipType::BuildsUpon).unwrap();
        assert_eq!(json, "\"builds_upon\"");

        let custom: RelationshipType = serde_json::from_str("\"inspired_by\"").unwrap();
        assert_eq!(custom, RelationshipType::Other("inspired_by".into()));
    }

    #[test]
    fn empty_relationship_type_fails_to_deserialize() {
        let mut fixture = document_relationship_fixture();
        fixture["relationship_type"] = json!("");
        assert!(serde_json::from_value::<Relationship>(fixture).is_err());
    }

    #[test]
    fn can_deserialize_document_node_fixture() {
        let result: Result<Node, _> = serde_json::from_value(document_node_fixture());
        assert!(result.is_ok(), "Failed to deserialize node fixture: {:?}", result.err());

        let node = result.unwrap();
        assert_eq!(node.id.as_str(), "cpp_hello_world");
        assert_eq!(node.node_type, NodeType::Concept);
        assert_eq!(node.difficulty_level, Some(DifficultyLevel::Beginner));
        assert_eq!(node.language.as_deref(), Some("cpp"));
        assert_eq!(
            node.properties.get("learning_time"),
            Some(&PropertyValue::Int(15))
        );
        assert!(node.tags.is_empty());
    }

    #[test]
    fn can_deserialize_document_relationship_fixture() {
        let result: Result<Relationship, _> =
            serde_json::from_value(document_relationship_fixture());
        assert!(result.is_ok(), "Failed to deserialize relationship fixture: {:?}", result.err());

        let rel = result.unwrap();
        assert_eq!(rel.source_id.as_str(), "cpp_hello_world");
        assert_eq!(rel.target_id.as_str(), "cpp_iostream");
        assert_eq!(rel.relationship_type, RelationshipType::DependsOn);
        assert_eq!(rel.weight, 1.0, "weight defaults to 1 when omitted");
    }

    #[test]
    fn node_roundtrip() {
        let node = Node::new("smart_pointer", "Smart pointer", NodeType::Concept)
            .with_language("cpp")
            .with_difficulty(DifficultyLevel::Advanced)
            .with_tag("memory")
            .with_property("header", "<memory>");

        let json = serde_json::to_string(&node).unwrap();
        let node2: Node = serde_json::from_str(&json).unwrap();

        assert_eq!(node, node2);
    }

    #[test]
    fn serialized_node_omits_unset_optionals() {
        let node = Node::new("git", "Git", NodeType::Tool);
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["node_type"], "tool");
        assert!(json.get("language").is_none());
        assert!(json.get("difficulty_level").is_none());
        assert!(json.get("tags").is_none());
        assert!(json["properties"].is_object());
        assert!(json["metadata"]["created_at"].is_string());
    }
}
