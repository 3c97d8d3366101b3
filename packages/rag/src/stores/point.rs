//! Chunk id → store point id.

use qdrant_client::PointId;
use uuid::Uuid;

/// Map a chunk id onto an id the store accepts.
///
/// Unsigned integers and UUIDs pass through. Anything else gets a UUIDv5
/// derived from the id, so re-upserting the same chunk overwrites it.
pub fn point_id(chunk_id: &str) -> PointId {
    if let Ok(n) = chunk_id.parse::<u64>() {
        return PointId::Num(n);
    }

    match Uuid::parse_str(chunk_id) {
        Ok(uuid) => PointId::Uuid(uuid.hyphenated().to_string()),
        Err(_) => PointId::Uuid(
            Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes())
                .hyphenated()
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_uuid_pass_through() {
        assert_eq!(point_id("42"), PointId::Num(42));

        let id = "5f0c8a52-3c1b-4e8e-9d43-0a3a4d2c9f11";
        assert_eq!(point_id(id), PointId::Uuid(id.to_string()));
    }

    #[test]
    fn test_other_ids_are_stable() {
        let a = point_id("triage-policy.pdf#p2-c1");
        let b = point_id("triage-policy.pdf#p2-c1");
        assert_eq!(a, b);
        assert_ne!(a, point_id("triage-policy.pdf#p2-c2"));
        assert!(matches!(a, PointId::Uuid(_)));
    }
}
