use uuid::Uuid;

pub fn create_object_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Identifier for a tool call the vendor returned without one.
pub fn synthesize_call_id() -> String {
    create_object_id("call")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_object_id_format() {
        let id = create_object_id("test");
        assert!(id.starts_with("test_"), "ID should start with 'test_'");
        let expected_length = "test_".len() + 32;
        assert_eq!(
            id.len(),
            expected_length,
            "ID length should be {} (prefix + '_' + 32 char UUID)",
            expected_length
        );
    }

    #[test]
    fn test_synthesized_call_ids_are_unique() {
        let ids: std::collections::HashSet<String> = (0..64).map(|_| synthesize_call_id()).collect();
        assert_eq!(ids.len(), 64);
        assert!(ids.iter().all(|id| id.starts_with("call_")));
    }
}
