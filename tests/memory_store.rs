#[cfg(test)]
mod tests {
    use emma::memory::{Memory, SimpleMemory};
    use serde_json::json;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> SimpleMemory {
        SimpleMemory::open(dir.path().join("memory.json"))
    }

    #[test]
    fn search_respects_the_limit() {
        let dir = TempDir::new().unwrap();
        let mut memory = open(&dir);
        memory.add("cat1", json!("whiskers")).unwrap();
        memory.add("cat2", json!("tom")).unwrap();
        memory.add("dog", json!("rex")).unwrap();

        let found = memory.search("cat", 2);
        let keys: Vec<&str> = found.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["cat1", "cat2"]);
        assert_eq!(memory.search("cat", 1).len(), 1);
    }

    #[test]
    fn search_is_case_insensitive_over_keys_and_string_values() {
        let dir = TempDir::new().unwrap();
        let mut memory = open(&dir);
        memory.add("Pet", json!("a black cat")).unwrap();
        memory.add("age", json!(7)).unwrap();
        memory.add("colour", json!("Blue")).unwrap();

        assert_eq!(memory.search("pet", 5)[0].key, "Pet");
        assert_eq!(memory.search("CAT", 5)[0].key, "Pet");
        assert_eq!(memory.search("blue", 5)[0].key, "colour");
        assert!(memory.search("7", 5).is_empty());
    }

    #[test]
    fn snapshot_reload_keeps_values_and_order() {
        let dir = TempDir::new().unwrap();
        let mut memory = open(&dir);
        memory.add("zeta", json!("last letter")).unwrap();
        memory.add("alpha", json!({"nested": true})).unwrap();

        let reopened = open(&dir);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("alpha"), Some(&json!({"nested": true})));
        let keys: Vec<String> = reopened.search("", 10).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn clear_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut memory = open(&dir);
        memory.add("k", json!("v")).unwrap();
        memory.clear().unwrap();

        assert!(memory.get("k").is_none());
        assert!(open(&dir).is_empty());
    }

    #[test]
    fn unreadable_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("memory.json"), "not json").unwrap();

        let memory = open(&dir);
        assert!(memory.is_empty());
    }

    #[test]
    fn offset_less_timestamps_survive_a_rewrite() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("memory.json"),
            r#"{"pet":{"value":"cat","timestamp":"2024-05-01T10:00:00.123456"},"odd":{"value":"kept","timestamp":"not a date"}}"#,
        )
        .unwrap();

        let mut memory = open(&dir);
        assert_eq!(memory.len(), 2);
        assert_eq!(
            memory.entry("pet").unwrap().timestamp.to_rfc3339(),
            "2024-05-01T10:00:00.123456+00:00"
        );
        memory.add("other", json!("value")).unwrap();

        let reopened = open(&dir);
        assert_eq!(reopened.get("pet"), Some(&json!("cat")));
        assert_eq!(reopened.get("odd"), Some(&json!("kept")));
        assert_eq!(reopened.len(), 3);
    }
}
