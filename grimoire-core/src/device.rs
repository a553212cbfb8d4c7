//! Device identity generation.

use chrono::Utc;
use uuid::Uuid;

/// Generates a new opaque device identifier.
///
/// Format: `device_<8 hex chars>_<epoch ms>`. Generated once per
/// installation and persisted by the local store; never regenerated.
pub fn generate_device_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "device_{}_{}",
        &suffix[..8],
        Utc::now().timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_format() {
        let id = generate_device_id();
        assert!(id.starts_with("device_"));
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert!(parts[2].parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_device_ids_are_unique() {
        let a = generate_device_id();
        let b = generate_device_id();
        assert_ne!(a, b);
    }
}
