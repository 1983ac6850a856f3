use uuid::Uuid;

/// Generates a unique submission attempt ID
pub fn generate_attempt_id() -> String {
    format!("flow_{}", Uuid::new_v4())
}
