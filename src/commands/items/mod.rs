pub mod update_item_cost_command;
pub mod update_item_posting_group_command;

pub use update_item_cost_command::{ItemCostForm, UpdateItemCostCommand};
pub use update_item_posting_group_command::{
    ItemPostingGroupForm, UpdateItemPostingGroupCommand,
};

use serde_json::Value;

/// Form-supplied custom fields replace the stored set only when present
pub(crate) fn merge_custom_fields(
    stored: Option<Value>,
    submitted: &Option<Value>,
) -> Option<Value> {
    match submitted {
        Some(fields) => Some(fields.clone()),
        None => stored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_custom_fields_keep_the_stored_ones() {
        let stored = Some(json!({ "grade": "A2" }));
        assert_eq!(merge_custom_fields(stored.clone(), &None), stored);
        assert_eq!(
            merge_custom_fields(stored, &Some(json!({ "grade": "A4" }))),
            Some(json!({ "grade": "A4" }))
        );
    }
}
