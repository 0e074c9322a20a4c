//! Web app locations handlers redirect to.

use uuid::Uuid;

pub const PURCHASE_ORDERS: &str = "/x/purchasing/orders";
pub const SUPPLIERS: &str = "/x/purchasing/suppliers";

pub fn purchase_order(id: Uuid) -> String {
    format!("/x/purchase-order/{}", id)
}

pub fn supplier(id: Uuid) -> String {
    format!("/x/supplier/{}", id)
}

pub const ITEMS: &str = "/x/items";
pub const ITEM_POSTING_GROUPS: &str = "/x/items/groups";

/// List of posting groups, keeping the caller's filters and paging
pub fn item_posting_groups(query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{}?{}", ITEM_POSTING_GROUPS, q),
        None => ITEM_POSTING_GROUPS.to_string(),
    }
}

pub fn consumable(id: Uuid) -> String {
    format!("/x/consumable/{}", id)
}

pub fn consumable_costing(id: Uuid) -> String {
    format!("/x/consumable/{}/costing", id)
}

pub fn quote_line(quote_id: Uuid, line_id: Uuid) -> String {
    format!("/x/quote/{}/{}", quote_id, line_id)
}

pub fn sales_rfq(id: Uuid) -> String {
    format!("/x/sales-rfq/{}", id)
}

pub fn sales_rfq_line(rfq_id: Uuid, line_id: Uuid) -> String {
    format!("/x/sales-rfq/{}/{}", rfq_id, line_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posting_group_list_keeps_the_query() {
        assert_eq!(item_posting_groups(None), "/x/items/groups");
        assert_eq!(item_posting_groups(Some("")), "/x/items/groups");
        assert_eq!(
            item_posting_groups(Some("page=2&search=steel")),
            "/x/items/groups?page=2&search=steel"
        );
    }
}
