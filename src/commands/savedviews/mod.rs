pub mod create_saved_view_command;
pub mod delete_saved_view_command;
pub mod reorder_saved_views_command;

pub use create_saved_view_command::{CreateSavedViewCommand, SavedViewForm};
pub use delete_saved_view_command::DeleteSavedViewCommand;
pub use reorder_saved_views_command::ReorderSavedViewsCommand;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{errors::ServiceError, models::saved_view};

/// Views of one navigation group, in display order
pub async fn list_group<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    company_id: Uuid,
    group_key: &str,
) -> Result<Vec<saved_view::Model>, DbErr> {
    saved_view::Entity::find()
        .filter(saved_view::Column::UserId.eq(user_id))
        .filter(saved_view::Column::CompanyId.eq(company_id))
        .filter(saved_view::Column::GroupKey.eq(group_key))
        .order_by_asc(saved_view::Column::SortOrder)
        .order_by_asc(saved_view::Column::CreatedAt)
        .all(db)
        .await
}

/// The submitted order must name every view of the group exactly once
pub fn check_permutation(current: &[saved_view::Model], view_ids: &[Uuid]) -> Result<(), ServiceError> {
    let submitted: HashSet<&Uuid> = view_ids.iter().collect();
    if submitted.len() != view_ids.len() {
        return Err(ServiceError::ValidationError(
            "A saved view can only appear once".to_string(),
        ));
    }
    if current.len() != view_ids.len() {
        return Err(ServiceError::ValidationError(format!(
            "Expected {} views, got {}",
            current.len(),
            view_ids.len()
        )));
    }
    if let Some(unknown) = view_ids
        .iter()
        .find(|id| !current.iter().any(|view| view.id == **id))
    {
        return Err(ServiceError::ValidationError(format!(
            "Saved view {} is not in this group",
            unknown
        )));
    }
    Ok(())
}

/// Next free position at the end of a group
pub fn next_position(current: &[saved_view::Model]) -> i32 {
    current
        .iter()
        .map(|view| view.sort_order)
        .max()
        .map_or(0, |last| last + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn view(sort_order: i32) -> saved_view::Model {
        saved_view::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            company_id: Uuid::nil(),
            group_key: "employee".into(),
            name: format!("View {}", sort_order),
            path: "/x/people".into(),
            sort_order,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn appends_after_the_highest_position() {
        assert_eq!(next_position(&[]), 0);
        assert_eq!(next_position(&[view(1), view(2)]), 3);
    }

    #[test]
    fn permutation_rules() {
        let current = vec![view(0), view(1)];
        let ids: Vec<Uuid> = current.iter().map(|v| v.id).collect();
        assert!(check_permutation(&current, &[ids[1], ids[0]]).is_ok());
        assert!(check_permutation(&current, &[ids[0], ids[0]]).is_err());
        assert!(check_permutation(&current, &[ids[0]]).is_err());
        assert!(check_permutation(&current, &[ids[0], Uuid::new_v4()]).is_err());
    }
}
