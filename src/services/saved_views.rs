use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    commands::{
        savedviews::{
            check_permutation, list_group, CreateSavedViewCommand, DeleteSavedViewCommand,
            ReorderSavedViewsCommand, SavedViewForm,
        },
        Command,
    },
    db::DbPool,
    debounce::{PendingWrites, WriteSink},
    errors::ServiceError,
    events::EventSender,
    models::saved_view,
};

pub const DELETE_NOT_CONFIRMED: &str = "Deletion must be confirmed";

pub fn delete_prompt(name: &str) -> String {
    format!("Are you sure you want to delete the view \"{}\"?", name)
}

/// One user's views within one navigation group
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewGroup {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub group_key: String,
}

impl ViewGroup {
    pub fn for_user(user: &AuthUser, group_key: impl Into<String>) -> Self {
        Self {
            user_id: user.user_id,
            company_id: user.company_id,
            group_key: group_key.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SavedViewPosition {
    pub id: Uuid,
    pub sort_order: i32,
}

/// Fresh zero-based positions in the submitted order
pub fn assign_positions(view_ids: &[Uuid]) -> Vec<SavedViewPosition> {
    view_ids
        .iter()
        .enumerate()
        .map(|(index, id)| SavedViewPosition {
            id: *id,
            sort_order: index as i32,
        })
        .collect()
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct DeletePrompt {
    pub id: Uuid,
    pub name: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct NavigationRoute {
    pub name: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub views: Vec<saved_view::Model>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct NavigationGroup {
    pub name: String,
    pub routes: Vec<NavigationRoute>,
}

struct RouteSpec {
    name: &'static str,
    to: &'static str,
    table: Option<&'static str>,
}

const PEOPLE_NAVIGATION: &[(&str, &[RouteSpec])] = &[
    (
        "Manage",
        &[RouteSpec {
            name: "People",
            to: "/x/people",
            table: Some("employee"),
        }],
    ),
    (
        "Configure",
        &[
            RouteSpec {
                name: "Departments",
                to: "/x/people/departments",
                table: None,
            },
            RouteSpec {
                name: "Holidays",
                to: "/x/people/holidays",
                table: None,
            },
            RouteSpec {
                name: "Shifts",
                to: "/x/people/shifts",
                table: None,
            },
        ],
    ),
];

struct ReorderSink {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

#[async_trait]
impl WriteSink<ViewGroup, Vec<Uuid>> for ReorderSink {
    async fn write(&self, group: ViewGroup, view_ids: Vec<Uuid>) -> Result<(), ServiceError> {
        let count = view_ids.len();
        ReorderSavedViewsCommand {
            user_id: group.user_id,
            company_id: group.company_id,
            group_key: group.group_key.clone(),
            view_ids,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await?;
        slog::info!(self.logger, "saved view order written";
            "user_id" => %group.user_id, "group" => &group.group_key, "views" => count);
        Ok(())
    }
}

#[derive(Clone)]
pub struct SavedViewService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    pending: PendingWrites<ViewGroup, Vec<Uuid>>,
    logger: Logger,
}

impl SavedViewService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        quiet_period: Duration,
        logger: Logger,
    ) -> Self {
        let sink = Arc::new(ReorderSink {
            db_pool: db_pool.clone(),
            event_sender: event_sender.clone(),
            logger: logger.clone(),
        });
        Self {
            db_pool,
            event_sender,
            pending: PendingWrites::new("saved_views", quiet_period, sink),
            logger,
        }
    }

    pub fn pending(&self) -> &PendingWrites<ViewGroup, Vec<Uuid>> {
        &self.pending
    }

    #[instrument(skip(self, user))]
    pub async fn list(
        &self,
        user: &AuthUser,
        group_key: &str,
    ) -> Result<Vec<saved_view::Model>, ServiceError> {
        Ok(list_group(self.db_pool.as_ref(), user.user_id, user.company_id, group_key).await?)
    }

    #[instrument(skip(self, user, form))]
    pub async fn create(
        &self,
        user: &AuthUser,
        form: SavedViewForm,
    ) -> Result<saved_view::Model, ServiceError> {
        // a pending reorder would not know about the new view
        self.flush(user, &form.group_key).await?;
        CreateSavedViewCommand {
            user_id: user.user_id,
            company_id: user.company_id,
            form,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    /// Answers with the new positions at once and writes them after the quiet period.
    /// The list is checked against the stored group before anything is queued.
    #[instrument(skip(self, user, view_ids), fields(views = view_ids.len()))]
    pub async fn reorder(
        &self,
        user: &AuthUser,
        group_key: &str,
        view_ids: Vec<Uuid>,
    ) -> Result<Vec<SavedViewPosition>, ServiceError> {
        let current =
            list_group(self.db_pool.as_ref(), user.user_id, user.company_id, group_key).await?;
        check_permutation(&current, &view_ids)?;
        let positions = assign_positions(&view_ids);
        self.pending
            .push(ViewGroup::for_user(user, group_key), view_ids);
        Ok(positions)
    }

    pub async fn flush(&self, user: &AuthUser, group_key: &str) -> Result<bool, ServiceError> {
        self.pending
            .flush(&ViewGroup::for_user(user, group_key))
            .await
    }

    async fn find_own(&self, user: &AuthUser, id: Uuid) -> Result<saved_view::Model, ServiceError> {
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
        saved_view::Entity::find_by_id(id)
            .filter(saved_view::Column::UserId.eq(user.user_id))
            .filter(saved_view::Column::CompanyId.eq(user.company_id))
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found("saved view", id))
    }

    pub async fn delete_prompt(
        &self,
        user: &AuthUser,
        id: Uuid,
    ) -> Result<DeletePrompt, ServiceError> {
        let view = self.find_own(user, id).await?;
        Ok(DeletePrompt {
            id: view.id,
            message: delete_prompt(&view.name),
            name: view.name,
        })
    }

    #[instrument(skip(self, user))]
    pub async fn delete(
        &self,
        user: &AuthUser,
        id: Uuid,
        confirm: bool,
    ) -> Result<saved_view::Model, ServiceError> {
        if !confirm {
            return Err(ServiceError::ValidationError(
                DELETE_NOT_CONFIRMED.to_string(),
            ));
        }
        let view = self.find_own(user, id).await?;
        self.flush(user, &view.group_key).await?;
        let deleted = DeleteSavedViewCommand {
            id: view.id,
            user_id: user.user_id,
            company_id: user.company_id,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await?;
        slog::info!(self.logger, "saved view deleted"; "id" => %deleted.id, "name" => &deleted.name);
        Ok(deleted)
    }

    /// People module navigation with the caller's saved views attached
    pub async fn people_navigation(
        &self,
        user: &AuthUser,
    ) -> Result<Vec<NavigationGroup>, ServiceError> {
        let mut groups = Vec::with_capacity(PEOPLE_NAVIGATION.len());
        for &(name, routes) in PEOPLE_NAVIGATION {
            let mut resolved = Vec::with_capacity(routes.len());
            for route in routes {
                let views = match route.table {
                    Some(table) => self.list(user, table).await?,
                    None => Vec::new(),
                };
                resolved.push(NavigationRoute {
                    name: route.name.to_string(),
                    to: route.to.to_string(),
                    table: route.table.map(str::to_string),
                    views,
                });
            }
            groups.push(NavigationGroup {
                name: name.to_string(),
                routes: resolved,
            });
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn prompt_quotes_view_name() {
        assert_eq!(
            delete_prompt("Night shift"),
            "Are you sure you want to delete the view \"Night shift\"?"
        );
    }

    #[test]
    fn navigation_layout() {
        let names: Vec<(&str, Vec<&str>)> = PEOPLE_NAVIGATION
            .iter()
            .map(|(group, routes)| (*group, routes.iter().map(|r| r.name).collect()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Manage", vec!["People"]),
                ("Configure", vec!["Departments", "Holidays", "Shifts"]),
            ]
        );
    }

    proptest! {
        #[test]
        fn positions_are_contiguous_from_zero(count in 0usize..30) {
            let ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
            let positions = assign_positions(&ids);
            prop_assert_eq!(positions.len(), count);
            for (index, position) in positions.iter().enumerate() {
                prop_assert_eq!(position.sort_order, index as i32);
                prop_assert_eq!(position.id, ids[index]);
            }
        }
    }
}
