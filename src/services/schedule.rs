use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use slog::Logger;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    commands::{
        schedule::{reorder_schedule_command::ScheduleReorder, ReorderScheduleCommand},
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{schedule_column, schedule_item},
};

pub const NO_SCHEDULED_TIME: &str = "No scheduled time";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ColumnIndicator {
    /// Work is running in this column right now
    Active,
    Alert,
    Idle,
}

/// Time still to spend on an item; missing values count as zero
pub fn remaining_ms(item: &schedule_item::Model) -> i64 {
    let duration = item.duration_ms.unwrap_or(0);
    let progress = item.progress_ms.unwrap_or(0);
    duration.saturating_sub(progress).max(0)
}

pub fn column_aggregate<'a, I>(items: I) -> i64
where
    I: IntoIterator<Item = &'a schedule_item::Model>,
{
    items
        .into_iter()
        .fold(0i64, |total, item| total.saturating_add(remaining_ms(item)))
}

pub fn indicator(active: bool, total_ms: i64) -> ColumnIndicator {
    if active {
        ColumnIndicator::Active
    } else if total_ms > 0 {
        ColumnIndicator::Alert
    } else {
        ColumnIndicator::Idle
    }
}

/// `2d 4h`, `1h 30m`, `45m` or `12s`, largest two units
pub fn format_duration(ms: i64) -> String {
    if ms <= 0 {
        return NO_SCHEDULED_TIME.to_string();
    }
    let seconds = ms / 1000;
    let units = [
        (seconds / 86_400, "d"),
        ((seconds % 86_400) / 3_600, "h"),
        ((seconds % 3_600) / 60, "m"),
        (seconds % 60, "s"),
    ];
    let parts: Vec<String> = units
        .iter()
        .skip_while(|(value, _)| *value == 0)
        .take(2)
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();
    if parts.is_empty() {
        // under a second of work left
        "<1s".to_string()
    } else {
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleColumnView {
    pub id: Uuid,
    pub title: String,
    pub active: bool,
    pub total_ms: i64,
    pub indicator: ColumnIndicator,
    pub label: String,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<schedule_item::Model>,
}

impl ScheduleColumnView {
    pub fn new(column: schedule_column::Model, items: Vec<schedule_item::Model>) -> Self {
        let total_ms = column_aggregate(&items);
        Self {
            id: column.id,
            title: column.title,
            active: column.active,
            total_ms,
            indicator: indicator(column.active, total_ms),
            label: format_duration(total_ms),
            items,
        }
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl ScheduleService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    #[instrument(skip(self))]
    pub async fn columns(&self, company_id: Uuid) -> Result<Vec<ScheduleColumnView>, ServiceError> {
        let db = self.db_pool.as_ref();
        let (columns, items) = tokio::try_join!(
            schedule_column::Entity::find()
                .filter(schedule_column::Column::CompanyId.eq(company_id))
                .order_by_asc(schedule_column::Column::SortOrder)
                .all(db),
            schedule_item::Entity::find()
                .filter(schedule_item::Column::CompanyId.eq(company_id))
                .order_by_asc(schedule_item::Column::Priority)
                .all(db),
        )?;

        let mut by_column: HashMap<Uuid, Vec<schedule_item::Model>> = HashMap::new();
        for item in items {
            by_column.entry(item.column_id).or_default().push(item);
        }
        Ok(columns
            .into_iter()
            .map(|column| {
                let items = by_column.remove(&column.id).unwrap_or_default();
                ScheduleColumnView::new(column, items)
            })
            .collect())
    }

    #[instrument(skip(self, reorder), fields(column_id = %reorder.column_id))]
    pub async fn reorder(
        &self,
        company_id: Uuid,
        reorder: ScheduleReorder,
    ) -> Result<usize, ServiceError> {
        let moved = ReorderScheduleCommand {
            company_id,
            reorder,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await?;
        slog::debug!(self.logger, "schedule reordered"; "company_id" => %company_id, "items" => moved);
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn item(duration: Option<i64>, progress: Option<i64>) -> schedule_item::Model {
        schedule_item::Model {
            id: Uuid::new_v4(),
            column_id: Uuid::nil(),
            company_id: Uuid::nil(),
            title: "op".into(),
            priority: 0,
            duration_ms: duration,
            progress_ms: progress,
        }
    }

    #[test]
    fn empty_column_is_idle_with_no_time() {
        let total = column_aggregate(&Vec::<schedule_item::Model>::new());
        assert_eq!(total, 0);
        assert_eq!(indicator(false, total), ColumnIndicator::Idle);
        assert_eq!(format_duration(total), NO_SCHEDULED_TIME);
    }

    #[test]
    fn overrun_items_do_not_reduce_total() {
        let items = vec![
            item(Some(3_600_000), Some(600_000)),
            item(Some(1_000), Some(5_000)),
            item(None, Some(1_000)),
            item(Some(1_800_000), None),
        ];
        assert_eq!(column_aggregate(&items), 3_000_000 + 1_800_000);
    }

    #[rstest]
    #[case(true, 0, ColumnIndicator::Active)]
    #[case(true, 10, ColumnIndicator::Active)]
    #[case(false, 10, ColumnIndicator::Alert)]
    #[case(false, 0, ColumnIndicator::Idle)]
    fn indicators(#[case] active: bool, #[case] total: i64, #[case] expected: ColumnIndicator) {
        assert_eq!(indicator(active, total), expected);
    }

    #[rstest]
    #[case(5_400_000, "1h 30m")]
    #[case(2_700_000, "45m")]
    #[case(7_200_000, "2h")]
    #[case(12_000, "12s")]
    #[case(187_200_000, "2d 4h")]
    #[case(500, "<1s")]
    fn durations(#[case] ms: i64, #[case] expected: &str) {
        assert_eq!(format_duration(ms), expected);
    }

    proptest! {
        #[test]
        fn aggregate_is_sum_of_clamped_remainders(
            pairs in prop::collection::vec((prop::option::of(0i64..10_000_000), prop::option::of(0i64..10_000_000)), 0..40)
        ) {
            let items: Vec<_> = pairs.iter().map(|(d, p)| item(*d, *p)).collect();
            let expected: i64 = pairs
                .iter()
                .map(|(d, p)| (d.unwrap_or(0) - p.unwrap_or(0)).max(0))
                .sum();
            prop_assert_eq!(column_aggregate(&items), expected);
            prop_assert!(column_aggregate(&items) >= 0);
        }
    }
}
