use crate::core::context::ActorContext;
use crate::core::error::CoreResult;
use crate::models::{NewWelfareReport, ReportStatus, WelfareReport};
use crate::services::store::{
    from_record, from_records, to_record, DataStore, Direction, Filter, StoreError, Table,
};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

/// Intake and listing of welfare incident reports
///
/// Reports always start as pending; moderation happens elsewhere.
#[derive(Clone)]
pub struct WelfareDesk {
    store: Arc<dyn DataStore>,
}

impl WelfareDesk {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn submit_report(&self, ctx: &ActorContext, report: NewWelfareReport) -> CoreResult<WelfareReport> {
        let actor = ctx.require_actor()?;
        report.validate()?;

        let mut row = to_record(&report)?;
        row.insert("reporter_id".to_string(), Value::String(actor.id.clone()));
        row.insert(
            "status".to_string(),
            serde_json::to_value(ReportStatus::Pending).map_err(StoreError::from)?,
        );

        let created: WelfareReport = from_record(self.store.insert(Table::WelfareReports, row).await?)?;
        tracing::info!("Welfare report {} ({:?}) filed by {}", created.id, created.incident_type, actor.id);
        Ok(created)
    }

    /// All reports, newest first
    pub async fn list_reports(&self) -> CoreResult<Vec<WelfareReport>> {
        let filter = Filter::new().order_by("created_at", Direction::Descending);
        Ok(from_records(self.store.select(Table::WelfareReports, &filter).await?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CoreError;
    use crate::models::IncidentType;
    use crate::services::MemoryStore;

    fn report(description: &str) -> NewWelfareReport {
        NewWelfareReport {
            incident_type: IncidentType::IllegalTransport,
            description: description.to_string(),
            image_url: Some("https://example.com/truck.jpg".to_string()),
            location_lat: Some(26.9124),
            location_lng: Some(75.7873),
        }
    }

    #[tokio::test]
    async fn test_submit_stamps_reporter_and_pending() {
        let desk = WelfareDesk::new(Arc::new(MemoryStore::new()));
        let ctx = ActorContext::for_actor("volunteer-7");

        let created = desk
            .submit_report(&ctx, report("Overloaded truck with twelve cattle on NH48"))
            .await
            .unwrap();

        assert_eq!(created.reporter_id, "volunteer-7");
        assert_eq!(created.status, ReportStatus::Pending);
        assert_eq!(desk.list_reports().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_validates_before_store() {
        let store = Arc::new(MemoryStore::new());
        let desk = WelfareDesk::new(store.clone());

        let result = desk
            .submit_report(&ActorContext::for_actor("volunteer-7"), report("short"))
            .await;

        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(store.row_count(Table::WelfareReports).await, 0);
    }

    #[tokio::test]
    async fn test_anonymous_cannot_submit() {
        let desk = WelfareDesk::new(Arc::new(MemoryStore::new()));
        let result = desk
            .submit_report(&ActorContext::anonymous(), report("Overloaded truck with twelve cattle on NH48"))
            .await;

        assert!(matches!(result, Err(CoreError::Unauthenticated)));
    }
}
