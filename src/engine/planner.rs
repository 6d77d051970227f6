//! Planner - turns a classified document into typed resources

use serde_json::Value;

use crate::error::ApplyError;
use crate::resource::{
    BoxedResource, Bucket, Connection, Document, MonitoringConfig, ResourceKind, SettingsObject,
    Slo, Workflow,
};

/// Build the resources a document declares
///
/// Validation that needs no network happens here, so a malformed document
/// fails before the first request.
pub fn plan(kind: ResourceKind, document: &Value) -> Result<Vec<BoxedResource>, ApplyError> {
    let resources: Vec<BoxedResource> = match kind {
        ResourceKind::Workflow => vec![Box::new(Workflow::from_document(document))],
        ResourceKind::Dashboard | ResourceKind::Notebook => {
            vec![Box::new(Document::from_document(document, kind))]
        }
        ResourceKind::Slo => vec![Box::new(Slo::from_document(document))],
        ResourceKind::Bucket => vec![Box::new(Bucket::from_document(document)?)],
        ResourceKind::SettingsObject => vec![Box::new(SettingsObject::from_document(document)?)],
        ResourceKind::AzureConnection | ResourceKind::GcpConnection => {
            if document.is_array() {
                Connection::from_list(document, kind)?
                    .into_iter()
                    .map(|c| Box::new(c) as BoxedResource)
                    .collect()
            } else {
                vec![Box::new(Connection::from_document(document, kind)?)]
            }
        }
        ResourceKind::AzureMonitoringConfig | ResourceKind::GcpMonitoringConfig => {
            vec![Box::new(MonitoringConfig::from_document(document, kind)?)]
        }
        ResourceKind::Unknown => {
            return Err(ApplyError::Unclassifiable {
                document: document.clone(),
            });
        }
    };

    log::debug!("Planned {} {} resource(s)", resources.len(), kind);
    Ok(resources)
}
