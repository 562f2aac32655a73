//! Request context carrying the acting tenant and user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dochub_core::types::{ExternalId, TenantId};

/// Context for the current request.
///
/// Every service method takes one, so each operation knows which tenant
/// partition it runs in and which CRM user is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The tenant whose data is being accessed.
    pub tenant_id: TenantId,
    /// The acting CRM user.
    pub user_id: ExternalId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(tenant_id: TenantId, user_id: ExternalId) -> Self {
        Self {
            tenant_id,
            user_id,
            request_time: Utc::now(),
        }
    }
}
