//! Explicit per-request session context
//!
//! Every pipeline run receives the visitor's context; every dashboard handler
//! receives a staff context issued by the password gate. Nothing about a
//! session lives in process-wide state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::ContextData;

/// Who the session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    /// Booth visitor generating a persona
    Visitor,
    /// Booth staff viewing analytics
    Staff,
}

/// Request/session context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session_id: Uuid,
    role: SessionRole,
    context_data: ContextData,
}

impl SessionContext {
    /// New visitor session with a fresh visit id
    pub fn visitor(context_data: ContextData) -> Self {
        Self::visitor_with_id(Uuid::new_v4(), context_data)
    }

    /// Visitor session continuing an existing visit id ("try again")
    pub fn visitor_with_id(session_id: Uuid, context_data: ContextData) -> Self {
        Self {
            session_id,
            role: SessionRole::Visitor,
            context_data,
        }
    }

    /// Staff session issued after the dashboard gate
    pub fn staff() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            role: SessionRole::Staff,
            context_data: ContextData::default(),
        }
    }

    /// Visit id recorded on events produced in this session
    pub fn visit_id(&self) -> Uuid {
        self.session_id
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn is_staff(&self) -> bool {
        self.role == SessionRole::Staff
    }

    /// Static venue/event tags attached to events from this session
    pub fn context_data(&self) -> &ContextData {
        &self.context_data
    }
}
