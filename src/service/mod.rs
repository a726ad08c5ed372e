//! Domain services consumed by the portal UI.

pub mod auth;
pub mod document;
pub mod notification;
pub mod report;
pub mod validate;

pub use auth::{AuthService, AuthSession, LoginCredentials, SignupRequest};
pub use document::{
    presigned_covers_content_type, CreateDocument, DocumentRecord, DocumentService, UploadTarget,
};
pub use notification::{Notification, NotificationService};
pub use report::{
    DlrSummaryRow, PromotionalRow, ReportRange, ReportService, TransactionalRow,
};
