//! Typed rejections for anticipated business-rule violations.
//!
//! Every expected failure is a variant the boundary layer can map to a 4xx
//! response; only unexpected store failures travel through the `Db` variants
//! and surface as 500s.

use sea_orm::DbErr;
use thiserror::Error;

use crate::models::attendance;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Site not found")]
    SiteNotFound,

    /// Carries the existing row so the boundary can return it for client context.
    #[error("You have already punched in today")]
    AlreadyPunchedIn(attendance::Model),

    #[error("No punch in record found for today. Please punch in first.")]
    NoPunchInFound,

    #[error("You have already punched out today")]
    AlreadyPunchedOut(attendance::Model),

    #[error("Start date must be before or equal to end date")]
    InvalidDateRange,

    #[error(transparent)]
    Db(#[from] DbErr),
}

#[derive(Debug, Error)]
pub enum AnnouncementError {
    #[error("Invalid priority. Must be low, medium, or high")]
    InvalidPriority,

    #[error("Announcement not found")]
    NotFound,

    #[error("You are not authorized to deactivate this announcement")]
    NotAuthorized,

    #[error(transparent)]
    Db(#[from] DbErr),
}

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Site code already exists")]
    DuplicateCode,

    #[error("Site not found")]
    NotFound,

    #[error(transparent)]
    Db(#[from] DbErr),
}

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("User is already assigned to this site")]
    AlreadyAssigned,

    #[error("User is not assigned to this site")]
    NotAssigned,

    #[error(transparent)]
    Db(#[from] DbErr),
}
