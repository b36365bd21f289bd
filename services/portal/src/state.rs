//! Application state shared across handlers

use crate::repositories::{
    ActivityLogRepository, AttendanceRepository, EnrollmentRepository, InquiryRepository,
    NewsletterRepository, UserRepository,
};
use crate::session::SessionManager;
use crate::throttle::Throttle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub throttle: Throttle,
    pub user_repository: UserRepository,
    pub inquiry_repository: InquiryRepository,
    pub enrollment_repository: EnrollmentRepository,
    pub attendance_repository: AttendanceRepository,
    pub activity_repository: ActivityLogRepository,
    pub newsletter_repository: NewsletterRepository,
}
