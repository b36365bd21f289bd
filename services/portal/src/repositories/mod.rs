//! Repositories for database operations

pub mod activity;
pub mod attendance;
pub mod enrollment;
pub mod inquiry;
pub mod newsletter;
pub mod user;

pub use activity::ActivityLogRepository;
pub use attendance::AttendanceRepository;
pub use enrollment::EnrollmentRepository;
pub use inquiry::InquiryRepository;
pub use newsletter::NewsletterRepository;
pub use user::UserRepository;
