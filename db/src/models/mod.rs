pub mod announcement;
pub mod attendance;
pub mod site;
pub mod site_user_assignment;
pub mod user;

pub use announcement::Entity as Announcement;
pub use attendance::Entity as Attendance;
pub use site::Entity as Site;
pub use site_user_assignment::Entity as SiteUserAssignment;
pub use user::Entity as User;
