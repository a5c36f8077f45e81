pub mod de;
pub mod group;
pub mod id;
pub mod report;
