pub mod ddl;
pub mod meetings;
pub mod metadata;
