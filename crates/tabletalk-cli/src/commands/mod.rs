pub mod documents;
pub mod legacy;
pub mod projects;
pub mod status;
