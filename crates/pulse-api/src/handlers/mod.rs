pub mod attachments;
pub mod health;
pub mod projects;
pub mod scanner;
