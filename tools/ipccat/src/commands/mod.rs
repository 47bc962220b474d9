pub mod cat;
pub mod schema;
