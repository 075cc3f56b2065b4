// Repository layer for database operations

pub mod book;
pub mod category;

pub use book::BookRepository;
pub use category::CategoryRepository;
