//! CrudService: staged CRUD over a document repository, plus request body checks.

mod crud;
mod validation;
pub use crud::CrudService;
pub use validation::RequestValidator;
