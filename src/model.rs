pub mod document_model;
pub mod flat_model;
pub mod google_api_model;
pub mod parsed_model;
pub mod school_model;
