pub mod document;
pub mod evaluation;
pub mod mission_brief;
pub mod use_case;
