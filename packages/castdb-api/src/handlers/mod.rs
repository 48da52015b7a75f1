//! HTTP endpoint implementations for the character table.

mod character_handlers;
mod query_handlers;
mod request_utils;
mod response;

pub use character_handlers::{
    create_character, delete_character, get_character, home, update_character,
};
pub use query_handlers::{list_characters, search_characters};
pub use response::{error_response, success_response};
