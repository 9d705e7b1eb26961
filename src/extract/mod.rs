pub mod contact;
pub mod fields;

pub use contact::{build_contact_actions, extract_contact_line, parse_contact_target, strip_contacts};
pub use fields::{extract, format_price_aed, parse_amount};
