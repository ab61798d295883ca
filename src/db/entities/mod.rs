//! SeaORM entities for the chat tables. Publications are read through raw
//! statements only (the listing and analytics queries do not map onto a
//! single entity shape), so no entity is defined for them.

pub mod chat_message;
pub mod chat_session;
