pub mod asset_service;
pub mod cloudinary_service;
pub mod cookie_service;
pub mod media_service;
pub mod session_service;
pub mod token_service;
pub mod user_service;
