pub mod confirmation;
pub mod extract;
pub mod html;
pub mod jwt;
pub mod mail;
