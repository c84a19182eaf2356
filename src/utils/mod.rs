pub mod hash;
pub mod html;
pub mod jwt;
pub mod mailer;
pub mod otp;
pub mod upload;
