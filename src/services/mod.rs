pub mod password;
pub mod token;
pub mod upload;

pub use token::JwtConfig;
pub use upload::ImageStore;
