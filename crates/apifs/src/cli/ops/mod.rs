pub mod cat;
pub mod create;
pub mod ls;
#[cfg(feature = "fuse")]
pub mod mount;

pub use cat::Cat;
pub use create::Create;
pub use ls::Ls;
#[cfg(feature = "fuse")]
pub use mount::Mount;
