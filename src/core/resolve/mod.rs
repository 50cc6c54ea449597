pub mod assets;
pub mod game;
pub mod libraries;

pub use assets::AssetResolver;
pub use game::GameJarResolver;
pub use libraries::LibraryResolver;
