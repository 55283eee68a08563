pub mod api;
pub mod platform_traits;
pub mod repository_traits;

pub use api::TwitchApi;
pub use platform_traits::ChatSink;
pub use repository_traits::CommandRepository;
