pub mod deps;
pub mod event_hub;
pub mod openai_generator;
pub mod test_dependencies;
pub mod traits;
pub mod wordpress_publisher;

pub use deps::EngineDeps;
pub use event_hub::EventHub;
pub use openai_generator::OpenAiGenerator;
pub use traits::{
    BaseContentGenerator, BasePublisher, PageDraft, ParentPage, PostDraft, UploadedMedia,
};
pub use wordpress_publisher::WordPressPublisher;
