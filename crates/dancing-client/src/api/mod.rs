//! Typed wrappers over the REST endpoints

mod friend;
mod post;
mod user;
mod video;
mod video_call;

pub use friend::FriendApi;
pub use post::PostApi;
pub use user::UserApi;
pub use video::{VideoApi, VideoUpload};
pub use video_call::VideoCallApi;
