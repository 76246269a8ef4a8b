//! Text/image decision for the next post

use crate::types::{PostMode, PostType};

/// Content form of the next post for a page
///
/// In alternate mode a page that has never posted starts with text.
pub fn next_post_type(mode: PostMode, last: Option<PostType>) -> PostType {
    match mode {
        PostMode::Text => PostType::Text,
        PostMode::Image => PostType::Image,
        PostMode::Alternate => match last {
            Some(PostType::Text) => PostType::Image,
            Some(PostType::Image) | None => PostType::Text,
        },
    }
}
