//! Data transfer objects exchanged with the hosting transport layer.

mod links;

pub use links::{
    CreateLinkRequest, LinkListResponse, LinkResponse, LinkStatsResponse, MAX_PAGE_SIZE,
    PageParams, RequestMeta,
};
